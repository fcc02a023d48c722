//! Projectiles: arena storage, advancement, and the anti-tunneling sweep
//!
//! Fast bullets move many radii per tick, so each tick's motion is swept
//! as a segment split into sub-segments no longer than twice the bullet
//! radius. That bounds the farthest a bullet can travel between tests to
//! less than the thinnest wall it could skip, which is the no-tunneling
//! guarantee the whole system leans on.

use uuid::Uuid;

use crate::config::WeaponTuning;
use crate::game::combat::WeaponStats;
use crate::geom::{circles_overlap, segment_rect_hit, Aabb, HitAxis};

/// A live projectile.
///
/// `slot` is the arena index (stable for the bullet's lifetime); `id` is
/// the wire identity shared with other clients.
#[derive(Debug, Clone)]
pub struct Bullet {
    pub slot: u32,
    pub id: Uuid,
    pub owner: Uuid,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub damage: f32,
    pub lifetime_remaining: f32,
    /// Ignores obstacles entirely
    pub ghost: bool,
    pub bounce_remaining: u32,
    pub pierce_remaining: u32,
    pub homing_strength: f32,
    pub explode_radius: f32,
    pub gravity_resistance: f32,
    /// Replicated from another client: drawn but never collided, so the
    /// origin client stays the only reporter of its hits
    pub remote: bool,
    /// Targets already pierced by this bullet; a pierced body is never
    /// hit twice
    hit_targets: Vec<Uuid>,
}

impl Bullet {
    /// Build a bullet from a shot fired at `angle` with the shooter's
    /// augment-derived stats
    pub fn from_shot(
        owner: Uuid,
        x: f32,
        y: f32,
        angle: f32,
        speed: f32,
        stats: &WeaponStats,
        remote: bool,
    ) -> Self {
        Self {
            slot: 0,
            id: Uuid::new_v4(),
            owner,
            x,
            y,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            radius: stats.bullet_radius,
            damage: stats.bullet_damage,
            lifetime_remaining: stats.bullet_lifetime,
            ghost: false,
            bounce_remaining: stats.bounce_count,
            pierce_remaining: stats.pierce_count,
            homing_strength: stats.homing_strength,
            explode_radius: stats.explode_radius,
            gravity_resistance: stats.gravity_resistance,
            remote,
            hit_targets: Vec::new(),
        }
    }
}

/// Slot-addressed bullet storage.
///
/// Slots stay valid for a bullet's whole lifetime; removals free the slot
/// for reuse only after the sweep that produced them has finished, so
/// nothing dangles mid-iteration.
#[derive(Debug, Default)]
pub struct BulletArena {
    slots: Vec<Option<Bullet>>,
    free: Vec<u32>,
}

impl BulletArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, mut bullet: Bullet) -> u32 {
        match self.free.pop() {
            Some(slot) => {
                bullet.slot = slot;
                self.slots[slot as usize] = Some(bullet);
                slot
            }
            None => {
                let slot = self.slots.len() as u32;
                bullet.slot = slot;
                self.slots.push(Some(bullet));
                slot
            }
        }
    }

    pub fn get(&self, slot: u32) -> Option<&Bullet> {
        self.slots.get(slot as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, slot: u32) -> Option<&mut Bullet> {
        self.slots.get_mut(slot as usize).and_then(|s| s.as_mut())
    }

    pub fn remove(&mut self, slot: u32) -> Option<Bullet> {
        let taken = self.slots.get_mut(slot as usize).and_then(|s| s.take());
        if taken.is_some() {
            self.free.push(slot);
        }
        taken
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bullet> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Drop every bullet owned by a departed player
    pub fn remove_owned_by(&mut self, owner: Uuid) {
        let slots: Vec<u32> = self
            .iter()
            .filter(|b| b.owner == owner)
            .map(|b| b.slot)
            .collect();
        for slot in slots {
            self.remove(slot);
        }
    }
}

/// A player hit circle offered to the sweep
#[derive(Debug, Clone, Copy)]
pub struct HitCircle {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// What became of a bullet this tick
#[derive(Debug, Clone)]
pub enum BulletResolution {
    /// Hit level geometry and was destroyed
    ObstacleImpact {
        bullet_id: Uuid,
        x: f32,
        y: f32,
        explode_radius: f32,
    },
    /// Ricocheted off geometry and kept flying
    Bounced { bullet_id: Uuid, x: f32, y: f32 },
    /// Struck a player; `destroyed` is false when a pierce charge was spent
    PlayerHit {
        bullet_id: Uuid,
        owner: Uuid,
        target: Uuid,
        x: f32,
        y: f32,
        damage: f32,
        destroyed: bool,
    },
    /// Lifetime ran out
    Expired { bullet_id: Uuid, x: f32, y: f32 },
}

/// Per-tick projectile advancement and collision sweeping
#[derive(Debug, Clone, Copy)]
pub struct ProjectileSystem {
    bullet_gravity: f32,
    bounce_damping: f32,
    homing_range: f32,
}

impl ProjectileSystem {
    pub fn new(tuning: &WeaponTuning) -> Self {
        Self {
            bullet_gravity: tuning.bullet_gravity,
            bounce_damping: tuning.bounce_damping,
            homing_range: tuning.homing_range,
        }
    }

    /// Advance every bullet and sweep its path.
    ///
    /// `targets` are the hit circles of the *other* participants; the
    /// owner of each bullet is excluded automatically. Remote bullets
    /// advance visually but skip every collision test.
    pub fn advance(
        &self,
        arena: &mut BulletArena,
        obstacles: &[Aabb],
        targets: &[HitCircle],
        dt: f32,
    ) -> Vec<BulletResolution> {
        let mut resolutions = Vec::new();
        let mut destroyed: Vec<u32> = Vec::new();

        let live: Vec<u32> = arena.iter().map(|b| b.slot).collect();
        for slot in live {
            let Some(bullet) = arena.get_mut(slot) else {
                continue;
            };

            bullet.lifetime_remaining -= dt;
            if bullet.lifetime_remaining <= 0.0 {
                resolutions.push(BulletResolution::Expired {
                    bullet_id: bullet.id,
                    x: bullet.x,
                    y: bullet.y,
                });
                destroyed.push(slot);
                continue;
            }

            if !bullet.remote {
                steer_homing(bullet, targets, self.homing_range, dt);
            }

            // Gravity with augment resistance
            bullet.vy += self.bullet_gravity * (1.0 - bullet.gravity_resistance) * dt;

            let x0 = bullet.x;
            let y0 = bullet.y;
            let x1 = x0 + bullet.vx * dt;
            let y1 = y0 + bullet.vy * dt;

            if bullet.remote {
                bullet.x = x1;
                bullet.y = y1;
                continue;
            }

            if self.sweep(bullet, x0, y0, x1, y1, obstacles, targets, &mut resolutions) {
                destroyed.push(slot);
            }
        }

        for slot in destroyed {
            arena.remove(slot);
        }
        resolutions
    }

    /// Sweep one bullet's motion; returns true when the bullet died.
    #[allow(clippy::too_many_arguments)]
    fn sweep(
        &self,
        bullet: &mut Bullet,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        obstacles: &[Aabb],
        targets: &[HitCircle],
        resolutions: &mut Vec<BulletResolution>,
    ) -> bool {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let dist = (dx * dx + dy * dy).sqrt();

        // Sub-segment cap: never step farther than one bullet diameter
        let max_step = (bullet.radius * 2.0).max(1.0);
        let steps = (dist / max_step).ceil().max(1.0) as u32;

        let mut sx = x0;
        let mut sy = y0;

        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            let ex = x0 + dx * t;
            let ey = y0 + dy * t;

            // Geometry first: find the earliest crossing in this sub-segment
            if !bullet.ghost {
                let mut best: Option<(f32, HitAxis)> = None;
                for raw in obstacles {
                    let obs = Aabb::sanitized(raw.x, raw.y, raw.w, raw.h);
                    if obs.w <= 0.0 || obs.h <= 0.0 {
                        continue;
                    }
                    let expanded = obs.expanded(bullet.radius);
                    if let Some(hit) = segment_rect_hit(sx, sy, ex, ey, &expanded) {
                        if best.map_or(true, |(bt, _)| hit.t < bt) {
                            best = Some((hit.t, hit.axis));
                        }
                    }
                }

                if let Some((ht, axis)) = best {
                    // Back off a hair from the contact so the bullet never
                    // rests exactly on the expanded boundary
                    let ht = (ht - 1e-3).max(0.0);
                    let hx = sx + (ex - sx) * ht;
                    let hy = sy + (ey - sy) * ht;
                    bullet.x = hx;
                    bullet.y = hy;

                    if bullet.bounce_remaining > 0 {
                        bullet.bounce_remaining -= 1;
                        match axis {
                            HitAxis::Horizontal => bullet.vx = -bullet.vx * self.bounce_damping,
                            HitAxis::Vertical => bullet.vy = -bullet.vy * self.bounce_damping,
                        }
                        resolutions.push(BulletResolution::Bounced {
                            bullet_id: bullet.id,
                            x: hx,
                            y: hy,
                        });
                        return false;
                    }

                    resolutions.push(BulletResolution::ObstacleImpact {
                        bullet_id: bullet.id,
                        x: hx,
                        y: hy,
                        explode_radius: bullet.explode_radius,
                    });
                    self.splash(bullet, hx, hy, None, targets, resolutions);
                    return true;
                }
            }

            // Player hits: circle-circle at the sub-segment endpoint
            for target in targets {
                if target.id == bullet.owner || bullet.hit_targets.contains(&target.id) {
                    continue;
                }
                if !circles_overlap(ex, ey, bullet.radius, target.x, target.y, target.radius) {
                    continue;
                }

                let destroyed = bullet.pierce_remaining == 0;
                resolutions.push(BulletResolution::PlayerHit {
                    bullet_id: bullet.id,
                    owner: bullet.owner,
                    target: target.id,
                    x: ex,
                    y: ey,
                    damage: bullet.damage,
                    destroyed,
                });

                if destroyed {
                    bullet.x = ex;
                    bullet.y = ey;
                    self.splash(bullet, ex, ey, Some(target.id), targets, resolutions);
                    return true;
                }
                bullet.pierce_remaining -= 1;
                bullet.hit_targets.push(target.id);
            }

            sx = ex;
            sy = ey;
        }

        bullet.x = x1;
        bullet.y = y1;
        false
    }

    /// Explosion splash against every other target in radius
    fn splash(
        &self,
        bullet: &Bullet,
        x: f32,
        y: f32,
        direct_target: Option<Uuid>,
        targets: &[HitCircle],
        resolutions: &mut Vec<BulletResolution>,
    ) {
        if bullet.explode_radius <= 0.0 {
            return;
        }
        for target in targets {
            if target.id == bullet.owner || Some(target.id) == direct_target {
                continue;
            }
            if circles_overlap(x, y, bullet.explode_radius, target.x, target.y, target.radius) {
                resolutions.push(BulletResolution::PlayerHit {
                    bullet_id: bullet.id,
                    owner: bullet.owner,
                    target: target.id,
                    x: target.x,
                    y: target.y,
                    damage: bullet.damage,
                    destroyed: true,
                });
            }
        }
    }
}

/// Steer a homing bullet toward the nearest target in range, preserving
/// speed
fn steer_homing(bullet: &mut Bullet, targets: &[HitCircle], range: f32, dt: f32) {
    if bullet.homing_strength <= 0.0 {
        return;
    }

    let mut nearest: Option<(f32, f32, f32)> = None;
    for target in targets {
        if target.id == bullet.owner {
            continue;
        }
        let dx = target.x - bullet.x;
        let dy = target.y - bullet.y;
        let d2 = dx * dx + dy * dy;
        if d2 > range * range {
            continue;
        }
        if nearest.map_or(true, |(nd2, _, _)| d2 < nd2) {
            nearest = Some((d2, dx, dy));
        }
    }

    let Some((_, dx, dy)) = nearest else {
        return;
    };

    let speed = (bullet.vx * bullet.vx + bullet.vy * bullet.vy).sqrt();
    if speed <= f32::EPSILON {
        return;
    }

    let current = bullet.vy.atan2(bullet.vx);
    let desired = dy.atan2(dx);
    let mut delta = desired - current;
    while delta > std::f32::consts::PI {
        delta -= std::f32::consts::TAU;
    }
    while delta < -std::f32::consts::PI {
        delta += std::f32::consts::TAU;
    }

    let max_turn = bullet.homing_strength * dt;
    let turned = current + delta.clamp(-max_turn, max_turn);
    bullet.vx = turned.cos() * speed;
    bullet.vy = turned.sin() * speed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{AugmentAggregate, AugmentKind};

    fn stats_with(kinds: &[AugmentKind]) -> WeaponStats {
        WeaponStats::derive(
            &WeaponTuning::default(),
            &AugmentAggregate::from_kinds(kinds),
        )
    }

    fn system() -> ProjectileSystem {
        ProjectileSystem::new(&WeaponTuning {
            bullet_gravity: 0.0,
            ..WeaponTuning::default()
        })
    }

    fn owner() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn fast_bullet_never_tunnels_through_thin_wall() {
        // 2000 px/s at 60 Hz is ~33 px per tick against a 10 px wall;
        // radius 6 caps sub-segments at 12 px
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        let mut bullet = Bullet::from_shot(owner(), 0.0, 50.0, 0.0, 2000.0, &stats, false);
        assert_eq!(bullet.radius, 6.0);
        bullet.lifetime_remaining = 10.0;
        arena.spawn(bullet);

        let wall = [Aabb::new(100.0, 0.0, 10.0, 200.0)];
        let mut hit = false;
        for _ in 0..20 {
            for res in sys.advance(&mut arena, &wall, &[], 1.0 / 60.0) {
                if matches!(res, BulletResolution::ObstacleImpact { .. }) {
                    hit = true;
                }
            }
        }
        assert!(hit);
        assert!(arena.is_empty());
    }

    #[test]
    fn bullet_spawned_inside_geometry_escapes() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        // Spawned with its expanded footprint overlapping the wall edge,
        // flying away from it
        let mut bullet = Bullet::from_shot(owner(), 98.0, 50.0, std::f32::consts::PI, 600.0, &stats, false);
        bullet.lifetime_remaining = 10.0;
        let slot = arena.spawn(bullet);

        let wall = [Aabb::new(100.0, 0.0, 10.0, 200.0)];
        let res = sys.advance(&mut arena, &wall, &[], 1.0 / 60.0);
        assert!(res.is_empty());
        assert!(arena.get(slot).is_some());
    }

    #[test]
    fn bounce_reflects_and_decrements_until_spent() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[AugmentKind::Ricochet]);
        let mut bullet = Bullet::from_shot(owner(), 50.0, 50.0, 0.0, 1200.0, &stats, false);
        bullet.lifetime_remaining = 10.0;
        let slot = arena.spawn(bullet);

        let wall = [Aabb::new(100.0, 0.0, 20.0, 200.0)];
        let mut bounces = 0;
        let mut impacts = 0;
        let mut last_count = arena.get(slot).unwrap().bounce_remaining;
        for _ in 0..60 {
            for res in sys.advance(&mut arena, &wall, &[], 1.0 / 60.0) {
                match res {
                    BulletResolution::Bounced { .. } => {
                        bounces += 1;
                        let b = arena.get(slot).unwrap();
                        // Counter is monotonically non-increasing
                        assert!(b.bounce_remaining < last_count);
                        last_count = b.bounce_remaining;
                        // Reflected away from the wall with damping
                        assert!(b.vx < 0.0);
                    }
                    BulletResolution::ObstacleImpact { .. } => impacts += 1,
                    _ => {}
                }
            }
            if arena.is_empty() {
                break;
            }
            // Turn the bullet back toward the wall after the ricochet so
            // it must impact once the bounce budget is spent
            if let Some(b) = arena.get_mut(slot) {
                if b.vx < 0.0 && b.x < 60.0 {
                    b.vx = -b.vx;
                }
            }
        }
        assert_eq!(bounces, 1);
        assert_eq!(impacts, 1);
        assert!(arena.is_empty());
    }

    #[test]
    fn pierce_passes_through_then_destroys() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[AugmentKind::PiercingRounds]);
        let shooter = owner();
        let mut bullet = Bullet::from_shot(shooter, 0.0, 50.0, 0.0, 600.0, &stats, false);
        bullet.lifetime_remaining = 10.0;
        arena.spawn(bullet);

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let targets = [
            HitCircle {
                id: first,
                x: 40.0,
                y: 50.0,
                radius: 25.0,
            },
            HitCircle {
                id: second,
                x: 160.0,
                y: 50.0,
                radius: 25.0,
            },
        ];

        let mut hits = Vec::new();
        for _ in 0..40 {
            for res in sys.advance(&mut arena, &[], &targets, 1.0 / 60.0) {
                if let BulletResolution::PlayerHit {
                    target, destroyed, ..
                } = res
                {
                    hits.push((target, destroyed));
                }
            }
            if arena.is_empty() {
                break;
            }
        }

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], (first, false));
        assert_eq!(hits[1], (second, true));
        assert!(arena.is_empty());
    }

    #[test]
    fn ghost_ignores_walls_but_hits_players() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        let mut bullet = Bullet::from_shot(owner(), 0.0, 50.0, 0.0, 900.0, &stats, false);
        bullet.ghost = true;
        bullet.lifetime_remaining = 10.0;
        arena.spawn(bullet);

        let wall = [Aabb::new(60.0, 0.0, 20.0, 200.0)];
        let victim = Uuid::new_v4();
        let targets = [HitCircle {
            id: victim,
            x: 200.0,
            y: 50.0,
            radius: 25.0,
        }];

        let mut hit_player = false;
        for _ in 0..40 {
            for res in sys.advance(&mut arena, &wall, &targets, 1.0 / 60.0) {
                match res {
                    BulletResolution::ObstacleImpact { .. } | BulletResolution::Bounced { .. } => {
                        panic!("ghost bullets never interact with geometry")
                    }
                    BulletResolution::PlayerHit { target, .. } => {
                        assert_eq!(target, victim);
                        hit_player = true;
                    }
                    _ => {}
                }
            }
            if arena.is_empty() {
                break;
            }
        }
        assert!(hit_player);
    }

    #[test]
    fn remote_bullets_advance_without_colliding() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        let mut bullet = Bullet::from_shot(owner(), 0.0, 50.0, 0.0, 600.0, &stats, true);
        bullet.lifetime_remaining = 10.0;
        let slot = arena.spawn(bullet);

        let wall = [Aabb::new(5.0, 0.0, 20.0, 200.0)];
        let targets = [HitCircle {
            id: Uuid::new_v4(),
            x: 10.0,
            y: 50.0,
            radius: 25.0,
        }];

        let res = sys.advance(&mut arena, &wall, &targets, 1.0 / 60.0);
        assert!(res.is_empty());
        let b = arena.get(slot).unwrap();
        assert!(b.x > 0.0);
    }

    #[test]
    fn owner_is_never_hit_by_own_bullet() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        let shooter = owner();
        let mut bullet = Bullet::from_shot(shooter, 0.0, 50.0, 0.0, 600.0, &stats, false);
        bullet.lifetime_remaining = 0.2;
        arena.spawn(bullet);

        let targets = [HitCircle {
            id: shooter,
            x: 5.0,
            y: 50.0,
            radius: 25.0,
        }];

        let mut player_hits = 0;
        for _ in 0..30 {
            for res in sys.advance(&mut arena, &[], &targets, 1.0 / 60.0) {
                if matches!(res, BulletResolution::PlayerHit { .. }) {
                    player_hits += 1;
                }
            }
        }
        assert_eq!(player_hits, 0);
    }

    #[test]
    fn lifetime_expiry_destroys() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        let mut bullet = Bullet::from_shot(owner(), 0.0, 50.0, 0.0, 600.0, &stats, false);
        bullet.lifetime_remaining = 0.05;
        arena.spawn(bullet);

        let mut expired = false;
        for _ in 0..10 {
            for res in sys.advance(&mut arena, &[], &[], 1.0 / 60.0) {
                if matches!(res, BulletResolution::Expired { .. }) {
                    expired = true;
                }
            }
        }
        assert!(expired);
        assert!(arena.is_empty());
    }

    #[test]
    fn explosive_rounds_splash_nearby_targets() {
        let sys = system();
        let mut arena = BulletArena::new();
        let stats = stats_with(&[AugmentKind::ExplosiveTip]);
        let mut bullet = Bullet::from_shot(owner(), 0.0, 50.0, 0.0, 900.0, &stats, false);
        bullet.lifetime_remaining = 10.0;
        arena.spawn(bullet);

        let wall = [Aabb::new(100.0, 0.0, 20.0, 200.0)];
        let bystander = Uuid::new_v4();
        let targets = [HitCircle {
            id: bystander,
            x: 80.0,
            y: 70.0,
            radius: 25.0,
        }];

        let mut splashed = false;
        for _ in 0..30 {
            for res in sys.advance(&mut arena, &wall, &targets, 1.0 / 60.0) {
                if let BulletResolution::PlayerHit { target, .. } = res {
                    assert_eq!(target, bystander);
                    splashed = true;
                }
            }
            if arena.is_empty() {
                break;
            }
        }
        assert!(splashed);
    }

    #[test]
    fn arena_slots_are_reused_after_removal() {
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        let a = arena.spawn(Bullet::from_shot(owner(), 0.0, 0.0, 0.0, 1.0, &stats, false));
        let b = arena.spawn(Bullet::from_shot(owner(), 0.0, 0.0, 0.0, 1.0, &stats, false));
        assert_ne!(a, b);
        arena.remove(a);
        assert_eq!(arena.len(), 1);
        let c = arena.spawn(Bullet::from_shot(owner(), 0.0, 0.0, 0.0, 1.0, &stats, false));
        assert_eq!(c, a);
        assert_eq!(arena.get(c).unwrap().slot, c);
    }

    #[test]
    fn disconnect_removes_owned_bullets() {
        let mut arena = BulletArena::new();
        let stats = stats_with(&[]);
        let leaver = owner();
        let stayer = owner();
        arena.spawn(Bullet::from_shot(leaver, 0.0, 0.0, 0.0, 1.0, &stats, true));
        arena.spawn(Bullet::from_shot(leaver, 0.0, 0.0, 0.0, 1.0, &stats, true));
        arena.spawn(Bullet::from_shot(stayer, 0.0, 0.0, 0.0, 1.0, &stats, false));
        arena.remove_owned_by(leaver);
        assert_eq!(arena.len(), 1);
        assert!(arena.iter().all(|b| b.owner == stayer));
    }
}
