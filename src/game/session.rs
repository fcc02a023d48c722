//! Per-frame orchestration of the whole core
//!
//! One [`GameSession`] owns the local controller, the projectile arena,
//! the augment set, and the synchronizer, and advances them in a fixed
//! order each frame: drain inbound -> controller -> fire control -> CCD
//! -> hit reporting -> throttled outbound. Inbound events are applied
//! only here, never mid-tick, so every pass sees a consistent snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::augment::{AugmentAggregate, AugmentKind};
use crate::config::CoreConfig;
use crate::game::combat::{lifesteal_heal, Weapon};
use crate::game::controller::{CharacterController, ControlInput, MovementEvent};
use crate::game::level::ObstacleSource;
use crate::game::player::PlayerSnapshot;
use crate::game::projectile::{Bullet, BulletArena, BulletResolution, HitCircle, ProjectileSystem};
use crate::net::protocol::{BulletHit, ParticleData, ParticleKind};
use crate::net::sync::{NetSynchronizer, RemoteDirectory, SyncEffect};
use crate::util::time::{clamp_frame_delta, unix_millis};

/// Everything a frame produced for the renderer/UI collaborators
#[derive(Debug)]
pub struct FrameOutput {
    pub snapshot: PlayerSnapshot,
    pub events: Vec<SessionEvent>,
}

/// Frame events surfaced to out-of-scope consumers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Movement(MovementEvent),
    /// The local player fired
    Fired {
        bullet_id: Uuid,
        x: f32,
        y: f32,
        angle: f32,
    },
    /// A remote player's shot was replicated
    RemoteFired { shooter: Uuid, bullet_id: Uuid },
    /// A local bullet resolved against the world or a player
    BulletResolved(BulletResolution),
    /// Another client reported a hit
    RemoteHit { hit: BulletHit },
    /// A replicated cosmetic burst
    Particle(ParticleData),
    /// Authoritative round transition applied
    RoundStarted { round: u32 },
    /// Authoritative health applied to the local player
    HealthChanged { health: i32 },
}

/// The simulation core for one connected participant
pub struct GameSession {
    config: CoreConfig,
    local_id: Uuid,
    controller: CharacterController,
    weapon: Weapon,
    augments: Vec<AugmentKind>,
    aggregate: AugmentAggregate,
    bullets: BulletArena,
    projectiles: ProjectileSystem,
    level: Arc<dyn ObstacleSource>,
    sync: NetSynchronizer,
    rng: ChaCha8Rng,
    tick: u64,
}

impl GameSession {
    pub fn new(
        config: CoreConfig,
        local_id: Uuid,
        spawn_x: f32,
        spawn_y: f32,
        level: Arc<dyn ObstacleSource>,
        sync: NetSynchronizer,
        seed: u64,
    ) -> Self {
        let aggregate = AugmentAggregate::default();
        Self {
            controller: CharacterController::new(
                local_id,
                spawn_x,
                spawn_y,
                config.movement,
                config.wall,
                config.player,
            ),
            weapon: Weapon::new(&config.weapon, &aggregate),
            augments: Vec::new(),
            aggregate,
            bullets: BulletArena::new(),
            projectiles: ProjectileSystem::new(&config.weapon),
            level,
            sync,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            config,
            local_id,
        }
    }

    pub fn local_id(&self) -> Uuid {
        self.local_id
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Read handle for the renderer's remote-player pass
    pub fn remotes(&self) -> Arc<RwLock<RemoteDirectory>> {
        self.sync.remotes()
    }

    /// Read access to live bullets for the renderer
    pub fn bullets(&self) -> &BulletArena {
        &self.bullets
    }

    /// The active augment set
    pub fn augments(&self) -> &[AugmentKind] {
        &self.augments
    }

    /// Replace the active augment set (round selection). Re-derives every
    /// affected constant and announces the set to peers.
    pub fn set_augments(&mut self, kinds: Vec<AugmentKind>) {
        info!(count = kinds.len(), "augment set changed");
        self.aggregate = AugmentAggregate::from_kinds(&kinds);
        self.weapon.refresh_stats(&self.config.weapon, &self.aggregate);
        self.sync.send_augments(&kinds);
        self.augments = kinds;
    }

    /// Swap the obstacle source on a map change. Live bullets refer to
    /// the old geometry and are dropped.
    pub fn set_level(&mut self, level: Arc<dyn ObstacleSource>) {
        self.level = level;
        self.bullets = BulletArena::new();
    }

    /// Announce departure to the room
    pub fn leave(&self) {
        self.sync.leave();
    }

    /// Advance the whole core by one frame
    pub fn tick(&mut self, input: &ControlInput, dt: f32) -> FrameOutput {
        let dt = clamp_frame_delta(dt);
        self.tick += 1;
        let mut events = Vec::new();

        // Inbound network state, applied strictly between simulation ticks
        for effect in self.sync.drain_inbound() {
            self.apply_effect(effect, &mut events);
        }

        // Local simulation
        let mut movement_events = Vec::new();
        self.controller.tick(
            input,
            &self.aggregate,
            self.level.as_ref(),
            dt,
            &mut movement_events,
        );
        events.extend(movement_events.into_iter().map(SessionEvent::Movement));

        // Fire control
        self.weapon.tick(dt);
        if input.fire {
            self.try_fire(&mut events);
        }

        // Projectile sweep against remote hit circles
        let targets = self.remote_hit_circles();
        let resolutions =
            self.projectiles
                .advance(&mut self.bullets, self.level.obstacles(), &targets, dt);
        for resolution in resolutions {
            self.report_resolution(&resolution);
            events.push(SessionEvent::BulletResolved(resolution));
        }

        // Outbound sync: throttled movement, deadbanded pose
        let snapshot = self.controller.snapshot();
        self.sync.send_movement(&snapshot);
        self.sync
            .send_pose(self.controller.aim_angle(), snapshot.facing);

        FrameOutput { snapshot, events }
    }

    fn try_fire(&mut self, events: &mut Vec<SessionEvent>) {
        let aim = self.controller.aim_angle();
        let Some(shot) = self.weapon.try_fire(aim, &mut self.rng) else {
            return;
        };

        let state = self.controller.state();
        let mx = state.x + shot.angle.cos() * self.config.weapon.muzzle_offset;
        let my = state.y + shot.angle.sin() * self.config.weapon.muzzle_offset;

        let bullet = Bullet::from_shot(
            self.local_id,
            mx,
            my,
            shot.angle,
            shot.speed,
            self.weapon.stats(),
            false,
        );
        let bullet_id = bullet.id;
        self.bullets.spawn(bullet);

        self.sync.send_shoot(mx, my, shot.angle);
        self.sync.send_particle(ParticleData {
            kind: ParticleKind::MuzzleFlash,
            x: mx,
            y: my,
            angle: shot.angle,
        });
        events.push(SessionEvent::Fired {
            bullet_id,
            x: mx,
            y: my,
            angle: shot.angle,
        });
    }

    fn remote_hit_circles(&self) -> Vec<HitCircle> {
        let radius = self.config.movement.half_height;
        self.sync
            .remotes()
            .read()
            .iter()
            .map(|r| HitCircle {
                id: r.id,
                x: r.x,
                y: r.y,
                radius,
            })
            .collect()
    }

    /// Report a local bullet's resolution to the room and apply local
    /// side effects (lifesteal, impact particles)
    fn report_resolution(&mut self, resolution: &BulletResolution) {
        match resolution {
            BulletResolution::PlayerHit {
                bullet_id,
                target,
                x,
                y,
                damage,
                ..
            } => {
                self.sync.send_bullet_hit(BulletHit {
                    bullet_id: *bullet_id,
                    target_player_id: *target,
                    x: *x,
                    y: *y,
                    damage: *damage,
                    timestamp: unix_millis(),
                });
                let heal = lifesteal_heal(*damage, self.aggregate.player.lifesteal);
                if heal > 0 {
                    self.controller.predict_heal(heal);
                }
            }
            BulletResolution::ObstacleImpact {
                x,
                y,
                explode_radius,
                ..
            } => {
                let kind = if *explode_radius > 0.0 {
                    ParticleKind::Explosion
                } else {
                    ParticleKind::Impact
                };
                self.sync.send_particle(ParticleData {
                    kind,
                    x: *x,
                    y: *y,
                    angle: 0.0,
                });
            }
            BulletResolution::Bounced { .. } | BulletResolution::Expired { .. } => {}
        }
    }

    fn apply_effect(&mut self, effect: SyncEffect, events: &mut Vec<SessionEvent>) {
        match effect {
            SyncEffect::RemoteShot {
                shooter,
                x,
                y,
                angle,
                stats,
            } => {
                let bullet =
                    Bullet::from_shot(shooter, x, y, angle, stats.bullet_speed, &stats, true);
                let bullet_id = bullet.id;
                self.bullets.spawn(bullet);
                events.push(SessionEvent::RemoteFired { shooter, bullet_id });
            }
            SyncEffect::LocalHealth { health } => {
                self.controller.set_authoritative_health(health);
                events.push(SessionEvent::HealthChanged { health });
            }
            SyncEffect::RoundReset {
                round,
                spawn_x,
                spawn_y,
            } => {
                debug!(round, "applying round reset");
                self.controller.respawn(spawn_x, spawn_y, &self.aggregate);
                self.bullets = BulletArena::new();
                self.weapon = Weapon::new(&self.config.weapon, &self.aggregate);
                events.push(SessionEvent::RoundStarted { round });
            }
            SyncEffect::RemoteLeft { id } => {
                self.bullets.remove_owned_by(id);
            }
            SyncEffect::IncomingHit { hit } => {
                if hit.target_player_id == self.local_id {
                    // Visual prediction only; the server's health update
                    // follows and overwrites
                    self.controller.predict_damage(hit.damage as i32);
                }
                events.push(SessionEvent::RemoteHit { hit });
            }
            SyncEffect::Particle { particle } => {
                events.push(SessionEvent::Particle(particle));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetTuning;
    use crate::game::level::{LevelBounds, StaticLevel};
    use crate::geom::Aabb;
    use crate::net::protocol::{ClientEvent, Inbound, LinkEvent, ServerEvent};
    use crate::net::sync::Transport;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    const DT: f32 = 1.0 / 60.0;

    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<ClientEvent>>,
    }

    impl Transport for MockTransport {
        fn send(&self, event: ClientEvent) {
            self.sent.lock().push(event);
        }
    }

    impl MockTransport {
        fn count<F: Fn(&ClientEvent) -> bool>(&self, f: F) -> usize {
            self.sent.lock().iter().filter(|e| f(e)).count()
        }
    }

    fn flat_level() -> Arc<StaticLevel> {
        Arc::new(StaticLevel::new(
            vec![Aabb::new(0.0, 520.0, 1920.0, 40.0)],
            LevelBounds {
                min_x: 0.0,
                max_x: 1920.0,
            },
        ))
    }

    fn online_session() -> (GameSession, Arc<MockTransport>, mpsc::Sender<Inbound>) {
        let transport = Arc::new(MockTransport::default());
        let config = CoreConfig::default();
        let local_id = Uuid::new_v4();
        let (sync, tx) = NetSynchronizer::new(
            transport.clone(),
            "room-1".into(),
            local_id,
            NetTuning::default(),
            config.weapon,
        );
        let mut session = GameSession::new(
            config,
            local_id,
            400.0,
            400.0,
            flat_level(),
            sync,
            42,
        );
        tx.try_send(Inbound::Link(LinkEvent::Open)).unwrap();
        tx.try_send(Inbound::Link(LinkEvent::JoinAcked)).unwrap();
        session.tick(&ControlInput::default(), DT);
        (session, transport, tx)
    }

    fn settle(session: &mut GameSession, ticks: usize) {
        for _ in 0..ticks {
            session.tick(&ControlInput::default(), DT);
        }
    }

    #[test]
    fn session_lands_player_on_the_floor() {
        let (mut session, _transport, _tx) = online_session();
        settle(&mut session, 120);
        let out = session.tick(&ControlInput::default(), DT);
        assert!(out.snapshot.grounded);
        assert!((out.snapshot.y - 495.0).abs() < 1e-3);
    }

    #[test]
    fn firing_spawns_a_bullet_and_broadcasts() {
        let (mut session, transport, _tx) = online_session();
        settle(&mut session, 120);

        let out = session.tick(
            &ControlInput {
                fire: true,
                ..ControlInput::default()
            },
            DT,
        );
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::Fired { .. })));
        assert_eq!(session.bullets().len(), 1);
        assert_eq!(
            transport.count(|e| matches!(e, ClientEvent::InputShoot { .. })),
            1
        );
        assert_eq!(
            transport.count(|e| matches!(
                e,
                ClientEvent::ParticleCreate {
                    particle: ParticleData {
                        kind: ParticleKind::MuzzleFlash,
                        ..
                    },
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn local_bullet_hits_remote_shadow_and_reports() {
        let (mut session, transport, tx) = online_session();
        settle(&mut session, 120);

        let remote_id = Uuid::new_v4();
        tx.try_send(Inbound::Event(ServerEvent::Move {
            id: remote_id,
            x: 600.0,
            y: 495.0,
            vx: 0.0,
            vy: 0.0,
            facing: crate::game::player::Facing::Left,
        }))
        .unwrap();

        session.tick(
            &ControlInput {
                fire: true,
                ..ControlInput::default()
            },
            DT,
        );

        let mut hit = false;
        for _ in 0..120 {
            let out = session.tick(&ControlInput::default(), DT);
            if out.events.iter().any(|e| {
                matches!(
                    e,
                    SessionEvent::BulletResolved(BulletResolution::PlayerHit { target, .. })
                        if *target == remote_id
                )
            }) {
                hit = true;
                break;
            }
        }
        assert!(hit, "bullet should strike the remote shadow");
        assert_eq!(
            transport.count(|e| matches!(e, ClientEvent::BulletHit { .. })),
            1
        );
    }

    #[test]
    fn remote_shot_is_visual_only() {
        let (mut session, transport, tx) = online_session();
        settle(&mut session, 120);

        let remote_id = Uuid::new_v4();
        // Remote fires straight at the local player from close range
        tx.try_send(Inbound::Event(ServerEvent::Shoot {
            id: remote_id,
            x: 300.0,
            y: 495.0,
            angle: 0.0,
        }))
        .unwrap();

        let out = session.tick(&ControlInput::default(), DT);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::RemoteFired { shooter, .. } if *shooter == remote_id)));
        assert_eq!(session.bullets().len(), 1);

        // The replicated bullet crosses the local player without ever
        // resolving a hit; the origin client owns that report
        let before = transport.count(|e| matches!(e, ClientEvent::BulletHit { .. }));
        settle(&mut session, 60);
        let after = transport.count(|e| matches!(e, ClientEvent::BulletHit { .. }));
        assert_eq!(before, after);
    }

    #[test]
    fn authoritative_health_overwrites_local_prediction() {
        let (mut session, _transport, tx) = online_session();
        settle(&mut session, 120);

        tx.try_send(Inbound::Event(ServerEvent::HealthUpdate {
            player_id: session.local_id(),
            health: 64,
        }))
        .unwrap();
        let out = session.tick(&ControlInput::default(), DT);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::HealthChanged { health: 64 })));
        assert_eq!(out.snapshot.health, 64);
    }

    #[test]
    fn round_reset_respawns_and_clears_bullets() {
        let (mut session, _transport, tx) = online_session();
        settle(&mut session, 120);

        session.tick(
            &ControlInput {
                fire: true,
                ..ControlInput::default()
            },
            DT,
        );
        assert_eq!(session.bullets().len(), 1);

        tx.try_send(Inbound::Event(ServerEvent::RoundUpdate {
            round: 2,
            spawn_x: 100.0,
            spawn_y: 300.0,
        }))
        .unwrap();
        let out = session.tick(&ControlInput::default(), DT);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::RoundStarted { round: 2 })));
        assert!(session.bullets().is_empty());
        assert!((out.snapshot.x - 100.0).abs() < 2.0);
        assert_eq!(out.snapshot.health, out.snapshot.max_health);
    }

    #[test]
    fn departed_remote_takes_their_bullets_along() {
        let (mut session, _transport, tx) = online_session();
        settle(&mut session, 120);

        let remote_id = Uuid::new_v4();
        tx.try_send(Inbound::Event(ServerEvent::Shoot {
            id: remote_id,
            x: 300.0,
            y: 100.0,
            angle: 0.0,
        }))
        .unwrap();
        session.tick(&ControlInput::default(), DT);
        assert_eq!(session.bullets().len(), 1);

        tx.try_send(Inbound::Event(ServerEvent::PlayerLeft { id: remote_id }))
            .unwrap();
        session.tick(&ControlInput::default(), DT);
        assert!(session.bullets().is_empty());
    }

    #[test]
    fn movement_broadcast_is_throttled_per_frame_rate() {
        let (mut session, transport, _tx) = online_session();
        // 30 frames at 60 Hz span ~0 wall-clock time in the test, so the
        // 50 ms governor interval admits at most one or two sends
        settle(&mut session, 30);
        let moves = transport.count(|e| matches!(e, ClientEvent::InputMove { .. }));
        assert!(moves <= 2, "got {moves} movement sends in a burst");
    }

    #[test]
    fn augment_change_is_announced_and_applied() {
        let (mut session, transport, _tx) = online_session();
        settle(&mut session, 120);

        session.set_augments(vec![AugmentKind::HighVelocity]);
        assert_eq!(
            transport.count(|e| matches!(e, ClientEvent::AugmentState { .. })),
            1
        );
        assert!((session.weapon.stats().bullet_speed - 720.0).abs() < 1e-3);
    }
}
