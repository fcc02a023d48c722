//! Weapon stats, fire control, and damage helpers

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::augment::AugmentAggregate;
use crate::config::WeaponTuning;

/// Effective weapon/projectile constants after augment aggregation.
///
/// Re-derived whenever the active augment set changes; everything the
/// projectile system needs to spawn a bullet lives here.
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    pub fire_interval: f32,
    pub reload_time: f32,
    pub magazine_size: u32,
    pub bullet_speed: f32,
    pub bullet_damage: f32,
    pub bullet_radius: f32,
    pub bullet_lifetime: f32,
    pub bounce_count: u32,
    pub pierce_count: u32,
    pub homing_strength: f32,
    pub explode_radius: f32,
    pub gravity_resistance: f32,
}

impl WeaponStats {
    /// Fold augment deltas over the base tuning
    pub fn derive(base: &WeaponTuning, agg: &AugmentAggregate) -> Self {
        Self {
            fire_interval: (base.fire_interval + agg.weapon.fire_interval_add).max(0.02),
            reload_time: (base.reload_time * agg.weapon.reload_mul).max(0.1),
            magazine_size: base.magazine_size + agg.weapon.magazine_add,
            bullet_speed: base.bullet_speed * agg.bullet.speed_mul,
            bullet_damage: base.bullet_damage * agg.bullet.damage_mul + agg.bullet.damage_add,
            bullet_radius: base.bullet_radius * agg.bullet.size_mul,
            bullet_lifetime: base.bullet_lifetime,
            bounce_count: agg.bullet.bounce_add,
            pierce_count: agg.bullet.pierce_add,
            homing_strength: agg.bullet.homing_strength,
            explode_radius: agg.bullet.explode_radius,
            gravity_resistance: agg.bullet.gravity_resistance.clamp(0.0, 1.0),
        }
    }
}

/// Parameters of one fired shot
#[derive(Debug, Clone, Copy)]
pub struct ShotSpec {
    /// Aim angle after spread jitter, radians
    pub angle: f32,
    pub speed: f32,
}

/// Magazine-fed fire control for the local player's weapon
#[derive(Debug, Clone)]
pub struct Weapon {
    stats: WeaponStats,
    spread: f32,
    rounds_left: u32,
    cooldown: f32,
    reload_remaining: f32,
}

impl Weapon {
    pub fn new(base: &WeaponTuning, agg: &AugmentAggregate) -> Self {
        let stats = WeaponStats::derive(base, agg);
        Self {
            spread: base.spread,
            rounds_left: stats.magazine_size,
            cooldown: 0.0,
            reload_remaining: 0.0,
            stats,
        }
    }

    pub fn stats(&self) -> &WeaponStats {
        &self.stats
    }

    pub fn rounds_left(&self) -> u32 {
        self.rounds_left
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_remaining > 0.0
    }

    /// Swap in freshly derived stats (augment set changed). The magazine
    /// keeps its current fill, capped to the new size.
    pub fn refresh_stats(&mut self, base: &WeaponTuning, agg: &AugmentAggregate) {
        self.stats = WeaponStats::derive(base, agg);
        self.rounds_left = self.rounds_left.min(self.stats.magazine_size);
    }

    /// Count down cooldown and reload timers
    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        if self.reload_remaining > 0.0 {
            self.reload_remaining = (self.reload_remaining - dt).max(0.0);
            if self.reload_remaining == 0.0 {
                self.rounds_left = self.stats.magazine_size;
            }
        }
    }

    /// Attempt to fire toward `aim_angle`. Returns the shot parameters on
    /// success; an empty magazine starts a reload instead.
    pub fn try_fire(&mut self, aim_angle: f32, rng: &mut ChaCha8Rng) -> Option<ShotSpec> {
        if self.cooldown > 0.0 || self.reload_remaining > 0.0 {
            return None;
        }
        if self.rounds_left == 0 {
            self.reload_remaining = self.stats.reload_time;
            return None;
        }

        self.rounds_left -= 1;
        self.cooldown = self.stats.fire_interval;
        if self.rounds_left == 0 {
            self.reload_remaining = self.stats.reload_time;
        }

        let jitter = if self.spread > 0.0 {
            rng.gen_range(-self.spread..self.spread)
        } else {
            0.0
        };

        Some(ShotSpec {
            angle: aim_angle + jitter,
            speed: self.stats.bullet_speed,
        })
    }
}

/// Lifesteal healing for damage dealt, rounded down
pub fn lifesteal_heal(damage: f32, lifesteal: f32) -> i32 {
    (damage * lifesteal.clamp(0.0, 1.0)).floor() as i32
}
