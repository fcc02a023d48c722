//! Augment catalog and aggregation
//!
//! Augments are gameplay modifiers picked between rounds. Each kind
//! declares a fixed effect block in the catalog; the aggregate is a pure
//! fold over a player's active set and is recomputed whenever that set
//! changes. Multiplicative fields combine by product, additive fields by
//! sum, and strength/ceiling fields by max, so aggregation is
//! order-independent.

use serde::{Deserialize, Serialize};

/// Every augment the game ships, keyed by wire-stable snake_case names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentKind {
    /// -25% reload time
    QuickHands,
    /// +6 magazine capacity
    ExtendedMag,
    /// Shots come 50 ms sooner
    RapidFire,
    /// +20% bullet speed
    HighVelocity,
    /// +25% bullet damage
    HollowPoint,
    /// +4 flat damage, slightly slower rounds
    HeavyRounds,
    /// +50% bullet size
    BigBore,
    /// Rounds steer toward the nearest enemy
    SeekerRounds,
    /// Bullets ricochet once more
    Ricochet,
    /// Bullets punch through one more body
    PiercingRounds,
    /// Rounds mostly ignore gravity
    GravityCoils,
    /// Rounds detonate on impact
    ExplosiveTip,
    /// +15% jump height
    SpringBoots,
    /// One extra mid-air jump
    DoubleJump,
    /// -15% gravity on the player
    Featherweight,
    /// +15% move speed
    Sprinter,
    /// +25 max health
    Juggernaut,
    /// Heal for 20% of damage dealt
    Vampiric,
}

impl AugmentKind {
    /// Immutable catalog lookup: the effect block this augment declares
    pub fn effect(&self) -> AugmentEffect {
        let mut e = AugmentEffect::identity();
        match self {
            AugmentKind::QuickHands => e.weapon.reload_mul = 0.75,
            AugmentKind::ExtendedMag => e.weapon.magazine_add = 6,
            AugmentKind::RapidFire => e.weapon.fire_interval_add = -0.05,
            AugmentKind::HighVelocity => e.bullet.speed_mul = 1.2,
            AugmentKind::HollowPoint => e.bullet.damage_mul = 1.25,
            AugmentKind::HeavyRounds => {
                e.bullet.damage_add = 4.0;
                e.bullet.speed_mul = 0.9;
            }
            AugmentKind::BigBore => e.bullet.size_mul = 1.5,
            AugmentKind::SeekerRounds => e.bullet.homing_strength = 3.0,
            AugmentKind::Ricochet => e.bullet.bounce_add = 1,
            AugmentKind::PiercingRounds => e.bullet.pierce_add = 1,
            AugmentKind::GravityCoils => e.bullet.gravity_resistance = 0.8,
            AugmentKind::ExplosiveTip => e.bullet.explode_radius = 40.0,
            AugmentKind::SpringBoots => e.player.jump_mul = 1.15,
            AugmentKind::DoubleJump => e.player.extra_jumps = 1,
            AugmentKind::Featherweight => e.player.gravity_mul = 0.85,
            AugmentKind::Sprinter => e.player.move_speed_mul = 1.15,
            AugmentKind::Juggernaut => e.player.max_health_add = 25,
            AugmentKind::Vampiric => e.player.lifesteal = 0.2,
        }
        e
    }
}

/// One augment's declared deltas (identity everywhere it does nothing)
#[derive(Debug, Clone, Copy)]
pub struct AugmentEffect {
    pub weapon: WeaponDelta,
    pub bullet: BulletDelta,
    pub player: PlayerDelta,
}

impl AugmentEffect {
    pub fn identity() -> Self {
        Self {
            weapon: WeaponDelta::identity(),
            bullet: BulletDelta::identity(),
            player: PlayerDelta::identity(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeaponDelta {
    pub reload_mul: f32,
    pub magazine_add: u32,
    pub fire_interval_add: f32,
}

impl WeaponDelta {
    fn identity() -> Self {
        Self {
            reload_mul: 1.0,
            magazine_add: 0,
            fire_interval_add: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BulletDelta {
    pub speed_mul: f32,
    pub damage_mul: f32,
    pub size_mul: f32,
    pub damage_add: f32,
    /// Combined by max across the active set
    pub homing_strength: f32,
    pub bounce_add: u32,
    pub pierce_add: u32,
    /// Combined by max across the active set
    pub gravity_resistance: f32,
    /// Combined by max across the active set
    pub explode_radius: f32,
}

impl BulletDelta {
    fn identity() -> Self {
        Self {
            speed_mul: 1.0,
            damage_mul: 1.0,
            size_mul: 1.0,
            damage_add: 0.0,
            homing_strength: 0.0,
            bounce_add: 0,
            pierce_add: 0,
            gravity_resistance: 0.0,
            explode_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerDelta {
    pub jump_mul: f32,
    pub extra_jumps: u32,
    pub gravity_mul: f32,
    pub move_speed_mul: f32,
    pub max_health_add: i32,
    pub lifesteal: f32,
}

impl PlayerDelta {
    fn identity() -> Self {
        Self {
            jump_mul: 1.0,
            extra_jumps: 0,
            gravity_mul: 1.0,
            move_speed_mul: 1.0,
            max_health_add: 0,
            lifesteal: 0.0,
        }
    }
}

/// Folded deltas of a player's whole active set.
///
/// Structurally identical to a single effect block; the identity aggregate
/// leaves every derived constant untouched.
#[derive(Debug, Clone, Copy)]
pub struct AugmentAggregate {
    pub weapon: WeaponDelta,
    pub bullet: BulletDelta,
    pub player: PlayerDelta,
}

impl Default for AugmentAggregate {
    fn default() -> Self {
        Self {
            weapon: WeaponDelta::identity(),
            bullet: BulletDelta::identity(),
            player: PlayerDelta::identity(),
        }
    }
}

impl AugmentAggregate {
    /// Fold an active set into an aggregate
    pub fn from_kinds<'a, I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = &'a AugmentKind>,
    {
        let mut agg = Self::default();
        for kind in kinds {
            agg.apply(&kind.effect());
        }
        agg
    }

    /// Fold one more effect block in
    pub fn apply(&mut self, e: &AugmentEffect) {
        self.weapon.reload_mul *= e.weapon.reload_mul;
        self.weapon.magazine_add += e.weapon.magazine_add;
        self.weapon.fire_interval_add += e.weapon.fire_interval_add;

        self.bullet.speed_mul *= e.bullet.speed_mul;
        self.bullet.damage_mul *= e.bullet.damage_mul;
        self.bullet.size_mul *= e.bullet.size_mul;
        self.bullet.damage_add += e.bullet.damage_add;
        self.bullet.homing_strength = self.bullet.homing_strength.max(e.bullet.homing_strength);
        self.bullet.bounce_add += e.bullet.bounce_add;
        self.bullet.pierce_add += e.bullet.pierce_add;
        self.bullet.gravity_resistance = self
            .bullet
            .gravity_resistance
            .max(e.bullet.gravity_resistance);
        self.bullet.explode_radius = self.bullet.explode_radius.max(e.bullet.explode_radius);

        self.player.jump_mul *= e.player.jump_mul;
        self.player.extra_jumps += e.player.extra_jumps;
        self.player.gravity_mul *= e.player.gravity_mul;
        self.player.move_speed_mul *= e.player.move_speed_mul;
        self.player.max_health_add += e.player.max_health_add;
        self.player.lifesteal += e.player.lifesteal;
    }
}
