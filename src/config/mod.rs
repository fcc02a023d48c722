//! Simulation tuning constants
//!
//! Every tunable the core consumes lives here as a plain struct with a
//! `Default` giving the shipped game feel. Collaborators construct a
//! [`CoreConfig`] once and hand it to the session; nothing in the core
//! reads the environment.

use std::time::Duration;

/// Horizontal/vertical movement tuning
#[derive(Debug, Clone, Copy)]
pub struct MovementTuning {
    /// Base horizontal run speed
    pub move_speed: f32,
    /// Exponential damping rate applied to vx when there is no input
    pub damping_rate: f32,
    /// Downward gravity acceleration (+y is down)
    pub gravity: f32,
    /// Terminal fall speed
    pub max_fall_speed: f32,
    /// Upward jump impulse magnitude
    pub jump_velocity: f32,
    /// Player half width
    pub half_width: f32,
    /// Player half height (standing)
    pub half_height: f32,
    /// Height multiplier while fully crouched
    pub crouch_height_factor: f32,
    /// Speed multiplier while fully crouched
    pub crouch_speed_factor: f32,
    /// Rate at which the crouch factor eases toward its target
    pub crouch_smoothing: f32,
    /// Downward probe distance for the ground stability pass
    pub ground_snap_tolerance: f32,
    /// Probe distance while crouched (crouching sits lower on slopes of
    /// stacked tiles, so the probe is more forgiving)
    pub ground_snap_tolerance_crouched: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: 420.0,
            damping_rate: 10.0,
            gravity: 1800.0,
            max_fall_speed: 900.0,
            jump_velocity: 650.0,
            half_width: 25.0,
            half_height: 25.0,
            crouch_height_factor: 0.6,
            crouch_speed_factor: 0.5,
            crouch_smoothing: 12.0,
            ground_snap_tolerance: 3.0,
            ground_snap_tolerance_crouched: 5.0,
        }
    }
}

/// Wall-grab / wall-jump tuning
#[derive(Debug, Clone, Copy)]
pub struct WallTuning {
    /// Horizontal distance within which a wall face counts as grabbable
    pub detect_distance: f32,
    /// Minimum vertical overlap with the obstacle before it counts as a wall
    pub vertical_overlap_margin: f32,
    /// Dead zone near the obstacle's top and bottom edges (ledge guard)
    pub corner_exclusion: f32,
    /// Maximum time a grab can be held, seconds
    pub max_grab_time: f32,
    /// Fall speed ceiling while sliding down a grabbed wall
    pub slide_speed_cap: f32,
    /// Re-grab lockout after a wall jump, seconds
    pub jump_cooldown: f32,
    /// Outward horizontal impulse of a wall jump
    pub wall_jump_horizontal: f32,
    /// Upward vertical impulse of a wall jump
    pub wall_jump_vertical: f32,
}

impl Default for WallTuning {
    fn default() -> Self {
        Self {
            detect_distance: 6.0,
            vertical_overlap_margin: 4.0,
            corner_exclusion: 12.0,
            max_grab_time: 1.5,
            slide_speed_cap: 140.0,
            jump_cooldown: 0.25,
            wall_jump_horizontal: 420.0,
            wall_jump_vertical: 560.0,
        }
    }
}

/// Base weapon and projectile tuning, before augments
#[derive(Debug, Clone, Copy)]
pub struct WeaponTuning {
    /// Minimum time between shots, seconds
    pub fire_interval: f32,
    /// Time to refill the magazine, seconds
    pub reload_time: f32,
    /// Rounds per magazine
    pub magazine_size: u32,
    /// Muzzle speed
    pub bullet_speed: f32,
    /// Damage per hit
    pub bullet_damage: f32,
    /// Projectile hitbox radius
    pub bullet_radius: f32,
    /// Projectile lifetime, seconds
    pub bullet_lifetime: f32,
    /// Aim jitter applied per shot, radians
    pub spread: f32,
    /// Distance from player center to the muzzle
    pub muzzle_offset: f32,
    /// Downward acceleration on projectiles
    pub bullet_gravity: f32,
    /// Velocity retained after a ricochet
    pub bounce_damping: f32,
    /// Range within which homing rounds acquire a target
    pub homing_range: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            fire_interval: 0.18,
            reload_time: 1.4,
            magazine_size: 12,
            bullet_speed: 600.0,
            bullet_damage: 10.0,
            bullet_radius: 6.0,
            bullet_lifetime: 1.6,
            spread: 0.015,
            muzzle_offset: 30.0,
            bullet_gravity: 300.0,
            bounce_damping: 0.75,
            homing_range: 320.0,
        }
    }
}

/// Player vitals tuning
#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Base maximum health
    pub max_health: i32,
    /// Post-hit invulnerability window, seconds
    pub invuln_time: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            invuln_time: 0.8,
        }
    }
}

/// Network synchronization tuning
#[derive(Debug, Clone, Copy)]
pub struct NetTuning {
    /// Minimum interval between outbound movement updates
    pub move_min_interval: Duration,
    /// Aim-angle change below which a pose update is deadbanded away
    pub pose_angle_epsilon: f32,
}

impl Default for NetTuning {
    fn default() -> Self {
        Self {
            move_min_interval: Duration::from_millis(50),
            pose_angle_epsilon: 0.02,
        }
    }
}

/// Aggregate configuration handed to a session at construction
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreConfig {
    pub movement: MovementTuning,
    pub wall: WallTuning,
    pub weapon: WeaponTuning,
    pub player: PlayerTuning,
    pub net: NetTuning,
}
