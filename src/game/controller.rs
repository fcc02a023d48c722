//! Per-tick character controller for the local player
//!
//! The tick order is load-bearing: wall state before movement and
//! gravity, gravity before integration, integration before collision
//! resolution, landing detection after resolution. Reordering breaks the
//! ground-snap and grab-release invariants.

use tracing::debug;
use uuid::Uuid;

use crate::augment::AugmentAggregate;
use crate::config::{MovementTuning, PlayerTuning, WallTuning};
use crate::game::collision::CollisionResolver;
use crate::game::kinematics;
use crate::game::level::ObstacleSource;
use crate::game::player::{Facing, PlayerSnapshot, PlayerState};
use crate::game::wall::{detect_walls, WallContact};

/// One frame of player input, snapshotted before the tick runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlInput {
    /// Held horizontal direction in [-1, 1]
    pub move_dir: f32,
    /// Jump went down this frame
    pub jump_pressed: bool,
    /// Crouch is held
    pub crouch: bool,
    /// Fire is held
    pub fire: bool,
    /// Aim angle in radians (may be non-finite on pointer loss)
    pub aim_angle: f32,
}

/// Renderer-facing edges produced by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementEvent {
    Jumped,
    AirJumped,
    WallJumped,
    WallGrabbed,
    Landed,
}

/// Drives the local [`PlayerState`] through the fixed per-tick pipeline
pub struct CharacterController {
    state: PlayerState,
    movement: MovementTuning,
    wall_tuning: WallTuning,
    player_tuning: PlayerTuning,
    resolver: CollisionResolver,
    /// Smoothed crouch interpolation, 1.0 standing down to the tuned
    /// crouch factor
    crouch_factor: f32,
    invuln_remaining: f32,
    aim_angle: f32,
    was_grabbing: bool,
}

impl CharacterController {
    pub fn new(
        id: Uuid,
        spawn_x: f32,
        spawn_y: f32,
        movement: MovementTuning,
        wall_tuning: WallTuning,
        player_tuning: PlayerTuning,
    ) -> Self {
        Self {
            state: PlayerState::new(id, spawn_x, spawn_y, player_tuning.max_health),
            resolver: CollisionResolver::new(&movement),
            movement,
            wall_tuning,
            player_tuning,
            crouch_factor: 1.0,
            invuln_remaining: 0.0,
            aim_angle: 0.0,
            was_grabbing: false,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn aim_angle(&self) -> f32 {
        self.aim_angle
    }

    pub fn half_width(&self) -> f32 {
        self.resolver.half_width()
    }

    /// Current hit-circle radius for incoming projectile tests
    pub fn hit_radius(&self) -> f32 {
        self.resolver.half_height(self.crouch_factor)
    }

    /// Advance one tick. `aggregate` carries the player's augment deltas;
    /// `level` provides the obstacle snapshot for this frame.
    pub fn tick(
        &mut self,
        input: &ControlInput,
        aggregate: &AugmentAggregate,
        level: &dyn ObstacleSource,
        dt: f32,
        events: &mut Vec<MovementEvent>,
    ) -> PlayerSnapshot {
        let obstacles = level.obstacles();
        let was_grounded = self.state.grounded;

        self.invuln_remaining = (self.invuln_remaining - dt).max(0.0);

        // (1) input snapshot: derive facing, sanitize aim
        if let Some(facing) = Facing::from_dir(input.move_dir) {
            self.state.facing = facing;
        }
        self.aim_angle = sanitize_aim(input.aim_angle, self.state.facing);

        // (2) wall detection feeds the grab state machine
        let contact = self.wall_contact(obstacles);
        self.state.wall.tick(dt);
        self.state.wall.evaluate(
            input.move_dir,
            !self.state.grounded,
            self.state.vy > 0.0,
            contact,
            &self.wall_tuning,
        );
        if self.state.wall.is_grabbing() && !self.was_grabbing {
            events.push(MovementEvent::WallGrabbed);
        }

        // (3) smoothed crouch transition, feet kept planted while grounded
        self.state.crouching = input.crouch && self.state.grounded;
        let crouch_target = if self.state.crouching {
            self.movement.crouch_height_factor
        } else {
            1.0
        };
        let ease = (self.movement.crouch_smoothing * dt).min(1.0);
        let old_hh = self.resolver.half_height(self.crouch_factor);
        self.crouch_factor += (crouch_target - self.crouch_factor) * ease;
        if self.state.grounded {
            self.state.y += old_hh - self.resolver.half_height(self.crouch_factor);
        }

        if self.state.wall.is_grabbing() {
            // (5) wall-jump replaces normal movement while grabbing
            if input.jump_pressed {
                if let Some((vx, vy)) = self.state.wall.wall_jump(&self.wall_tuning) {
                    self.state.vx = vx;
                    self.state.vy = vy * aggregate.player.jump_mul;
                    self.state.jumping = true;
                    events.push(MovementEvent::WallJumped);
                }
            }
        } else {
            // (4) horizontal movement and jumps
            let crouch_speed = 1.0
                + (self.movement.crouch_speed_factor - 1.0) * (1.0 - self.crouch_factor)
                    / (1.0 - self.movement.crouch_height_factor).max(f32::EPSILON);
            if input.move_dir != 0.0 {
                self.state.vx = input.move_dir
                    * self.movement.move_speed
                    * crouch_speed
                    * aggregate.player.move_speed_mul;
            } else {
                self.state.vx =
                    kinematics::damp_horizontal(self.state.vx, self.movement.damping_rate, dt);
            }

            if input.jump_pressed {
                let jump_vy = -self.movement.jump_velocity * aggregate.player.jump_mul;
                if self.state.grounded {
                    self.state.vy = jump_vy;
                    self.state.grounded = false;
                    self.state.jumping = true;
                    events.push(MovementEvent::Jumped);
                } else if self.state.extra_jumps_remaining > 0 {
                    self.state.extra_jumps_remaining -= 1;
                    self.state.vy = jump_vy;
                    self.state.jumping = true;
                    events.push(MovementEvent::AirJumped);
                }
                // Exhausted budget: silently ignored
            }
        }

        // (6) gravity, suppressed while grounded or grabbing
        let gravity_active = !self.state.grounded && !self.state.wall.is_grabbing();
        self.state.vy = kinematics::apply_gravity(
            self.state.vy,
            self.movement.gravity * aggregate.player.gravity_mul,
            self.movement.max_fall_speed,
            dt,
            gravity_active,
        );
        let (cvx, cvy) =
            self.state
                .wall
                .constrain_velocity(self.state.vx, self.state.vy, &self.wall_tuning);
        self.state.vx = cvx;
        self.state.vy = cvy;

        // (7) integrate, (8) resolve
        let (nx, ny) = kinematics::integrate(self.state.x, self.state.y, cvx, cvy, dt);
        let res = self
            .resolver
            .resolve(nx, ny, cvx, cvy, obstacles, self.crouch_factor);
        self.state.x = res.x;
        self.state.y = res.y;
        self.state.vx = res.vx;
        self.state.vy = res.vy;
        self.state.grounded = res.contacts.grounded;
        if res.contacts.hit_ceiling && self.state.vy < 0.0 {
            self.state.vy = 0.0;
        }

        // (9) landing edge: refill the air-jump budget, drop stale grabs
        if self.state.grounded && !was_grounded {
            self.state.extra_jumps_remaining = aggregate.player.extra_jumps;
            self.state.jumping = false;
            self.state.wall.release();
            events.push(MovementEvent::Landed);
            debug!(x = self.state.x, y = self.state.y, "landed");
        }
        if self.state.grounded {
            self.state.jumping = false;
        }

        // (10) level bounds
        self.state.x = level.bounds().clamp_center(self.state.x, self.half_width());

        self.state.shooting = input.fire;
        self.was_grabbing = self.state.wall.is_grabbing();

        // (11) immutable snapshot
        self.snapshot()
    }

    fn wall_contact(&self, obstacles: &[crate::geom::Aabb]) -> WallContact {
        detect_walls(
            self.state.x,
            self.state.y,
            self.resolver.half_width(),
            self.resolver.half_height(self.crouch_factor),
            obstacles,
            &self.wall_tuning,
        )
    }

    /// Incoming damage, locally predicted only. Rejected while the
    /// invulnerability window is open; authoritative health arrives via
    /// the synchronizer.
    pub fn predict_damage(&mut self, damage: i32) -> bool {
        if self.invuln_remaining > 0.0 {
            return false;
        }
        self.state.health.predict_damage(damage);
        self.invuln_remaining = self.player_tuning.invuln_time;
        true
    }

    /// Lifesteal and other predicted healing
    pub fn predict_heal(&mut self, amount: i32) {
        self.state.health.predict_heal(amount);
    }

    /// Authoritative health from the server, overwrites prediction
    pub fn set_authoritative_health(&mut self, health: i32) {
        self.state.health.set_authoritative(health);
    }

    /// Round transition or respawn
    pub fn respawn(&mut self, x: f32, y: f32, aggregate: &AugmentAggregate) {
        let max = self.player_tuning.max_health + aggregate.player.max_health_add;
        self.state.respawn(x, y, max);
        self.crouch_factor = 1.0;
        self.invuln_remaining = self.player_tuning.invuln_time;
        self.was_grabbing = false;
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.state.id,
            x: self.state.x,
            y: self.state.y,
            vx: self.state.vx,
            vy: self.state.vy,
            health: self.state.health.value(),
            max_health: self.state.health.max(),
            grounded: self.state.grounded,
            jumping: self.state.jumping,
            shooting: self.state.shooting,
            crouching: self.state.crouching,
            facing: self.state.facing,
            wall_grabbing: self.state.wall.is_grabbing(),
            aim_angle: self.aim_angle,
        }
    }
}

/// Input anomaly policy: a non-finite aim collapses to the facing
/// direction instead of leaking NaN into physics or rendering
fn sanitize_aim(angle: f32, facing: Facing) -> f32 {
    if angle.is_finite() {
        angle
    } else {
        facing.angle()
    }
}
