//! Wall proximity detection and the grab/slide/jump state machine

use crate::config::WallTuning;
use crate::geom::Aabb;

/// Side of the player a grabbable wall sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    /// Push-off direction sign for a wall jump (+x away from the wall)
    pub fn away_sign(&self) -> f32 {
        match self {
            WallSide::Left => 1.0,
            WallSide::Right => -1.0,
        }
    }
}

/// Wall faces currently within grab range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    pub left: bool,
    pub right: bool,
}

impl WallContact {
    pub fn on(&self, side: WallSide) -> bool {
        match side {
            WallSide::Left => self.left,
            WallSide::Right => self.right,
        }
    }
}

/// Geometric wall query.
///
/// An obstacle counts as a wall when it overlaps the player's vertical
/// span by more than the margin, its facing edge lies within the detect
/// distance of the player's edge, and the player's center sits clear of
/// the exclusion zones at the obstacle's top and bottom (so ledges and
/// floor lips don't read as grabbable walls).
pub fn detect_walls(
    px: f32,
    py: f32,
    half_w: f32,
    half_h: f32,
    obstacles: &[Aabb],
    tuning: &WallTuning,
) -> WallContact {
    let mut contact = WallContact::default();
    let top = py - half_h;
    let bottom = py + half_h;
    let left_edge = px - half_w;
    let right_edge = px + half_w;

    for raw in obstacles {
        let obs = Aabb::sanitized(raw.x, raw.y, raw.w, raw.h);
        if obs.w <= 0.0 || obs.h <= 0.0 {
            continue;
        }

        let overlap = bottom.min(obs.bottom()) - top.max(obs.y);
        if overlap <= tuning.vertical_overlap_margin {
            continue;
        }

        // Ledge guard: ignore contact when the player's center is within
        // the corner exclusion band of the obstacle's ends
        if py < obs.y + tuning.corner_exclusion || py > obs.bottom() - tuning.corner_exclusion {
            continue;
        }

        // Wall on the right: obstacle's left face near the player's right edge
        if px < obs.x && (obs.x - right_edge).abs() <= tuning.detect_distance {
            contact.right = true;
        }
        // Wall on the left: obstacle's right face near the player's left edge
        if px > obs.right() && (left_edge - obs.right()).abs() <= tuning.detect_distance {
            contact.left = true;
        }
    }

    contact
}

/// Grab/slide/jump sub-state, one per player.
///
/// Lifecycle: Idle -> Grabbing (sliding under the speed cap) -> Released,
/// with a cooldown after a wall jump before the next grab can start.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallGrabState {
    grabbing: Option<WallSide>,
    grab_remaining: f32,
    cooldown_remaining: f32,
}

impl WallGrabState {
    pub fn is_grabbing(&self) -> bool {
        self.grabbing.is_some()
    }

    pub fn side(&self) -> Option<WallSide> {
        self.grabbing
    }

    pub fn grab_remaining(&self) -> f32 {
        self.grab_remaining
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    /// Count down timers; the grab timer is strictly decreasing while a
    /// grab is held
    pub fn tick(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
        if self.grabbing.is_some() {
            self.grab_remaining = (self.grab_remaining - dt).max(0.0);
        }
    }

    /// Run entry/release transitions for this tick.
    ///
    /// `move_dir` is the held horizontal input (-1, 0, +1); `airborne` and
    /// `falling` come from the previous tick's resolved state.
    pub fn evaluate(
        &mut self,
        move_dir: f32,
        airborne: bool,
        falling: bool,
        contact: WallContact,
        tuning: &WallTuning,
    ) {
        if let Some(side) = self.grabbing {
            let opposite_held = match side {
                WallSide::Left => move_dir > 0.0,
                WallSide::Right => move_dir < 0.0,
            };
            let released = !airborne
                || self.grab_remaining <= 0.0
                || !contact.on(side)
                || opposite_held;
            if released {
                self.grabbing = None;
            }
            return;
        }

        if !airborne || !falling || self.cooldown_remaining > 0.0 {
            return;
        }

        // Grab toward the held side only
        let toward = if move_dir > 0.0 && contact.right {
            Some(WallSide::Right)
        } else if move_dir < 0.0 && contact.left {
            Some(WallSide::Left)
        } else {
            None
        };

        if let Some(side) = toward {
            self.grabbing = Some(side);
            self.grab_remaining = tuning.max_grab_time;
        }
    }

    /// Velocity override while grabbing: vx zeroed, fall speed clamped to
    /// the slide cap
    pub fn constrain_velocity(&self, vx: f32, vy: f32, tuning: &WallTuning) -> (f32, f32) {
        if self.grabbing.is_none() {
            return (vx, vy);
        }
        (0.0, vy.min(tuning.slide_speed_cap))
    }

    /// Wall jump: only valid while grabbing. Returns the outward+upward
    /// impulse and starts the re-grab cooldown.
    pub fn wall_jump(&mut self, tuning: &WallTuning) -> Option<(f32, f32)> {
        let side = self.grabbing.take()?;
        self.grab_remaining = 0.0;
        self.cooldown_remaining = tuning.jump_cooldown;
        Some((
            side.away_sign() * tuning.wall_jump_horizontal,
            -tuning.wall_jump_vertical,
        ))
    }

    /// Drop any grab without an impulse (landing, respawn, level change)
    pub fn release(&mut self) {
        self.grabbing = None;
        self.grab_remaining = 0.0;
    }
}
