//! Local and shadow player state

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::wall::WallGrabState;

/// Which way the player is looking, serialized as a single-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl Facing {
    /// Unit sign along +x
    pub fn sign(&self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Aim angle pointing straight along the facing direction
    pub fn angle(&self) -> f32 {
        match self {
            Facing::Left => std::f32::consts::PI,
            Facing::Right => 0.0,
        }
    }

    pub fn from_dir(dir: f32) -> Option<Self> {
        if dir > 0.0 {
            Some(Facing::Right)
        } else if dir < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }
}

impl Default for Facing {
    fn default() -> Self {
        Facing::Right
    }
}

/// Health split into a local visual prediction and the server's word.
///
/// The controller only ever adjusts the prediction; authoritative updates
/// arriving from the network overwrite it outright.
#[derive(Debug, Clone, Copy)]
pub struct Health {
    max: i32,
    predicted: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self {
            max: max.max(1),
            predicted: max.max(1),
        }
    }

    pub fn value(&self) -> i32 {
        self.predicted
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.predicted <= 0
    }

    /// Visual prediction of incoming damage
    pub fn predict_damage(&mut self, damage: i32) {
        self.predicted = (self.predicted - damage.max(0)).clamp(0, self.max);
    }

    /// Visual prediction of healing (lifesteal)
    pub fn predict_heal(&mut self, amount: i32) {
        self.predicted = (self.predicted + amount.max(0)).clamp(0, self.max);
    }

    /// Authoritative overwrite from the server, last write wins
    pub fn set_authoritative(&mut self, health: i32) {
        self.predicted = health.clamp(0, self.max);
    }

    /// Resize the pool (augment max-health delta), refilling to full
    pub fn reset(&mut self, max: i32) {
        self.max = max.max(1);
        self.predicted = self.max;
    }
}

/// Full state of the locally simulated player.
///
/// Owned exclusively by the character controller that created it. Remote
/// participants get separate shadow entities in the synchronizer, never a
/// handle to this.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: Health,
    pub grounded: bool,
    pub jumping: bool,
    pub shooting: bool,
    pub crouching: bool,
    pub facing: Facing,
    pub wall: WallGrabState,
    /// Mid-air jumps still available this airtime
    pub extra_jumps_remaining: u32,
}

impl PlayerState {
    pub fn new(id: Uuid, x: f32, y: f32, max_health: i32) -> Self {
        Self {
            id,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            health: Health::new(max_health),
            grounded: false,
            jumping: false,
            shooting: false,
            crouching: false,
            facing: Facing::Right,
            wall: WallGrabState::default(),
            extra_jumps_remaining: 0,
        }
    }

    /// Reset for a respawn or round transition, keeping identity
    pub fn respawn(&mut self, x: f32, y: f32, max_health: i32) {
        self.x = x;
        self.y = y;
        self.vx = 0.0;
        self.vy = 0.0;
        self.health.reset(max_health);
        self.grounded = false;
        self.jumping = false;
        self.shooting = false;
        self.crouching = false;
        self.wall = WallGrabState::default();
        self.extra_jumps_remaining = 0;
    }
}

/// Immutable per-tick snapshot handed to the renderer and the synchronizer
#[derive(Debug, Clone, Copy)]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: i32,
    pub max_health: i32,
    pub grounded: bool,
    pub jumping: bool,
    pub shooting: bool,
    pub crouching: bool,
    pub facing: Facing,
    pub wall_grabbing: bool,
    pub aim_angle: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_wire_codes() {
        assert_eq!(serde_json::to_string(&Facing::Left).unwrap(), "\"L\"");
        assert_eq!(serde_json::to_string(&Facing::Right).unwrap(), "\"R\"");
        let f: Facing = serde_json::from_str("\"L\"").unwrap();
        assert_eq!(f, Facing::Left);
    }

    #[test]
    fn predicted_health_is_clamped() {
        let mut h = Health::new(100);
        h.predict_damage(130);
        assert_eq!(h.value(), 0);
        assert!(h.is_dead());
        h.predict_heal(500);
        assert_eq!(h.value(), 100);
    }

    #[test]
    fn authoritative_overwrites_prediction() {
        let mut h = Health::new(100);
        h.predict_damage(40);
        assert_eq!(h.value(), 60);
        h.set_authoritative(85);
        assert_eq!(h.value(), 85);
    }
}
