//! Wire event definitions for the duplex game transport
//!
//! These are the typed events the core emits and consumes; the transport
//! itself (socket, relay, loopback) is a collaborator behind the
//! [`crate::net::sync::Transport`] seam.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::augment::AugmentKind;
use crate::game::player::Facing;

/// Aim pose replicated between clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoseData {
    pub id: Uuid,
    /// Aim angle in radians
    pub angle: f32,
    pub facing: Facing,
    /// Sender timestamp, milliseconds
    pub t: u64,
}

/// Cosmetic effect kinds replicated for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    MuzzleFlash,
    Impact,
    Explosion,
    JumpDust,
}

/// A replicated particle burst
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParticleData {
    pub kind: ParticleKind,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// A bullet-on-player hit report
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BulletHit {
    pub bullet_id: Uuid,
    pub target_player_id: Uuid,
    pub x: f32,
    pub y: f32,
    pub damage: f32,
    /// Sender timestamp, milliseconds
    pub timestamp: u64,
}

/// Events sent from this client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Local movement state, throttled to the configured rate
    InputMove {
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        facing: Facing,
    },

    /// A shot was fired, sent immediately
    InputShoot { x: f32, y: f32, angle: f32 },

    /// Aim pose, deadbanded by facing and angle epsilon
    PoseUpdate { room_id: String, pose: PoseData },

    /// Cosmetic particle broadcast
    ParticleCreate {
        room_id: String,
        particle: ParticleData,
    },

    /// Hit report for a bullet this client owns; the server arbitrates
    /// the resulting damage
    BulletHit {
        room_id: String,
        player_id: Uuid,
        hit: BulletHit,
    },

    /// Announce room membership (also re-sent after a reconnect)
    Join { room_id: String, player_id: Uuid },

    /// Leave the room
    Leave { room_id: String, player_id: Uuid },

    /// Local active augment set, sent on change so peers can derive this
    /// client's ballistics
    AugmentState {
        room_id: String,
        player_id: Uuid,
        kinds: Vec<AugmentKind>,
    },
}

/// Events received from the server/peers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A remote player's movement state
    Move {
        id: Uuid,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        facing: Facing,
    },

    /// A remote player fired; a visual-only bullet is constructed with
    /// the sender's replicated ballistics
    Shoot { id: Uuid, x: f32, y: f32, angle: f32 },

    /// A remote player's aim pose
    PoseUpdate { pose: PoseData },

    /// A replicated particle burst
    ParticleCreate { particle: ParticleData },

    /// Another client's hit report
    BulletHit { hit: BulletHit },

    /// Authoritative health, overwrites any local prediction
    HealthUpdate { player_id: Uuid, health: i32 },

    /// Authoritative round transition
    RoundUpdate {
        round: u32,
        spawn_x: f32,
        spawn_y: f32,
    },

    /// A remote player's active augment set
    AugmentState { id: Uuid, kinds: Vec<AugmentKind> },

    /// A player joined the room
    PlayerJoined { id: Uuid },

    /// A player left; their shadows and bullets are torn down
    PlayerLeft { id: Uuid },
}

/// Transport lifecycle notifications, delivered on the same inbound
/// channel as game events so the frame loop applies them at tick
/// boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Transport (re)connected; membership must be re-announced
    Open,
    /// Transport dropped; outbound flow is suppressed
    Closed,
    /// The room acknowledged our join; outbound flow may resume
    JoinAcked,
}

/// Everything that can arrive on the inbound channel
#[derive(Debug, Clone)]
pub enum Inbound {
    Event(ServerEvent),
    Link(LinkEvent),
}

/// Wire encode/decode failures surfaced to the transport adapter
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ServerEvent {
    /// Decode one inbound text frame
    pub fn from_json(payload: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(payload)?)
    }
}

impl ClientEvent {
    /// Encode for an outbound text frame
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_event_wire_shape() {
        let ev = ClientEvent::InputMove {
            x: 10.0,
            y: 20.0,
            vx: 1.0,
            vy: -2.0,
            facing: Facing::Left,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"input_move\""));
        assert!(json.contains("\"facing\":\"L\""));
    }

    #[test]
    fn server_events_round_trip() {
        let ev = ServerEvent::Shoot {
            id: Uuid::new_v4(),
            x: 5.0,
            y: 6.0,
            angle: 1.25,
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        match back {
            ServerEvent::Shoot { angle, .. } => assert!((angle - 1.25).abs() < 1e-6),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn health_update_is_parseable_from_raw_json() {
        let json = r#"{"type":"health_update","player_id":"6b52c18f-9a1c-4b6f-9a05-2f7dbb93d7f4","health":55}"#;
        let ev: ServerEvent = ServerEvent::from_json(json).unwrap();
        match ev {
            ServerEvent::HealthUpdate { health, .. } => assert_eq!(health, 55),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn malformed_frame_is_a_typed_error() {
        let err = ServerEvent::from_json("{\"type\":\"nope\"}").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }
}
