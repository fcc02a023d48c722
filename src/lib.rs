//! Skirmish core - real-time movement, collision, and combat sync
//!
//! This crate is the simulation heart of a 2D side-scrolling multiplayer
//! shooter. Per connected participant it:
//! - integrates position from input every frame and resolves collisions
//!   against static rectangular obstacles
//! - runs the wall-grab/wall-jump, crouch, and multi-jump movement states
//! - sweeps fast projectiles against geometry and player hit circles
//!   without tunneling
//! - folds augment modifiers into the weapon/projectile/movement constants
//! - keeps every participant's view of every other participant
//!   approximately consistent over an unreliable transport
//!
//! Rendering, audio, UI, map loading, and matchmaking are collaborators
//! behind narrow seams: the core reads obstacle rectangles through
//! [`game::level::ObstacleSource`] and exchanges typed events through
//! [`net::sync::Transport`] plus a buffered inbound channel.

pub mod augment;
pub mod config;
pub mod game;
pub mod geom;
pub mod net;
pub mod util;

pub use augment::{AugmentAggregate, AugmentKind};
pub use config::CoreConfig;
pub use game::{ControlInput, FrameOutput, GameSession, PlayerSnapshot, SessionEvent};
pub use net::{NetSynchronizer, Transport};
