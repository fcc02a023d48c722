//! Game simulation modules

pub mod collision;
pub mod combat;
pub mod controller;
pub mod kinematics;
pub mod level;
pub mod player;
pub mod projectile;
pub mod session;
pub mod wall;

pub use controller::{CharacterController, ControlInput, MovementEvent};
pub use player::{Facing, PlayerSnapshot, PlayerState};
pub use session::{FrameOutput, GameSession, SessionEvent};
