//! Network protocol and state synchronization

pub mod protocol;
pub mod sync;

pub use protocol::{ClientEvent, Inbound, LinkEvent, ServerEvent};
pub use sync::{NetSynchronizer, RemoteDirectory, SyncEffect, SyncPhase, Transport};
