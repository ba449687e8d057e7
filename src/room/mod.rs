//! Room lifecycle: per-room tick tasks and the process-wide registry

pub mod manager;
pub mod room;

pub use manager::{RoomError, RoomInfo, RoomManager};
pub use room::{ConnectionTx, JoinedPlayer, Room, RoomCmd, RoomHandle};
