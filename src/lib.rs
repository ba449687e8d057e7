//! Party game server library
//!
//! Authoritative multiplayer game server: isolated rooms run their own
//! 60 TPS simulation tasks and broadcast full state snapshots to browser
//! clients over WebSocket.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod room;
pub mod util;
pub mod ws;
