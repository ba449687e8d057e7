//! HTTP surface: health, catalog, room listing and the WebSocket upgrade

pub mod routes;

pub use routes::build_router;
