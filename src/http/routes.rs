//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::game::{all_game_info, GameInfo};
use crate::room::RoomInfo;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Multiple origins come comma-separated in CLIENT_ORIGIN; "*" allows any
    let cors = if state.config.client_origin.trim() == "*" {
        CorsLayer::new().allow_origin(Any)
    } else {
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
            .collect();
        CorsLayer::new().allow_origin(allowed_origins)
    }
    .allow_methods([Method::GET, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/games", get(games_handler))
        .route("/rooms", get(rooms_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    active_players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.rooms.room_count(),
        active_players: state.rooms.total_players(),
    })
}

/// Catalog of playable game variants, keyed by game type id
async fn games_handler() -> Json<BTreeMap<&'static str, GameInfo>> {
    Json(
        all_game_info()
            .into_iter()
            .map(|info| (info.id.as_str(), info))
            .collect(),
    )
}

#[derive(Serialize)]
struct RoomsResponse {
    rooms: Vec<RoomInfo>,
}

/// Listing of currently active rooms
async fn rooms_handler(State(state): State<AppState>) -> Json<RoomsResponse> {
    Json(RoomsResponse {
        rooms: state.rooms.list_rooms(),
    })
}
