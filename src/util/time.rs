//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const TICK_RATE: u32 = 60; // 60 simulation ticks per second
pub const TICK_DURATION: Duration = Duration::from_micros(1_000_000 / TICK_RATE as u64);

/// Upper bound on a single tick's delta time. A room that stalls resumes
/// with a bounded step instead of one huge jump that would tunnel entities
/// through obstacles.
pub const MAX_TICK_DELTA: f32 = 0.25;
