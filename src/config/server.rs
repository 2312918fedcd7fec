//! Server behavior configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_cors_origins, default_room_cleanup_interval, default_subscriber_buffer,
};

/// Operational settings for the HTTP/WebSocket server and room registry.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins, comma separated; `*` means permissive.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// Interval for the terminal-room cleanup sweep (seconds)
    #[serde(default = "default_room_cleanup_interval")]
    pub room_cleanup_interval: u64,
    /// Outbound event buffer per subscriber; a subscriber that falls this
    /// far behind is dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    /// Optional append-only room log (JSON lines). Absent = disabled.
    #[serde(default)]
    pub room_log_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            room_cleanup_interval: default_room_cleanup_interval(),
            subscriber_buffer: default_subscriber_buffer(),
            room_log_path: None,
        }
    }
}
