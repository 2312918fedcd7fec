// Web module: HTTP control surface and WebSocket push surface.

pub mod handlers;
pub mod routes;
pub mod ws;

use std::sync::Arc;

use crate::server::registry::RoomRegistry;

pub use routes::create_router;

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }
}
