//! The room registry: room code to actor handle.
//!
//! Insert happens on create, removal in the periodic cleanup sweep once a
//! game is terminal and its last subscriber is gone. Neither operation
//! holds a lock across an await.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;

use crate::config::Config;
use crate::error::RoomError;
use crate::game::transitions;
use crate::protocol::room_codes::{generate_host_token, generate_room_code};
use crate::protocol::validation::normalise_room_code;

use super::actor::{spawn_room, RoomHandle};
use super::room_log::{RoomLog, RoomLogEntry};

/// Response to a successful room creation. The only message that ever
/// carries the host token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_code: String,
    pub host_name: String,
    pub max_participants: u8,
    pub ws_path: String,
    pub host_token: String,
}

pub struct RoomRegistry {
    config: Arc<Config>,
    rooms: DashMap<String, RoomHandle>,
    room_log: Option<RoomLog>,
}

impl RoomRegistry {
    pub fn new(config: Arc<Config>) -> Self {
        let room_log = config
            .server
            .room_log_path
            .clone()
            .map(RoomLog::new);
        Self {
            config,
            rooms: DashMap::new(),
            room_log,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Create a room: generate a unique code, spawn its actor, register
    /// the handle, and best-effort append to the room log.
    pub fn create_room(
        &self,
        host_name: &str,
        max_participants: u8,
    ) -> Result<RoomCreated, RoomError> {
        let now = Utc::now();
        let host_token = generate_host_token();

        loop {
            let code = generate_room_code(self.config.game.room_code_length);
            match self.rooms.entry(code.clone()) {
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    tracing::debug!(room_code = %code, "room code collision, retrying");
                }
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    let state = transitions::create_room(
                        code.clone(),
                        host_name,
                        max_participants,
                        host_token.clone(),
                        now,
                        &self.config.game,
                    )?;
                    let host_name = state.host_name.clone();

                    if let Some(log) = &self.room_log {
                        log.append(&RoomLogEntry {
                            code: code.clone(),
                            host_name: host_name.clone(),
                            max_participants,
                            status: "LOBBY",
                            created_at: now,
                        });
                    }

                    let handle = spawn_room(state, self.config.clone());
                    slot.insert(handle);

                    tracing::info!(room_code = %code, %host_name, max_participants, "room created");
                    return Ok(RoomCreated {
                        ws_path: format!("/ws/{code}"),
                        room_code: code,
                        host_name,
                        max_participants,
                        host_token,
                    });
                }
            }
        }
    }

    /// Resolve a (case-insensitive) room code to its actor handle.
    pub fn lookup(&self, raw_code: &str) -> Result<RoomHandle, RoomError> {
        let code = normalise_room_code(raw_code)?;
        self.rooms
            .get(&code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RoomError::not_found("room not found"))
    }

    /// Remove rooms whose game is terminal and whose last subscriber has
    /// disconnected. Returns how many were destroyed.
    pub async fn sweep_terminal_rooms(&self) -> usize {
        // Collect first: no registry lock is held across the awaits below.
        let handles: Vec<(String, RoomHandle)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut removed = 0;
        for (code, handle) in handles {
            let destroy = match handle.inspect().await {
                Ok(inspection) => {
                    inspection.status.is_terminal() && inspection.subscriber_count == 0
                }
                // Actor already gone; drop the stale handle.
                Err(_) => true,
            };
            if destroy {
                self.rooms.remove(&code);
                handle.shutdown().await;
                removed += 1;
                tracing::info!(room_code = %code, "destroyed terminal room");
            }
        }
        removed
    }

    /// Periodic sweep driven by `server.room_cleanup_interval`.
    pub async fn run_cleanup(self: Arc<Self>) {
        let interval = std::time::Duration::from_secs(self.config.server.room_cleanup_interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = self.sweep_terminal_rooms().await;
            if removed > 0 {
                tracing::debug!(removed, remaining = self.room_count(), "cleanup sweep");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let registry = registry();
        let created = registry.create_room("Qudus", 4).unwrap();
        assert_eq!(created.room_code.len(), 6);
        assert_eq!(created.ws_path, format!("/ws/{}", created.room_code));
        assert_eq!(created.host_name, "Qudus");

        let handle = registry.lookup(&created.room_code).unwrap();
        assert_eq!(handle.code(), created.room_code);

        // Codes are case-insensitive on lookup.
        let lower = created.room_code.to_lowercase();
        assert!(registry.lookup(&lower).is_ok());
    }

    #[tokio::test]
    async fn test_lookup_failures() {
        let registry = registry();
        let err = registry.lookup("NOPE22").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = registry.lookup("x").unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_create_validates_inputs() {
        let registry = registry();
        assert_eq!(
            registry.create_room("Q", 4).unwrap_err().kind,
            ErrorKind::BadRequest
        );
        assert_eq!(
            registry.create_room("Qudus", 0).unwrap_err().kind,
            ErrorKind::BadRequest
        );
        assert_eq!(
            registry.create_room("Qudus", 11).unwrap_err().kind,
            ErrorKind::BadRequest
        );
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_destroys_terminal_rooms_without_subscribers() {
        let registry = registry();
        let created = registry.create_room("Qudus", 4).unwrap();
        let handle = registry.lookup(&created.room_code).unwrap();

        // Live lobby: the sweep leaves it alone.
        assert_eq!(registry.sweep_terminal_rooms().await, 0);

        handle.cancel_game(created.host_token.clone()).await.unwrap();

        // Terminal but still watched: retained.
        let subscription = handle.subscribe().await.unwrap();
        assert_eq!(registry.sweep_terminal_rooms().await, 0);

        // Last subscriber gone: destroyed.
        handle.unsubscribe(subscription.id).await;
        assert_eq!(registry.sweep_terminal_rooms().await, 1);
        assert_eq!(registry.room_count(), 0);
        assert!(registry.lookup(&created.room_code).is_err());
    }
}
