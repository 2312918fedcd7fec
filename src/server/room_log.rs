//! Optional append-only room log.
//!
//! One JSON line per created room. Strictly best effort: an IO failure is
//! logged and never fails the create.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomLogEntry {
    pub code: String,
    pub host_name: String,
    pub max_participants: u8,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RoomLog {
    path: PathBuf,
}

impl RoomLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, entry: &RoomLogEntry) {
        if let Err(err) = self.try_append(entry) {
            tracing::warn!(
                path = %self.path.display(),
                room_code = %entry.code,
                error = %err,
                "failed to append to room log"
            );
        }
    }

    fn try_append(&self, entry: &RoomLogEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}
