//! The client-visible projection of a room.
//!
//! Everything here crosses the wire verbatim; the host token and
//! participant drafts are structurally absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{
    CompletedRound, GameConfig, GameStatus, Participant, ParticipantId,
};

/// Immutable room facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomMeta {
    pub room_code: String,
    pub host_name: String,
    pub max_participants: u8,
}

/// Participant tallies per admission status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantCounts {
    pub admitted: usize,
    pub pending: usize,
    pub rejected: usize,
}

/// The active round as shown to clients: submission answers stay hidden
/// until the round completes, and drafts are never shown at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRoundView {
    pub round_number: u32,
    pub turn_participant_id: ParticipantId,
    pub turn_participant_name: String,
    pub called_number: u8,
    pub active_letter: char,
    pub started_at: DateTime<Utc>,
    pub countdown_ends_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub submissions: Vec<SubmissionStub>,
}

/// Who has already submitted in the active round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStub {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub submitted_at: DateTime<Utc>,
}

/// One leaderboard row per published round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundHistoryEntry {
    pub round_number: u32,
    pub called_number: u8,
    pub active_letter: char,
    pub score: f64,
    pub cumulative_score: f64,
    pub reviewed: bool,
}

/// A participant's standing across all published rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub total_score: f64,
    pub history: Vec<RoundHistoryEntry>,
}

/// Aggregate scoring facts plus the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSummary {
    pub rounds_per_player: u32,
    pub max_rounds: u32,
    pub rounds_played: u32,
    pub published_rounds: u32,
    pub pending_publication_rounds: Vec<u32>,
    pub used_numbers: Vec<u8>,
    pub available_numbers: Vec<u8>,
    pub is_complete: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Game-level projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config: GameConfig,
    pub turn_order: Vec<ParticipantId>,
    pub current_turn_index: usize,
    pub current_turn_participant_id: Option<ParticipantId>,
    pub active_round: Option<ActiveRoundView>,
    pub completed_rounds: Vec<CompletedRound>,
    pub scoring: ScoringSummary,
}

/// The canonical client-facing view of a room at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub meta: RoomMeta,
    pub participants: Vec<Participant>,
    pub counts: ParticipantCounts,
    pub game: GameSnapshot,
}
