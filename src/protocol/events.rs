//! Messages pushed to room subscribers.
//!
//! Every broadcast event carries the full post-transition snapshot so a
//! client can resync unconditionally; the event-specific fields are a
//! convenience on top.

use serde::{Deserialize, Serialize};

use super::snapshot::RoomSnapshot;
use super::types::{CompletedRound, EndReason, Participant, ParticipantId};

/// A push-stream message. The `type` discriminant is snake_case on the
/// wire; payload fields are camelCase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RoomEvent {
    /// First message on every new subscription.
    Connected,
    /// Subscriber count changed.
    Presence { count: usize },
    /// Second message on every new subscription: the current state.
    Snapshot { snapshot: RoomSnapshot },
    JoinRequest {
        participant: Participant,
        snapshot: RoomSnapshot,
    },
    AdmissionUpdate {
        participant: Participant,
        snapshot: RoomSnapshot,
    },
    GameStarted { snapshot: RoomSnapshot },
    TurnCalled { snapshot: RoomSnapshot },
    SubmissionReceived {
        participant_id: ParticipantId,
        snapshot: RoomSnapshot,
    },
    RoundEnded {
        reason: EndReason,
        completed_round: CompletedRound,
        snapshot: RoomSnapshot,
    },
    SubmissionScored {
        participant_id: ParticipantId,
        round_number: u32,
        snapshot: RoomSnapshot,
    },
    RoundScoresPublished {
        round_number: u32,
        snapshot: RoomSnapshot,
    },
    RoundScoresDiscarded {
        round_number: u32,
        snapshot: RoomSnapshot,
    },
    GameCancelled { snapshot: RoomSnapshot },
    GameEnded { snapshot: RoomSnapshot },
}

impl RoomEvent {
    /// Wire name of the discriminant, mostly for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Presence { .. } => "presence",
            Self::Snapshot { .. } => "snapshot",
            Self::JoinRequest { .. } => "join_request",
            Self::AdmissionUpdate { .. } => "admission_update",
            Self::GameStarted { .. } => "game_started",
            Self::TurnCalled { .. } => "turn_called",
            Self::SubmissionReceived { .. } => "submission_received",
            Self::RoundEnded { .. } => "round_ended",
            Self::SubmissionScored { .. } => "submission_scored",
            Self::RoundScoresPublished { .. } => "round_scores_published",
            Self::RoundScoresDiscarded { .. } => "round_scores_discarded",
            Self::GameCancelled { .. } => "game_cancelled",
            Self::GameEnded { .. } => "game_ended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminant_on_the_wire() {
        let json = serde_json::to_value(RoomEvent::Connected).unwrap();
        assert_eq!(json["type"], "connected");

        let json = serde_json::to_value(RoomEvent::Presence { count: 3 }).unwrap();
        assert_eq!(json["type"], "presence");
        assert_eq!(json["count"], 3);
    }
}
