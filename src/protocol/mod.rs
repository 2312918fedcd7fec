// Protocol module: wire types, push events, snapshots, ids, validation

pub mod events;
pub mod room_codes;
pub mod snapshot;
pub mod types;
pub mod validation;

// Re-export the common vocabulary so callers can `use crate::protocol::*`.

pub use events::RoomEvent;

pub use snapshot::{
    ActiveRoundView, GameSnapshot, LeaderboardEntry, ParticipantCounts, RoomMeta, RoomSnapshot,
    RoundHistoryEntry, ScoringSummary, SubmissionStub,
};

pub use types::{
    letter_for, AnswerField, AnswerPatch, AnswerSet, CompletedRound, EndReason, EndRule,
    FieldScores, GameConfig, GameConfigInput, GameStatus, ManualEndPolicy, MarkSet, Participant,
    ParticipantId, ParticipantStatus, Review, Reviewer, ScoringMode, Submission, ANSWER_FIELDS,
    HOST_PARTICIPANT_ID, MAX_CALLED_NUMBER, MIN_CALLED_NUMBER,
};
