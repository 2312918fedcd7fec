use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GameLimitsConfig;
use crate::error::RoomError;

/// Identifier of a participant within a room. The host is always the
/// literal `"host"`; everyone else gets a random 128-bit token.
pub type ParticipantId = String;

/// Reserved id of the room host.
pub const HOST_PARTICIPANT_ID: &str = "host";

/// The calling range: a called number maps onto a letter of `A..=Z`.
pub const MIN_CALLED_NUMBER: u8 = 1;
pub const MAX_CALLED_NUMBER: u8 = 26;

/// Letter for a called number: `1 -> 'A'` through `26 -> 'Z'`.
pub fn letter_for(called_number: u8) -> char {
    char::from(64 + called_number)
}

/// Admission state of a participant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Pending,
    Admitted,
    Rejected,
}

/// A member of the room, host included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub status: ParticipantStatus,
    pub is_host: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn is_admitted(&self) -> bool {
        self.status == ParticipantStatus::Admitted
    }
}

/// Game lifecycle. `Cancelled` and `Finished` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Lobby,
    InProgress,
    Cancelled,
    Finished,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Finished)
    }
}

/// How an open round may close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndRule {
    /// Only the deadline closes the round.
    #[default]
    Timer,
    /// The first submission closes the round; no deadline is armed.
    FirstSubmission,
    /// First submission or the deadline, whichever happens first.
    WhicheverFirst,
}

/// Who may end a round before its natural close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManualEndPolicy {
    /// The host or the participant whose turn it is.
    #[default]
    HostOrCaller,
    /// Only the participant whose turn it is.
    CallerOnly,
    /// The caller may end early; the timer still applies.
    CallerOrTimer,
    /// Nobody; the round runs to its natural close.
    None,
}

/// Score computation mode, fixed for the lifetime of a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// Ten points per correct field.
    #[default]
    #[serde(rename = "FIXED_10")]
    Fixed10,
    /// Ten points per field, split between identical correct answers.
    #[serde(rename = "SHARED_10")]
    Shared10,
}

/// Why a round closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    Timer,
    FirstSubmission,
    ManualEnd,
}

/// Per-game rules, immutable once the game starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub round_seconds: u32,
    pub end_rule: EndRule,
    pub manual_end_policy: ManualEndPolicy,
    pub scoring_mode: ScoringMode,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_seconds: 60,
            end_rule: EndRule::default(),
            manual_end_policy: ManualEndPolicy::default(),
            scoring_mode: ScoringMode::default(),
        }
    }
}

impl GameConfig {
    /// Range and consistency checks applied at game start.
    pub fn validate(&self, limits: &GameLimitsConfig) -> Result<(), RoomError> {
        if self.round_seconds < limits.min_round_seconds
            || self.round_seconds > limits.max_round_seconds
        {
            return Err(RoomError::bad_request(format!(
                "roundSeconds must be between {} and {}",
                limits.min_round_seconds, limits.max_round_seconds
            )));
        }
        if self.manual_end_policy == ManualEndPolicy::CallerOrTimer
            && self.end_rule == EndRule::FirstSubmission
        {
            return Err(RoomError::bad_request(
                "manualEndPolicy CALLER_OR_TIMER requires an endRule with a timer",
            ));
        }
        Ok(())
    }
}

/// Partial game config as accepted by `startGame`; omitted fields fall
/// back to the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfigInput {
    pub round_seconds: Option<u32>,
    pub end_rule: Option<EndRule>,
    pub manual_end_policy: Option<ManualEndPolicy>,
    pub scoring_mode: Option<ScoringMode>,
}

impl GameConfigInput {
    pub fn resolve(self) -> GameConfig {
        let defaults = GameConfig::default();
        GameConfig {
            round_seconds: self.round_seconds.unwrap_or(defaults.round_seconds),
            end_rule: self.end_rule.unwrap_or(defaults.end_rule),
            manual_end_policy: self.manual_end_policy.unwrap_or(defaults.manual_end_policy),
            scoring_mode: self.scoring_mode.unwrap_or(defaults.scoring_mode),
        }
    }
}

/// The five answer categories of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerField {
    Name,
    Animal,
    Place,
    Thing,
    Food,
}

/// All categories, in wire order.
pub const ANSWER_FIELDS: [AnswerField; 5] = [
    AnswerField::Name,
    AnswerField::Animal,
    AnswerField::Place,
    AnswerField::Thing,
    AnswerField::Food,
];

impl AnswerField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Animal => "animal",
            Self::Place => "place",
            Self::Thing => "thing",
            Self::Food => "food",
        }
    }
}

/// One complete set of answers; unanswered categories are empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerSet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub animal: String,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub thing: String,
    #[serde(default)]
    pub food: String,
}

impl AnswerSet {
    pub fn field(&self, field: AnswerField) -> &str {
        match field {
            AnswerField::Name => &self.name,
            AnswerField::Animal => &self.animal,
            AnswerField::Place => &self.place,
            AnswerField::Thing => &self.thing,
            AnswerField::Food => &self.food,
        }
    }

    pub fn set_field(&mut self, field: AnswerField, value: String) {
        match field {
            AnswerField::Name => self.name = value,
            AnswerField::Animal => self.animal = value,
            AnswerField::Place => self.place = value,
            AnswerField::Thing => self.thing = value,
            AnswerField::Food => self.food = value,
        }
    }
}

/// Partial answers, as sent by draft updates and submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnswerPatch {
    pub name: Option<String>,
    pub animal: Option<String>,
    pub place: Option<String>,
    pub thing: Option<String>,
    pub food: Option<String>,
}

impl AnswerPatch {
    pub fn field(&self, field: AnswerField) -> Option<&String> {
        match field {
            AnswerField::Name => self.name.as_ref(),
            AnswerField::Animal => self.animal.as_ref(),
            AnswerField::Place => self.place.as_ref(),
            AnswerField::Thing => self.thing.as_ref(),
            AnswerField::Food => self.food.as_ref(),
        }
    }
}

/// Host verdict per category. All five are required on input.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkSet {
    pub name: bool,
    pub animal: bool,
    pub place: bool,
    pub thing: bool,
    pub food: bool,
}

impl MarkSet {
    pub fn field(self, field: AnswerField) -> bool {
        match field {
            AnswerField::Name => self.name,
            AnswerField::Animal => self.animal,
            AnswerField::Place => self.place,
            AnswerField::Thing => self.thing,
            AnswerField::Food => self.food,
        }
    }
}

/// Points per category plus the round total, two-decimal precision.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldScores {
    pub name: f64,
    pub animal: f64,
    pub place: f64,
    pub thing: f64,
    pub food: f64,
    pub total: f64,
}

impl FieldScores {
    pub fn field(&self, field: AnswerField) -> f64 {
        match field {
            AnswerField::Name => self.name,
            AnswerField::Animal => self.animal,
            AnswerField::Place => self.place,
            AnswerField::Thing => self.thing,
            AnswerField::Food => self.food,
        }
    }

    pub fn set_field(&mut self, field: AnswerField, value: f64) {
        match field {
            AnswerField::Name => self.name = value,
            AnswerField::Animal => self.animal = value,
            AnswerField::Place => self.place = value,
            AnswerField::Thing => self.thing = value,
            AnswerField::Food => self.food = value,
        }
    }
}

/// Who marked a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reviewer {
    pub id: ParticipantId,
    pub name: String,
}

/// Host review of one submission. Re-settable until the round is
/// published or discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub marks: MarkSet,
    pub scores: FieldScores,
    pub marked_by: Reviewer,
    pub marked_at: DateTime<Utc>,
}

/// One participant's answers for a round, real or forced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub answers: AnswerSet,
    pub submitted_at: DateTime<Utc>,
    pub review: Option<Review>,
}

/// A closed round. Immutable once `score_published_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRound {
    pub round_number: u32,
    pub turn_participant_id: ParticipantId,
    pub turn_participant_name: String,
    pub called_number: u8,
    pub active_letter: char,
    pub started_at: DateTime<Utc>,
    pub countdown_ends_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub submissions: Vec<Submission>,
    pub ended_at: DateTime<Utc>,
    pub end_reason: EndReason,
    pub score_published_at: Option<DateTime<Utc>>,
}

impl CompletedRound {
    pub fn is_published(&self) -> bool {
        self.score_published_at.is_some()
    }

    pub fn submission(&self, participant_id: &str) -> Option<&Submission> {
        self.submissions
            .iter()
            .find(|s| s.participant_id == participant_id)
    }

    pub fn is_fully_reviewed(&self) -> bool {
        !self.submissions.is_empty() && self.submissions.iter().all(|s| s.review.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_mapping() {
        assert_eq!(letter_for(1), 'A');
        assert_eq!(letter_for(3), 'C');
        assert_eq!(letter_for(26), 'Z');
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&GameStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::to_string(&EndRule::WhicheverFirst).unwrap(),
            "\"WHICHEVER_FIRST\""
        );
        assert_eq!(
            serde_json::to_string(&ManualEndPolicy::None).unwrap(),
            "\"NONE\""
        );
        assert_eq!(
            serde_json::to_string(&ScoringMode::Fixed10).unwrap(),
            "\"FIXED_10\""
        );
        assert_eq!(
            serde_json::to_string(&ScoringMode::Shared10).unwrap(),
            "\"SHARED_10\""
        );
        assert_eq!(
            serde_json::to_string(&EndReason::ManualEnd).unwrap(),
            "\"MANUAL_END\""
        );
    }

    #[test]
    fn test_config_input_resolution() {
        let input = GameConfigInput {
            round_seconds: Some(15),
            end_rule: Some(EndRule::WhicheverFirst),
            ..Default::default()
        };
        let config = input.resolve();
        assert_eq!(config.round_seconds, 15);
        assert_eq!(config.end_rule, EndRule::WhicheverFirst);
        assert_eq!(config.manual_end_policy, ManualEndPolicy::HostOrCaller);
        assert_eq!(config.scoring_mode, ScoringMode::Fixed10);
    }

    #[test]
    fn test_config_validation() {
        let limits = GameLimitsConfig::default();
        let mut config = GameConfig::default();
        assert!(config.validate(&limits).is_ok());

        config.round_seconds = 4;
        assert!(config.validate(&limits).is_err());
        config.round_seconds = 121;
        assert!(config.validate(&limits).is_err());
        config.round_seconds = 5;
        assert!(config.validate(&limits).is_ok());
        config.round_seconds = 120;
        assert!(config.validate(&limits).is_ok());

        config.manual_end_policy = ManualEndPolicy::CallerOrTimer;
        config.end_rule = EndRule::FirstSubmission;
        assert!(config.validate(&limits).is_err());
        config.end_rule = EndRule::WhicheverFirst;
        assert!(config.validate(&limits).is_ok());
    }

    #[test]
    fn test_answer_patch_fields() {
        let patch = AnswerPatch {
            animal: Some("Cat".to_string()),
            ..Default::default()
        };
        assert_eq!(patch.field(AnswerField::Animal), Some(&"Cat".to_string()));
        assert_eq!(patch.field(AnswerField::Name), None);
    }
}
