//! Game limit configuration.
//!
//! The defaults are the rules of the game; they are configurable mainly
//! so tests and private deployments can tighten them.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_max_answer_length, default_max_participant_name, default_max_participants_limit,
    default_max_round_seconds, default_min_participant_name, default_min_round_seconds,
    default_room_code_length,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GameLimitsConfig {
    /// Length of generated room codes
    #[serde(default = "default_room_code_length")]
    pub room_code_length: usize,
    /// Minimum participant name length after normalisation
    #[serde(default = "default_min_participant_name")]
    pub min_participant_name: usize,
    /// Maximum participant name length after normalisation
    #[serde(default = "default_max_participant_name")]
    pub max_participant_name: usize,
    /// Ceiling on a room's `maxParticipants`
    #[serde(default = "default_max_participants_limit")]
    pub max_participants_limit: u8,
    /// Lower bound for `roundSeconds`
    #[serde(default = "default_min_round_seconds")]
    pub min_round_seconds: u32,
    /// Upper bound for `roundSeconds`
    #[serde(default = "default_max_round_seconds")]
    pub max_round_seconds: u32,
    /// Answers are truncated to this many characters
    #[serde(default = "default_max_answer_length")]
    pub max_answer_length: usize,
}

impl Default for GameLimitsConfig {
    fn default() -> Self {
        Self {
            room_code_length: default_room_code_length(),
            min_participant_name: default_min_participant_name(),
            max_participant_name: default_max_participant_name(),
            max_participants_limit: default_max_participants_limit(),
            min_round_seconds: default_min_round_seconds(),
            max_round_seconds: default_max_round_seconds(),
            max_answer_length: default_max_answer_length(),
        }
    }
}
