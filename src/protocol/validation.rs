//! Input normalisation and validation.
//!
//! The same normalisation routine backs draft updates, submissions, and
//! SHARED_10 key building so scoring always compares like with like.

use crate::config::GameLimitsConfig;
use crate::error::RoomError;

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise a free-text answer: trim, collapse whitespace, truncate to
/// the configured length. Truncation can land on a space, so trim again.
pub fn normalise_answer(raw: &str, limits: &GameLimitsConfig) -> String {
    let collapsed = collapse_whitespace(raw);
    if collapsed.chars().count() > limits.max_answer_length {
        let truncated: String = collapsed.chars().take(limits.max_answer_length).collect();
        truncated.trim_end().to_string()
    } else {
        collapsed
    }
}

/// Key used to group identical answers when splitting SHARED_10 points.
pub fn shared_answer_key(raw: &str, limits: &GameLimitsConfig) -> String {
    normalise_answer(raw, limits).to_lowercase()
}

/// Normalise and validate a participant name. Returns the normalised name.
pub fn validate_participant_name(
    raw: &str,
    limits: &GameLimitsConfig,
) -> Result<String, RoomError> {
    let name = collapse_whitespace(raw);
    let len = name.chars().count();
    if len < limits.min_participant_name || len > limits.max_participant_name {
        return Err(RoomError::bad_request(format!(
            "name must be between {} and {} characters",
            limits.min_participant_name, limits.max_participant_name
        )));
    }
    Ok(name)
}

/// Validate the room capacity requested at creation.
pub fn validate_max_participants(
    max_participants: u8,
    limits: &GameLimitsConfig,
) -> Result<(), RoomError> {
    if max_participants < 1 {
        return Err(RoomError::bad_request(
            "maxParticipants must be at least 1",
        ));
    }
    if max_participants > limits.max_participants_limit {
        return Err(RoomError::bad_request(format!(
            "maxParticipants cannot exceed {}",
            limits.max_participants_limit
        )));
    }
    Ok(())
}

/// Normalise a room code to upper case and check its shape
/// (`^[A-Z0-9]{4,10}$`). Returns the normalised code.
pub fn normalise_room_code(raw: &str) -> Result<String, RoomError> {
    let code = raw.trim().to_ascii_uppercase();
    let len = code.chars().count();
    if !(4..=10).contains(&len) || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RoomError::bad_request("malformed room code"));
    }
    Ok(code)
}

/// Case-insensitive name equality after normalisation.
pub fn names_collide(a: &str, b: &str) -> bool {
    collapse_whitespace(a).to_lowercase() == collapse_whitespace(b).to_lowercase()
}
