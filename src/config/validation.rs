//! Configuration validation.

use super::Config;

/// Sanity-check a loaded configuration. Returns every problem found,
/// newline separated, so operators can fix them in one pass.
pub fn validate(config: &Config) -> Result<(), String> {
    let mut problems: Vec<String> = Vec::new();

    if config.port == 0 {
        problems.push("port must be non-zero".to_string());
    }
    if config.server.room_cleanup_interval == 0 {
        problems.push("server.room_cleanup_interval must be non-zero".to_string());
    }
    if config.server.subscriber_buffer < 2 {
        problems.push("server.subscriber_buffer must be at least 2".to_string());
    }

    let game = &config.game;
    if game.room_code_length < 4 || game.room_code_length > 10 {
        problems.push("game.room_code_length must be between 4 and 10".to_string());
    }
    if game.min_participant_name < 1 {
        problems.push("game.min_participant_name must be at least 1".to_string());
    }
    if game.min_participant_name >= game.max_participant_name {
        problems.push(
            "game.min_participant_name must be below game.max_participant_name".to_string(),
        );
    }
    if game.max_participants_limit < 1 {
        problems.push("game.max_participants_limit must be at least 1".to_string());
    }
    if game.min_round_seconds < 1 {
        problems.push("game.min_round_seconds must be at least 1".to_string());
    }
    if game.min_round_seconds >= game.max_round_seconds {
        problems.push("game.min_round_seconds must be below game.max_round_seconds".to_string());
    }
    if game.max_answer_length < 1 {
        problems.push("game.max_answer_length must be at least 1".to_string());
    }

    if !matches!(config.logging.rotation.as_str(), "daily" | "hourly" | "never") {
        problems.push("logging.rotation must be one of daily, hourly, never".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let mut config = Config::default();
        config.port = 0;
        config.server.room_cleanup_interval = 0;
        config.game.min_round_seconds = 200;
        let err = validate(&config).unwrap_err();
        assert!(err.contains("port"));
        assert!(err.contains("room_cleanup_interval"));
        assert!(err.contains("min_round_seconds"));
    }

    #[test]
    fn test_rotation_values() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(validate(&config).is_err());
        for ok in ["daily", "hourly", "never"] {
            config.logging.rotation = ok.to_string();
            assert!(validate(&config).is_ok());
        }
    }
}
