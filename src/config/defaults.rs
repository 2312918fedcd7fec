//! Default value functions referenced by the serde derives.

pub fn default_port() -> u16 {
    3640
}

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub fn default_room_cleanup_interval() -> u64 {
    60
}

pub fn default_subscriber_buffer() -> usize {
    32
}

pub fn default_room_code_length() -> usize {
    6
}

pub fn default_min_participant_name() -> usize {
    2
}

pub fn default_max_participant_name() -> usize {
    24
}

pub fn default_max_participants_limit() -> u8 {
    10
}

pub fn default_min_round_seconds() -> u32 {
    5
}

pub fn default_max_round_seconds() -> u32 {
    120
}

pub fn default_max_answer_length() -> usize {
    48
}

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_log_rotation() -> String {
    "daily".to_string()
}
