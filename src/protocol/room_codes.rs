use rand::RngExt;
use uuid::Uuid;

use crate::protocol::types::ParticipantId;

/// Room code alphabet: uppercase letters and digits minus the confusable
/// characters (0, O, I, 1) for easy verbal sharing.
const CLEAN_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a room code of the requested length from the clean alphabet.
pub fn generate_room_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CLEAN_CHARS.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            let ch = CLEAN_CHARS[idx] as char;
            ch
        })
        .collect()
}

/// Generate the opaque bearer secret that authenticates host commands.
/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_host_token() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    for byte in &mut bytes {
        *byte = rng.random_range(0..=u8::MAX);
    }
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a participant id: a random 128-bit token.
pub fn generate_participant_id() -> ParticipantId {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_shape() {
        for _ in 0..64 {
            let code = generate_room_code(6);
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| CLEAN_CHARS.contains(&b)));
            assert!(!code.contains('0'));
            assert!(!code.contains('O'));
            assert!(!code.contains('I'));
            assert!(!code.contains('1'));
        }
    }

    #[test]
    fn test_host_tokens_are_unique_and_opaque() {
        let a = generate_host_token();
        let b = generate_host_token();
        assert_ne!(a, b);
        // 32 bytes of entropy encode to 43 base64 characters.
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_participant_id_is_uuid() {
        let id = generate_participant_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
