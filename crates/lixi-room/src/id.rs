//! Identifier and timestamp generation.
//!
//! Room codes are short and human-enterable; uniqueness is the registry's
//! job (it retries against the live map). Entity ids are long enough that
//! collisions are not a practical concern.

use std::time::{SystemTime, UNIX_EPOCH};

use lixi_protocol::RoomCode;
use rand::{Rng, distr::Alphanumeric};

/// Length of generated entity ids. 21 alphanumeric characters gives well
/// over 120 bits of entropy, enough to use as a map key without checks.
const ENTITY_ID_LEN: usize = 21;

/// Produces a fresh 6-digit room code, uniformly distributed over
/// 100000..=999999. Not guaranteed unique — callers must check against
/// the live registry.
pub fn new_room_code() -> RoomCode {
    let n: u32 = rand::rng().random_range(100_000..=999_999);
    RoomCode::normalized(&n.to_string())
}

/// Produces a collision-resistant opaque id for players and prizes.
pub fn new_entity_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(ENTITY_ID_LEN)
        .map(char::from)
        .collect()
}

/// Current wall-clock time as epoch milliseconds, the timestamp format
/// every receipt and winner record carries on the wire.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_room_code_is_six_digits() {
        for _ in 0..100 {
            let code = new_room_code();
            assert_eq!(code.as_str().len(), 6);
            let n: u32 = code.as_str().parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn test_new_entity_id_shape() {
        let id = new_entity_id();
        assert_eq!(id.len(), ENTITY_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_new_entity_ids_do_not_repeat() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(new_entity_id()));
        }
    }

    #[test]
    fn test_now_ms_is_recent() {
        // Sanity bound: after 2020-01-01, before 2100.
        let t = now_ms();
        assert!(t > 1_577_836_800_000);
        assert!(t < 4_102_444_800_000);
    }
}
