//! Opaque id generation for component instances and handler tokens.
//!
//! Ids are blake3 digests of a per-generator nonce and a counter, hex-encoded
//! and truncated. The nonce comes from the OS random source, so ids a client
//! sees don't let it derive anyone else's.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hex characters kept from each digest.
const ID_LEN: usize = 16;

/// Generator of opaque, unique hex ids.
#[derive(Debug)]
pub struct IdGen {
    nonce: [u8; 16],
    counter: AtomicU64,
}

impl IdGen {
    /// Create a generator with a random nonce.
    pub fn new() -> Self {
        let mut nonce = [0u8; 16];
        if let Err(e) = getrandom::fill(&mut nonce) {
            crate::log!("error"; "random source unavailable ({}), seeding ids from the clock", e);
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            nonce = blake3::hash(&nanos.to_le_bytes()).as_bytes()[..16]
                .try_into()
                .unwrap_or(nonce);
        }
        Self::with_seed(nonce)
    }

    /// Create a generator from an explicit seed (deterministic ids).
    pub fn with_seed(nonce: [u8; 16]) -> Self {
        Self {
            nonce,
            counter: AtomicU64::new(0),
        }
    }

    /// Produce the next id.
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.nonce);
        hasher.update(&n.to_le_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest.as_bytes()[..ID_LEN / 2])
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_ids_are_unique_hex() {
        let ids = IdGen::new();
        let seen: FxHashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 1000);
        assert!(seen.iter().all(|id| id.len() == ID_LEN));
        assert!(
            seen.iter()
                .all(|id| id.chars().all(|c| c.is_ascii_hexdigit()))
        );
    }

    #[test]
    fn test_seeded_generators_are_deterministic() {
        let a = IdGen::with_seed([7; 16]);
        let b = IdGen::with_seed([7; 16]);
        assert_eq!(a.next_id(), b.next_id());
        assert_ne!(a.next_id(), IdGen::with_seed([8; 16]).next_id());
    }

    #[test]
    fn test_unseeded_generators_differ() {
        let first: Vec<String> = (0..4).map(|_| IdGen::new().next_id()).collect();
        let seen: FxHashSet<&String> = first.iter().collect();
        assert_eq!(seen.len(), first.len());
    }
}
