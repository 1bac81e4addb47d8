//! Hashing: FNV-1a for stable fingerprint folding, SHA-256 for content addressing.
//!
//! Fingerprint bits must be identical across platforms and runs, so the hash
//! that folds canonical codes into bit positions is pinned here: FNV-1a-64
//! applied to the little-endian byte encoding of each `u64` in the sequence.

use sha2::{Digest, Sha256};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// The FNV-1a-64 offset basis.
#[inline]
pub fn fnv1a_init() -> u64 {
    FNV_OFFSET
}

/// Fold one `u64` value (as little-endian bytes) into an FNV-1a-64 state.
#[inline]
pub fn fnv1a_update(hash: u64, value: u64) -> u64 {
    let mut h = hash;
    for &b in &value.to_le_bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Hash a sequence of `u64` values with FNV-1a-64.
///
/// This is the fingerprint fold hash: archives produced with it are portable
/// across implementations and platforms.
pub fn fnv1a_words(values: &[u64]) -> u64 {
    let mut h = fnv1a_init();
    for &v in values {
        h = fnv1a_update(h, v);
    }
    h
}

/// Calculate the SHA-256 hash of in-memory data as a hex string.
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_deterministic() {
        let code = [1u64, 2, 3, 0xdeadbeef];
        assert_eq!(fnv1a_words(&code), fnv1a_words(&code));
    }

    #[test]
    fn fnv_order_sensitive() {
        assert_ne!(fnv1a_words(&[1, 2]), fnv1a_words(&[2, 1]));
    }

    #[test]
    fn fnv_empty_is_offset_basis() {
        assert_eq!(fnv1a_words(&[]), FNV_OFFSET);
    }

    #[test]
    fn fnv_distinguishes_nearby_codes() {
        assert_ne!(fnv1a_words(&[7]), fnv1a_words(&[8]));
        assert_ne!(fnv1a_words(&[7]), fnv1a_words(&[7, 0]));
    }

    #[test]
    fn test_sha256() {
        let hash = sha256(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
