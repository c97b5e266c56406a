//! Condensing a finished pool into seed entropy.

use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::accumulator::EntropyPool;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 of a complete entropy pool.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// The first `len` bytes, capped at [`DIGEST_LEN`].
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.0[..len.min(DIGEST_LEN)]
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl PartialEq for Digest {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Digest {}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Digest([REDACTED])")
    }
}

/// Hash the whole pool. Output is always [`DIGEST_LEN`] bytes.
pub fn condense(pool: &EntropyPool) -> Digest {
    let hash = Sha256::digest(pool.as_bytes());
    let mut bytes = [0u8; DIGEST_LEN];
    bytes.copy_from_slice(&hash);
    Digest(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::SAMPLE_LEN;

    #[test]
    fn test_condense_is_pure() {
        let mut pool = EntropyPool::new();
        pool.fold(&[7u8; SAMPLE_LEN]);
        assert_eq!(condense(&pool), condense(&pool));
    }

    #[test]
    fn test_condense_matches_sha256_of_pool() {
        let mut pool = EntropyPool::new();
        pool.fold(&[0x11u8; SAMPLE_LEN]);
        let expected = Sha256::digest(pool.as_bytes());
        assert_eq!(condense(&pool).as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_single_bit_changes_digest() {
        let a = EntropyPool::new();
        let mut b = EntropyPool::new();
        let mut sample = [0u8; SAMPLE_LEN];
        sample[15] = 1;
        b.fold(&sample);
        assert_ne!(condense(&a), condense(&b));
    }

    #[test]
    fn test_prefix_caps_at_digest_len() {
        let digest = Digest::from([3u8; DIGEST_LEN]);
        assert_eq!(digest.prefix(16).len(), 16);
        assert_eq!(digest.prefix(64).len(), DIGEST_LEN);
    }

    #[test]
    fn test_debug_is_redacted() {
        let digest = Digest::from([0xAB; DIGEST_LEN]);
        assert_eq!(format!("{:?}", digest), "Digest([REDACTED])");
    }
}
