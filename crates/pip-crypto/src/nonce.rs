//! Per-chunk nonce construction
//!
//! Nonce layout (96-bit):
//! ```text
//! [4 bytes: zero][8 bytes: chunk index, big-endian]
//! ```
//!
//! The full trailing 8 bytes carry the counter, so one file key can seal
//! 2^64 chunks before the nonce space runs out.

use crate::NONCE_SIZE;

/// Build the nonce for `chunk_index`. Injective in `chunk_index`.
pub fn chunk_nonce(chunk_index: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[4..].copy_from_slice(&chunk_index.to_be_bytes());
    nonce
}

/// Monotonic nonce source for one stream.
///
/// Starts at chunk index 0 and yields each index exactly once. The index is
/// private and cannot be rewound, so a sequence never repeats a nonce. Ends
/// (returns `None`) only after index `u64::MAX` has been handed out.
#[derive(Debug)]
pub(crate) struct NonceSequence {
    next: Option<u64>,
}

impl NonceSequence {
    pub(crate) fn new() -> Self {
        Self { next: Some(0) }
    }

    /// Number of nonces handed out so far (saturating at `u64::MAX`).
    pub(crate) fn issued(&self) -> u64 {
        self.next.unwrap_or(u64::MAX)
    }
}

impl Iterator for NonceSequence {
    type Item = [u8; NONCE_SIZE];

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        self.next = index.checked_add(1);
        Some(chunk_nonce(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nonce_zero() {
        assert_eq!(chunk_nonce(0), [0u8; NONCE_SIZE]);
    }

    #[test]
    fn test_nonce_layout() {
        let nonce = chunk_nonce(0x0102_0304_0506_0708);
        assert_eq!(&nonce[..4], &[0, 0, 0, 0], "leading 4 bytes stay zero");
        assert_eq!(&nonce[4..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_nonce_max_index() {
        let nonce = chunk_nonce(u64::MAX);
        assert_eq!(&nonce[..4], &[0, 0, 0, 0]);
        assert_eq!(&nonce[4..], &[0xFF; 8]);
    }

    #[test]
    fn test_sequence_starts_at_zero_and_increments() {
        let mut seq = NonceSequence::new();
        assert_eq!(seq.issued(), 0);
        assert_eq!(seq.next(), Some(chunk_nonce(0)));
        assert_eq!(seq.next(), Some(chunk_nonce(1)));
        assert_eq!(seq.next(), Some(chunk_nonce(2)));
        assert_eq!(seq.issued(), 3);
    }

    #[test]
    fn test_sequence_exhausts_after_max() {
        let mut seq = NonceSequence {
            next: Some(u64::MAX),
        };
        assert_eq!(seq.next(), Some(chunk_nonce(u64::MAX)));
        assert_eq!(seq.next(), None, "sequence must not wrap around");
        assert_eq!(seq.next(), None);
    }

    proptest! {
        #[test]
        fn nonce_is_injective(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            prop_assert_ne!(chunk_nonce(a), chunk_nonce(b));
        }

        #[test]
        fn nonce_roundtrips_index(index in any::<u64>()) {
            let nonce = chunk_nonce(index);
            let mut tail = [0u8; 8];
            tail.copy_from_slice(&nonce[4..]);
            prop_assert_eq!(u64::from_be_bytes(tail), index);
        }
    }
}
