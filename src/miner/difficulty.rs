//! Difficulty to target conversion and share checking
//!
//! A scalar difficulty maps to a 256-bit big-endian target as
//! `MAX_TARGET / floor(difficulty)`. Candidate hashes come out of the hash
//! function little-endian, so [`meets`] byte-reverses them before comparing.
//!
//! The pool share check and the solo block check are the same comparison
//! with two different difficulties.

use hex_literal::hex;
use ruint::aliases::U256;
use serde::Serialize;

/// The difficulty-1 target
pub const MAX_TARGET: [u8; 32] =
    hex!("00000000ffff0000000000000000000000000000000000000000000000000000");

/// Convert a scalar difficulty into a 256-bit big-endian target
///
/// The difficulty is floored before dividing; values below 1 are treated
/// as 1 (configuration validation rejects them upstream).
pub fn to_target(difficulty: f64) -> [u8; 32] {
    let divisor = if difficulty.is_finite() && difficulty >= 1.0 {
        difficulty.floor().min(u64::MAX as f64) as u64
    } else {
        1
    };
    let max = U256::from_be_bytes(MAX_TARGET);
    (max / U256::from(divisor)).to_be_bytes::<32>()
}

/// Check whether a hash qualifies against a target
///
/// Returns true iff the byte-reversed hash, read as an unsigned big-endian
/// integer, is less than or equal to `target`.
#[inline]
pub fn meets(hash: &[u8; 32], target: &[u8; 32]) -> bool {
    for i in 0..32 {
        let h = hash[31 - i];
        if h < target[i] {
            return true;
        }
        if h > target[i] {
            return false;
        }
    }
    true
}

/// Current difficulty and its derived target
///
/// Written by the work source, read by every worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyContext {
    /// Scalar difficulty (at least 1)
    pub difficulty: f64,
    /// Derived 256-bit big-endian target
    #[serde(skip)]
    pub target: [u8; 32],
}

impl DifficultyContext {
    /// Builds a context from a scalar difficulty, clamping it to at least 1
    pub fn new(difficulty: f64) -> Self {
        let difficulty = if difficulty.is_finite() && difficulty >= 1.0 {
            difficulty
        } else {
            1.0
        };
        DifficultyContext {
            difficulty,
            target: to_target(difficulty),
        }
    }

    /// Builds a context around an explicit target
    ///
    /// Used when the threshold is not expressible as a difficulty ≥ 1,
    /// e.g. benchmarks that accept every hash.
    pub fn with_target(target: [u8; 32]) -> Self {
        DifficultyContext {
            difficulty: 0.0,
            target,
        }
    }

    /// Whether `hash` qualifies under this context
    #[inline]
    pub fn accepts(&self, hash: &[u8; 32]) -> bool {
        meets(hash, &self.target)
    }
}

impl Default for DifficultyContext {
    fn default() -> Self {
        DifficultyContext::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reversed(mut bytes: [u8; 32]) -> [u8; 32] {
        bytes.reverse();
        bytes
    }

    #[test]
    fn test_difficulty_one_is_max_target() {
        assert_eq!(to_target(1.0), MAX_TARGET);
        assert_eq!(to_target(1.9), MAX_TARGET);
        assert_eq!(to_target(0.25), MAX_TARGET);
    }

    #[test]
    fn test_target_halves_with_difficulty_two() {
        let target = to_target(2.0);
        assert_eq!(
            target,
            hex!("000000007fff8000000000000000000000000000000000000000000000000000")
        );
    }

    #[test]
    fn test_large_difficulty_divides_exactly() {
        let target = to_target(65536.0);
        assert_eq!(
            target,
            hex!("000000000000ffff000000000000000000000000000000000000000000000000")
        );
    }

    #[test]
    fn test_meets_compares_reversed_hash() {
        let target = to_target(1.0);

        // Equal to the target qualifies
        assert!(meets(&reversed(target), &target));

        // One above the target does not
        let mut above = target;
        above[31] = 1;
        assert!(!meets(&reversed(above), &target));

        // Leading zeros must be at the end of the raw hash
        let mut raw = [0u8; 32];
        raw[0] = 0xff;
        assert!(meets(&raw, &target));
        assert!(!meets(&reversed(raw), &target));
    }

    #[test]
    fn test_meets_matches_big_endian_ordering() {
        let targets = [to_target(1.0), to_target(3.0), to_target(1_000_000.0)];
        let hashes = [[0u8; 32], [0xffu8; 32], reversed(to_target(3.0)), {
            let mut h = [0u8; 32];
            h[27] = 0x01;
            h
        }];

        for target in &targets {
            for hash in &hashes {
                let be = reversed(*hash);
                let expected = be.as_slice() <= target.as_slice();
                assert_eq!(meets(hash, target), expected);
            }
        }
    }

    #[test]
    fn test_context_clamps_difficulty() {
        let ctx = DifficultyContext::new(0.001);
        assert_eq!(ctx.difficulty, 1.0);
        assert_eq!(ctx.target, MAX_TARGET);
        assert!(DifficultyContext::with_target([0xff; 32]).accepts(&[0xff; 32]));
    }
}
