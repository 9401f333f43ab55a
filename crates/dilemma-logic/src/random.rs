//! Pseudo-random number generator for strategy decisions
//!
//! xorshift64* state owned by a single caller. Tournaments seed it from a
//! 32-byte seed for reproducible runs; live decisions seed it from entropy.
//! No generator is ever shared between sessions.

/// Seeded random number generator
///
/// Deterministic: same seed + index = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and match index
    pub fn new(seed: &[u8; 32], match_index: u32) -> Self {
        // Combine seed bytes into initial state
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }

        // Mix in match index
        state ^= (match_index as u64).wrapping_mul(0x517cc1b727220a95);

        Self::warmed(state)
    }

    /// Create a non-reproducible RNG seeded from the thread-local entropy source
    pub fn from_entropy() -> Self {
        Self::warmed(rand::random::<u64>())
    }

    fn warmed(state: u64) -> Self {
        // xorshift never leaves the all-zero state
        let mut rng = Self { state: state | 1 };
        for _ in 0..8 {
            rng.next_u64();
        }
        rng
    }

    /// Create RNG for a specific decision within a match
    pub fn for_round(&self, round: u32) -> Self {
        let mut new_state = self.state;
        new_state ^= (round as u64).wrapping_mul(0x9e3779b97f4a7c15);

        let mut rng = Self { state: new_state | 1 };
        rng.next_u64(); // Mix
        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Generate next u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a value 0-99 (for percentage checks)
    pub fn next_percent(&mut self) -> u8 {
        (self.next_u32() % 100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let seed = [42u8; 32];
        let mut r1 = SeededRng::new(&seed, 0);
        let mut r2 = SeededRng::new(&seed, 0);

        for _ in 0..100 {
            assert_eq!(r1.next_u64(), r2.next_u64());
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = SeededRng::new(&[1u8; 32], 0);
        let mut rng2 = SeededRng::new(&[2u8; 32], 0);

        let vals1: Vec<_> = (0..10).map(|_| rng1.next_u64()).collect();
        let vals2: Vec<_> = (0..10).map(|_| rng2.next_u64()).collect();

        assert_ne!(vals1, vals2);
    }

    #[test]
    fn test_different_match_index() {
        let seed = [42u8; 32];

        let mut rng1 = SeededRng::new(&seed, 0);
        let mut rng2 = SeededRng::new(&seed, 1);

        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_zero_seed_still_produces_values() {
        let mut rng = SeededRng::new(&[0u8; 32], 0);
        let vals: Vec<_> = (0..10).map(|_| rng.next_u64()).collect();
        assert!(vals.iter().any(|v| *v != 0));
    }

    #[test]
    fn test_percent_range() {
        let mut rng = SeededRng::from_entropy();

        for _ in 0..1000 {
            assert!(rng.next_percent() < 100);
        }
    }

    #[test]
    fn test_for_round_is_stable() {
        let base = SeededRng::new(&[7u8; 32], 3);
        let mut a = base.for_round(5);
        let mut b = base.for_round(5);
        assert_eq!(a.next_u64(), b.next_u64());
    }
}
