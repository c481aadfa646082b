//! Token generation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Alphabet tokens are drawn from
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every generated token
pub const TOKEN_LENGTH: usize = 6;

/// Source of fresh candidate tokens
///
/// Uniqueness is enforced by the table, not by the source.
pub trait TokenSource: Send {
    /// Produce the next candidate token
    fn next_token(&mut self) -> String;
}

/// Random tokens of [`TOKEN_LENGTH`] characters from [`TOKEN_ALPHABET`]
pub struct RandomTokenSource {
    rng: StdRng,
}

impl RandomTokenSource {
    /// Reproducible source for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }
}

impl TokenSource for RandomTokenSource {
    fn next_token(&mut self) -> String {
        (0..TOKEN_LENGTH)
            .map(|_| TOKEN_ALPHABET[self.rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let mut source = RandomTokenSource::from_entropy();
        for _ in 0..100 {
            let token = source.next_token();
            assert_eq!(token.len(), TOKEN_LENGTH);
            assert!(token
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = RandomTokenSource::seeded(42);
        let mut b = RandomTokenSource::seeded(42);
        let first: Vec<_> = (0..5).map(|_| a.next_token()).collect();
        let second: Vec<_> = (0..5).map(|_| b.next_token()).collect();
        assert_eq!(first, second);
    }
}
