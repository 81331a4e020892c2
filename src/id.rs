//! Candidate identifier generation.
//!
//! Identifiers are short alphanumeric strings sampled uniformly from a
//! 62-symbol alphabet. Nothing is remembered between calls: the id space is
//! large enough (62^5 and 62^7) that repeats are accepted as noise.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::config::ConfigError;

/// Symbols an identifier may contain.
pub const ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

/// Length of short-form identifiers.
pub const SHORT_ID_LEN: usize = 5;

/// Length of long-form identifiers.
pub const LONG_ID_LEN: usize = 7;

/// Which identifier lengths to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdFormat {
    /// Five characters only.
    Id5,
    /// Seven characters only.
    Id7,
    /// Five or seven characters, chosen per call with equal probability.
    #[default]
    Both,
}

impl FromStr for IdFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id5" => Ok(Self::Id5),
            "id7" => Ok(Self::Id7),
            "both" => Ok(Self::Both),
            _ => Err(ConfigError::InvalidIdFormat {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for IdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id5 => "id5",
            Self::Id7 => "id7",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

/// Produces one random candidate identifier per call.
///
/// The generator is `Copy` and carries only its [`IdFormat`]; each worker can
/// hold its own copy without coordination.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator {
    format: IdFormat,
}

impl IdGenerator {
    /// Creates a generator for the given format.
    #[must_use]
    pub fn new(format: IdFormat) -> Self {
        Self { format }
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> IdFormat {
        self.format
    }

    /// Generates an identifier from the thread-local RNG.
    #[must_use]
    pub fn next_id(&self) -> String {
        self.next_id_with(&mut rand::thread_rng())
    }

    /// Generates an identifier from a caller-supplied RNG.
    pub fn next_id_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let len = match self.format {
            IdFormat::Id5 => SHORT_ID_LEN,
            IdFormat::Id7 => LONG_ID_LEN,
            IdFormat::Both => {
                if rng.gen_bool(0.5) {
                    SHORT_ID_LEN
                } else {
                    LONG_ID_LEN
                }
            }
        };
        sample_id(rng, len)
    }
}

fn sample_id<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn is_alphabet_only(id: &str) -> bool {
        id.bytes().all(|b| ALPHABET.contains(&b))
    }

    #[test]
    fn test_alphabet_has_62_unique_symbols() {
        let mut symbols = ALPHABET.to_vec();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), 62);
        assert!(symbols.iter().all(u8::is_ascii_alphanumeric));
    }

    #[test]
    fn test_id5_format_always_five_chars() {
        let generator = IdGenerator::new(IdFormat::Id5);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            let id = generator.next_id_with(&mut rng);
            assert_eq!(id.len(), 5, "unexpected length for {id}");
            assert!(is_alphabet_only(&id), "unexpected symbol in {id}");
        }
    }

    #[test]
    fn test_id7_format_always_seven_chars() {
        let generator = IdGenerator::new(IdFormat::Id7);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let id = generator.next_id_with(&mut rng);
            assert_eq!(id.len(), 7, "unexpected length for {id}");
            assert!(is_alphabet_only(&id), "unexpected symbol in {id}");
        }
    }

    #[test]
    fn test_both_format_splits_roughly_evenly() {
        let generator = IdGenerator::new(IdFormat::Both);
        let mut rng = StdRng::seed_from_u64(42);
        let samples = 20_000;
        let mut short = 0usize;
        for _ in 0..samples {
            let id = generator.next_id_with(&mut rng);
            assert!(is_alphabet_only(&id));
            match id.len() {
                SHORT_ID_LEN => short += 1,
                LONG_ID_LEN => {}
                other => panic!("unexpected length {other}"),
            }
        }
        // 20k fair coin flips: 3% tolerance is far outside 5 sigma.
        let ratio = short as f64 / f64::from(samples);
        assert!((0.47..=0.53).contains(&ratio), "short ratio was {ratio}");
    }

    #[test]
    fn test_thread_rng_entry_point_respects_format() {
        let id = IdGenerator::new(IdFormat::Id7).next_id();
        assert_eq!(id.len(), LONG_ID_LEN);
        assert!(is_alphabet_only(&id));
    }

    #[test]
    fn test_every_symbol_is_reachable() {
        let generator = IdGenerator::new(IdFormat::Id7);
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = [false; 256];
        for _ in 0..2000 {
            for b in generator.next_id_with(&mut rng).bytes() {
                seen[usize::from(b)] = true;
            }
        }
        assert!(ALPHABET.iter().all(|b| seen[usize::from(*b)]));
    }

    #[test]
    fn test_id_format_parses_case_insensitively() {
        assert_eq!("id5".parse::<IdFormat>().unwrap(), IdFormat::Id5);
        assert_eq!("ID7".parse::<IdFormat>().unwrap(), IdFormat::Id7);
        assert_eq!(" Both ".parse::<IdFormat>().unwrap(), IdFormat::Both);
    }

    #[test]
    fn test_id_format_rejects_unknown_value() {
        let err = "id6".parse::<IdFormat>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIdFormat { ref value } if value == "id6"));
        assert!(err.to_string().contains("id6"));
    }

    #[test]
    fn test_id_format_display_round_trips_names() {
        assert_eq!(IdFormat::Id5.to_string(), "id5");
        assert_eq!(IdFormat::default().to_string(), "both");
    }
}
