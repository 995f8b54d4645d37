//! Share difficulty values as reported by Bitaxe firmware.
//!
//! AxeOS reports `bestDiff` / `bestSessionDiff` either as plain numbers or
//! as human-readable strings with an SI suffix (`"4.29G"`, `"512k"`).
//! [`Difficulty`] normalises both into an ordered integer so the tracker
//! can compare readings numerically.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CoreError;

/// Suffixes used by the firmware, each a further factor of 1000.
const SUFFIXES: [&str; 7] = ["", "k", "M", "G", "T", "P", "E"];

/// A share difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "RawDifficulty")]
pub struct Difficulty(u64);

impl Difficulty {
    pub const ZERO: Difficulty = Difficulty(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parse a firmware difficulty string such as `"1.5M"` or `"812"`.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        let invalid = |reason: &str| CoreError::InvalidDifficulty {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty value"));
        }

        let (number, multiplier) = match trimmed.char_indices().last() {
            Some((idx, c)) if c.is_ascii_alphabetic() => {
                let multiplier = suffix_multiplier(c).ok_or_else(|| invalid("unknown suffix"))?;
                (trimmed[..idx].trim_end(), multiplier)
            }
            _ => (trimmed, 1.0),
        };

        let digits = number.chars().filter(|c| c.is_ascii_digit()).count();
        let dots = number.chars().filter(|c| *c == '.').count();
        if digits == 0 || dots > 1 || digits + dots != number.chars().count() {
            return Err(invalid("not a non-negative decimal number"));
        }

        if dots == 0 && multiplier == 1.0 {
            return number
                .parse::<u64>()
                .map(Self)
                .map_err(|_| invalid("out of range"));
        }

        let base: f64 = number
            .parse()
            .map_err(|_| invalid("not a non-negative decimal number"))?;
        from_float(base * multiplier).ok_or_else(|| invalid("out of range"))
    }
}

fn suffix_multiplier(suffix: char) -> Option<f64> {
    let exponent = match suffix {
        'k' | 'K' => 1,
        'M' => 2,
        'G' => 3,
        'T' => 4,
        'P' => 5,
        'E' => 6,
        _ => return None,
    };
    Some(1000f64.powi(exponent))
}

fn from_float(value: f64) -> Option<Difficulty> {
    if !value.is_finite() || value < 0.0 || value >= u64::MAX as f64 {
        return None;
    }
    Some(Difficulty(value.round() as u64))
}

impl FromStr for Difficulty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for Difficulty {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Renders in the firmware's style: `812`, `512.00k`, `4.29G`.
impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1000 {
            return write!(f, "{}", self.0);
        }

        let mut scaled = self.0 as f64;
        let mut idx = 0;
        while scaled >= 1000.0 && idx < SUFFIXES.len() - 1 {
            scaled /= 1000.0;
            idx += 1;
        }
        // 999.999k prints as 1000.00k unless it moves up a suffix.
        if (scaled * 100.0).round() >= 100_000.0 && idx < SUFFIXES.len() - 1 {
            scaled /= 1000.0;
            idx += 1;
        }
        write!(f, "{scaled:.2}{}", SUFFIXES[idx])
    }
}

/// Accepted wire shapes for a difficulty field.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDifficulty {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawDifficulty> for Difficulty {
    type Error = CoreError;

    fn try_from(raw: RawDifficulty) -> Result<Self, Self::Error> {
        match raw {
            RawDifficulty::Integer(value) => Ok(Self(value)),
            RawDifficulty::Float(value) => {
                from_float(value).ok_or_else(|| CoreError::InvalidDifficulty {
                    value: value.to_string(),
                    reason: "out of range".to_string(),
                })
            }
            RawDifficulty::Text(text) => Self::parse(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_plain_integers() {
        assert_eq!(Difficulty::parse("0").unwrap(), Difficulty::ZERO);
        assert_eq!(Difficulty::parse(" 812 ").unwrap().value(), 812);
    }

    #[test]
    fn parses_si_suffixes() {
        assert_eq!(Difficulty::parse("512k").unwrap().value(), 512_000);
        assert_eq!(Difficulty::parse("1.5M").unwrap().value(), 1_500_000);
        assert_eq!(Difficulty::parse("4.29G").unwrap().value(), 4_290_000_000);
        assert_eq!(Difficulty::parse("1.2T").unwrap().value(), 1_200_000_000_000);
        assert_eq!(Difficulty::parse("3P").unwrap().value(), 3_000_000_000_000_000);
    }

    #[test]
    fn suffix_ordering_is_numeric_not_lexical() {
        let small = Difficulty::parse("999M").unwrap();
        let large = Difficulty::parse("1.01G").unwrap();
        assert!(large > small);
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(Difficulty::parse(""), Err(CoreError::InvalidDifficulty { .. }));
        assert_matches!(Difficulty::parse("abc"), Err(CoreError::InvalidDifficulty { .. }));
        assert_matches!(Difficulty::parse("-5"), Err(CoreError::InvalidDifficulty { .. }));
        assert_matches!(Difficulty::parse("1.2.3M"), Err(CoreError::InvalidDifficulty { .. }));
        assert_matches!(Difficulty::parse("12Q"), Err(CoreError::InvalidDifficulty { .. }));
        assert_matches!(Difficulty::parse("NaN"), Err(CoreError::InvalidDifficulty { .. }));
    }

    #[test]
    fn display_matches_firmware_style() {
        assert_eq!(Difficulty::new(812).to_string(), "812");
        assert_eq!(Difficulty::new(512_000).to_string(), "512.00k");
        assert_eq!(Difficulty::new(4_290_000_000).to_string(), "4.29G");
    }

    #[test]
    fn display_rounding_moves_up_a_suffix() {
        assert_eq!(Difficulty::new(999).to_string(), "999");
        assert_eq!(Difficulty::new(999_994).to_string(), "999.99k");
        assert_eq!(Difficulty::new(999_999).to_string(), "1.00M");
        assert_eq!(Difficulty::new(999_999_999).to_string(), "1.00G");
    }

    #[test]
    fn deserializes_from_string_or_number() {
        let from_text: Difficulty = serde_json::from_str("\"2.5M\"").unwrap();
        let from_int: Difficulty = serde_json::from_str("2500000").unwrap();
        let from_float: Difficulty = serde_json::from_str("2500000.0").unwrap();
        assert_eq!(from_text, from_int);
        assert_eq!(from_int, from_float);

        assert!(serde_json::from_str::<Difficulty>("\"bogus\"").is_err());
    }
}
