//! Human-readable duration parsing and formatting utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

const SECOND: u64 = 1;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Duration in whole seconds with human-readable parsing ("90s", "2h30m", "1w")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DurationSpec(pub u64);

impl DurationSpec {
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Format as the largest-units-first breakdown, e.g. `1h 30m`
    pub fn to_human_readable(&self) -> String {
        if self.0 == 0 {
            return "0s".to_string();
        }

        const UNITS: &[(&str, u64)] = &[
            ("w", WEEK),
            ("d", DAY),
            ("h", HOUR),
            ("m", MINUTE),
            ("s", SECOND),
        ];

        let mut rest = self.0;
        let mut parts = Vec::new();
        for &(unit, secs) in UNITS {
            let value = rest / secs;
            if value > 0 {
                parts.push(format!("{}{}", value, unit));
                rest %= secs;
            }
        }

        parts.join(" ")
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human_readable())
    }
}

impl<'de> Deserialize<'de> for DurationSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> serde::de::Visitor<'de> for DurationVisitor {
            type Value = DurationSpec;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as string (e.g., \"30m\", \"1h\") or integer seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(DurationSpec(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v < 0 {
                    return Err(serde::de::Error::custom("duration must be non-negative"));
                }
                Ok(DurationSpec(v as u64))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<DurationSpec>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

impl FromStr for DurationSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Err(ParseError::InvalidFormat(s));
        }

        // Plain number means seconds
        if let Ok(num) = s.parse::<u64>() {
            return Ok(DurationSpec(num));
        }

        // Sequence of <number><unit> segments, e.g. "2h30m"
        let mut total = 0u64;
        let mut chars = s.chars().peekable();
        while chars.peek().is_some() {
            let mut num = String::new();
            while let Some(c) = chars.peek() {
                if c.is_ascii_digit() {
                    num.push(*c);
                    chars.next();
                } else {
                    break;
                }
            }
            if num.is_empty() {
                return Err(ParseError::InvalidFormat(s.clone()));
            }

            let mut unit = String::new();
            while let Some(c) = chars.peek() {
                if c.is_ascii_alphabetic() {
                    unit.push(*c);
                    chars.next();
                } else if c.is_whitespace() {
                    chars.next();
                } else {
                    break;
                }
            }

            let value: u64 = num.parse()?;
            let multiplier = match unit.trim() {
                "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
                "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
                "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
                "d" | "day" | "days" => DAY,
                "w" | "week" | "weeks" => WEEK,
                other => return Err(ParseError::InvalidUnit(other.to_string())),
            };

            total = total.saturating_add(value.saturating_mul(multiplier));
        }

        Ok(DurationSpec(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!("90".parse::<DurationSpec>().unwrap(), DurationSpec(90));
        assert_eq!("1800".parse::<DurationSpec>().unwrap(), DurationSpec(1800));
    }

    #[test]
    fn parses_unit_suffixes() {
        assert_eq!("90s".parse::<DurationSpec>().unwrap(), DurationSpec(90));
        assert_eq!("30m".parse::<DurationSpec>().unwrap(), DurationSpec(1800));
        assert_eq!("1h".parse::<DurationSpec>().unwrap(), DurationSpec(3600));
        assert_eq!("2d".parse::<DurationSpec>().unwrap(), DurationSpec(172_800));
        assert_eq!("1w".parse::<DurationSpec>().unwrap(), DurationSpec(604_800));
    }

    #[test]
    fn parses_compound_durations() {
        assert_eq!(
            "2h30m".parse::<DurationSpec>().unwrap(),
            DurationSpec(9000)
        );
        assert_eq!(
            "1w 2d 3h".parse::<DurationSpec>().unwrap(),
            DurationSpec(WEEK + 2 * DAY + 3 * HOUR)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<DurationSpec>().is_err());
        assert!("h2".parse::<DurationSpec>().is_err());
        assert!("12x".parse::<DurationSpec>().is_err());
    }

    #[test]
    fn formats_human_readable() {
        assert_eq!(DurationSpec(0).to_human_readable(), "0s");
        assert_eq!(DurationSpec(90).to_human_readable(), "1m 30s");
        assert_eq!(DurationSpec(9000).to_human_readable(), "2h 30m");
        assert_eq!(
            DurationSpec(WEEK + DAY + 1).to_human_readable(),
            "1w 1d 1s"
        );
    }

    #[test]
    fn deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            ttl: DurationSpec,
        }

        let w: Wrapper = toml::from_str(r#"ttl = "45m""#).unwrap();
        assert_eq!(w.ttl, DurationSpec(2700));

        let w: Wrapper = toml::from_str("ttl = 60").unwrap();
        assert_eq!(w.ttl, DurationSpec(60));
    }
}
