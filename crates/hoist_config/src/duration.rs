//! Human-readable durations such as `"2s"` or `"30m"`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A duration written with a unit suffix.
///
/// Accepts `ms`, `s`, `m` and `h` suffixes; a bare integer is seconds.
/// Displays using the largest unit that divides it evenly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaitDuration(Duration);

impl WaitDuration {
    /// Wraps a [`Duration`].
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// A duration of whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// A duration of whole minutes.
    pub const fn from_mins(mins: u64) -> Self {
        Self(Duration::from_secs(mins * 60))
    }

    /// The wrapped [`Duration`].
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Returns `true` for a zero-length duration.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<WaitDuration> for Duration {
    fn from(d: WaitDuration) -> Self {
        d.0
    }
}

impl fmt::Debug for WaitDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaitDuration({self})")
    }
}

impl fmt::Display for WaitDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0.as_millis();
        if ms != 0 && ms % 3_600_000 == 0 {
            write!(f, "{}h", ms / 3_600_000)
        } else if ms != 0 && ms % 60_000 == 0 {
            write!(f, "{}m", ms / 60_000)
        } else if ms % 1_000 == 0 {
            write!(f, "{}s", ms / 1_000)
        } else {
            write!(f, "{ms}ms")
        }
    }
}

/// Error type for parsing duration strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDurationError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid duration: '{}' (expected e.g. 500ms, 2s, 30m, 1h)",
            self.input
        )
    }
}

impl std::error::Error for ParseDurationError {}

impl FromStr for WaitDuration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseDurationError {
            input: s.to_string(),
        };
        let number = |num: &str| num.trim().parse::<u64>().map_err(|_| err());

        // "ms" before "s", or "500ms" would read as "500m" seconds.
        let lower = s.to_ascii_lowercase();
        if let Some(num) = lower.strip_suffix("ms") {
            return Ok(Self(Duration::from_millis(number(num)?)));
        }
        if let Some(num) = lower.strip_suffix('s') {
            return Ok(Self(Duration::from_secs(number(num)?)));
        }
        if let Some(num) = lower.strip_suffix('m') {
            let mins = number(num)?;
            return mins.checked_mul(60).map(Self::from_secs).ok_or_else(err);
        }
        if let Some(num) = lower.strip_suffix('h') {
            let hours = number(num)?;
            return hours.checked_mul(3600).map(Self::from_secs).ok_or_else(err);
        }

        Ok(Self::from_secs(number(s)?))
    }
}

impl<'de> Deserialize<'de> for WaitDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = WaitDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a duration such as \"2s\" or \"30m\", or whole seconds")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(WaitDuration::from_secs)
                    .map_err(|_| E::custom(format!("negative duration: {v}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(WaitDuration::from_secs(v))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_units() {
        assert_eq!("500ms".parse::<WaitDuration>().unwrap().as_duration(), Duration::from_millis(500));
        assert_eq!("2s".parse::<WaitDuration>().unwrap(), WaitDuration::from_secs(2));
        assert_eq!("30m".parse::<WaitDuration>().unwrap(), WaitDuration::from_mins(30));
        assert_eq!("1h".parse::<WaitDuration>().unwrap(), WaitDuration::from_secs(3600));
        assert_eq!("90".parse::<WaitDuration>().unwrap(), WaitDuration::from_secs(90));
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(" 5M ".parse::<WaitDuration>().unwrap(), WaitDuration::from_mins(5));
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "fast", "1.5s", "-2s", "10d"] {
            let err = input.parse::<WaitDuration>().unwrap_err();
            assert_eq!(err.input, input.trim());
        }
    }

    #[test]
    fn display_picks_largest_unit() {
        assert_eq!(WaitDuration::from_mins(30).to_string(), "30m");
        assert_eq!(WaitDuration::from_secs(7200).to_string(), "2h");
        assert_eq!(WaitDuration::from_secs(90).to_string(), "90s");
        assert_eq!(WaitDuration::new(Duration::from_millis(1500)).to_string(), "1500ms");
        assert_eq!(WaitDuration::from_secs(0).to_string(), "0s");
    }

    #[test]
    fn deserialize_string_or_integer() {
        #[derive(Deserialize)]
        struct Wrapper {
            a: WaitDuration,
            b: WaitDuration,
        }
        let w: Wrapper = toml::from_str("a = \"2s\"\nb = 45").unwrap();
        assert_eq!(w.a, WaitDuration::from_secs(2));
        assert_eq!(w.b, WaitDuration::from_secs(45));
    }

    #[test]
    fn deserialize_rejects_negative() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            #[allow(dead_code)]
            a: WaitDuration,
        }
        assert!(toml::from_str::<Wrapper>("a = -1").is_err());
    }
}
