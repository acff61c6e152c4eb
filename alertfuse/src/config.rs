// alertfuse/src/config.rs
//
// Clustering configuration + the "15m" / "1h" / "30s" window syntax used on
// the command line and in ALERTFUSE_TIME_WINDOW.

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_TIME_WINDOW_MINUTES: i64 = 15;
pub const DEFAULT_MIN_SCORE: i64 = 5;
pub const DEFAULT_OUTPUT: &str = "data/out/incidents.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("time window '{0}' must be a whole number ending with s, m, or h")]
    InvalidTimeWindow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Proximity bonus window, not a cutoff.
    pub time_window: Duration,
    /// Minimum compatibility score to join an open incident.
    pub min_score: i64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            time_window: Duration::minutes(DEFAULT_TIME_WINDOW_MINUTES),
            min_score:   DEFAULT_MIN_SCORE,
        }
    }
}

impl ClusterConfig {
    pub fn new(time_window: Duration, min_score: i64) -> Self {
        Self { time_window, min_score }
    }

    /// Build from the textual window form, e.g. `("15m", 5)`.
    pub fn parse(time_window: &str, min_score: i64) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_time_window(time_window)?, min_score))
    }
}

/// Parse `<n>s`, `<n>m` or `<n>h` (case-insensitive, surrounding space ignored).
pub fn parse_time_window(value: &str) -> Result<Duration, ConfigError> {
    let text = value.trim().to_ascii_lowercase();
    let invalid = || ConfigError::InvalidTimeWindow(value.to_string());

    let Some(unit) = text.chars().last() else {
        return Err(invalid());
    };
    let amount: i64 = text[..text.len() - unit.len_utf8()]
        .trim()
        .parse()
        .map_err(|_| invalid())?;

    let window = match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        _ => None,
    };
    window.ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fifteen_minutes_and_five() {
        let cfg = ClusterConfig::default();
        assert_eq!(cfg.time_window, Duration::minutes(15));
        assert_eq!(cfg.min_score, 5);
    }

    #[test]
    fn parses_every_unit() {
        assert_eq!(parse_time_window("15m"), Ok(Duration::minutes(15)));
        assert_eq!(parse_time_window(" 2H "), Ok(Duration::hours(2)));
        assert_eq!(parse_time_window("90s"), Ok(Duration::seconds(90)));
    }

    #[test]
    fn parse_builds_config_from_text() {
        let cfg = ClusterConfig::parse("1h", 3).unwrap();
        assert_eq!(cfg, ClusterConfig::new(Duration::hours(1), 3));
        assert!(ClusterConfig::parse("1w", 3).is_err());
    }

    #[test]
    fn rejects_bad_windows() {
        for bad in ["", "15", "m", "15d", "1.5m", "abc", "9999999999999999h"] {
            assert_eq!(
                parse_time_window(bad),
                Err(ConfigError::InvalidTimeWindow(bad.to_string())),
                "{bad:?}"
            );
        }
    }
}
