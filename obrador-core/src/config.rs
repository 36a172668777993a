//! Ordering-window configuration.
//!
//! The storefront persists its settings as flat string key/value pairs; this
//! module parses those into a typed [`OrderingWindowConfig`] and validates it
//! with `garde` before it can be installed. The calculator in [`crate::week`]
//! assumes it only ever sees configurations that passed this boundary.

use std::collections::HashMap;

use chrono::Weekday;
use chrono_tz::Tz;
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Settings keys as stored in the site-configuration table.
pub mod keys {
    pub const ENABLED: &str = "ordering.enabled";
    pub const TIMEZONE: &str = "ordering.timezone";
    pub const OPENING_DAY: &str = "ordering.opening_day";
    pub const OPENING_HOUR: &str = "ordering.opening_hour";
    pub const OPENING_MINUTE: &str = "ordering.opening_minute";
    pub const CLOSING_DAY: &str = "ordering.closing_day";
    pub const CLOSING_HOUR: &str = "ordering.closing_hour";
    pub const CLOSING_MINUTE: &str = "ordering.closing_minute";
}

/// A single validation failure detail.
#[derive(Debug, Clone)]
pub struct ConfigValidationDetail {
    pub key: String,
    pub message: String,
}

/// Error type for configuration parsing and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// A required settings key was absent.
    MissingKey(String),
    /// A value failed to parse into its typed form.
    Invalid { key: String, message: String },
    /// Typed validation (garde constraints) failed.
    Validation(Vec<ConfigValidationDetail>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingKey(key) => write!(f, "Config key not found: {key}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
            ConfigError::Validation(details) => {
                write!(f, "Config validation errors:")?;
                for detail in details {
                    write!(f, "\n  - {}: {}", detail.key, detail.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// The recurring weekly ordering window.
///
/// Opening and closing are weekday + wall-clock time anchored to the
/// Monday-start week, evaluated in `timezone`. Out-of-range hours/minutes are
/// rejected here; the calculator never re-checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OrderingWindowConfig {
    #[garde(skip)]
    pub enabled: bool,
    #[garde(skip)]
    pub timezone: Tz,
    #[garde(skip)]
    pub opening_day: Weekday,
    #[garde(range(max = 23))]
    pub opening_hour: u8,
    #[garde(range(max = 59))]
    pub opening_minute: u8,
    #[garde(skip)]
    pub closing_day: Weekday,
    #[garde(range(max = 23))]
    pub closing_hour: u8,
    #[garde(range(max = 59))]
    pub closing_minute: u8,
}

impl Default for OrderingWindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: chrono_tz::Europe::Madrid,
            opening_day: Weekday::Wed,
            opening_hour: 18,
            opening_minute: 0,
            closing_day: Weekday::Sun,
            closing_hour: 20,
            closing_minute: 0,
        }
    }
}

impl OrderingWindowConfig {
    /// Parses the flat settings map, falling back to defaults for absent
    /// keys, and validates the result.
    ///
    /// Weekdays are stored as `0`–`6` with `0` = Sunday, matching the admin
    /// panel's persisted format.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = Self {
            enabled: parse_or(settings, keys::ENABLED, defaults.enabled, parse_bool)?,
            timezone: parse_or(settings, keys::TIMEZONE, defaults.timezone, parse_timezone)?,
            opening_day: parse_or(settings, keys::OPENING_DAY, defaults.opening_day, parse_weekday)?,
            opening_hour: parse_or(settings, keys::OPENING_HOUR, defaults.opening_hour, parse_u8)?,
            opening_minute: parse_or(settings, keys::OPENING_MINUTE, defaults.opening_minute, parse_u8)?,
            closing_day: parse_or(settings, keys::CLOSING_DAY, defaults.closing_day, parse_weekday)?,
            closing_hour: parse_or(settings, keys::CLOSING_HOUR, defaults.closing_hour, parse_u8)?,
            closing_minute: parse_or(settings, keys::CLOSING_MINUTE, defaults.closing_minute, parse_u8)?,
        };
        cfg.check()?;
        Ok(cfg)
    }

    /// Runs garde validation, mapping the report into [`ConfigError`].
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|report| {
            let details = report
                .iter()
                .map(|(path, error)| ConfigValidationDetail {
                    key: path.to_string(),
                    message: error.message().to_string(),
                })
                .collect();
            ConfigError::Validation(details)
        })
    }
}

fn parse_or<T>(
    settings: &HashMap<String, String>,
    key: &str,
    default: T,
    parse: fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    match settings.get(key) {
        None => Ok(default),
        Some(raw) => parse(raw.trim()).map_err(|message| ConfigError::Invalid {
            key: key.to_string(),
            message,
        }),
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.parse::<Tz>()
        .map_err(|_| format!("unknown timezone '{raw}'"))
}

fn parse_u8(raw: &str) -> Result<u8, String> {
    raw.parse::<u8>().map_err(|e| e.to_string())
}

/// `0` = Sunday through `6` = Saturday, as persisted by the admin panel.
fn parse_weekday(raw: &str) -> Result<Weekday, String> {
    match raw.parse::<u8>() {
        Ok(0) => Ok(Weekday::Sun),
        Ok(1) => Ok(Weekday::Mon),
        Ok(2) => Ok(Weekday::Tue),
        Ok(3) => Ok(Weekday::Wed),
        Ok(4) => Ok(Weekday::Thu),
        Ok(5) => Ok(Weekday::Fri),
        Ok(6) => Ok(Weekday::Sat),
        Ok(other) => Err(format!("weekday index out of range: {other}")),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_full_settings_map() {
        let cfg = OrderingWindowConfig::from_settings(&settings(&[
            (keys::ENABLED, "true"),
            (keys::TIMEZONE, "Europe/Madrid"),
            (keys::OPENING_DAY, "3"),
            (keys::OPENING_HOUR, "18"),
            (keys::OPENING_MINUTE, "0"),
            (keys::CLOSING_DAY, "0"),
            (keys::CLOSING_HOUR, "20"),
            (keys::CLOSING_MINUTE, "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.opening_day, Weekday::Wed);
        assert_eq!(cfg.closing_day, Weekday::Sun);
        assert_eq!(cfg.timezone, chrono_tz::Europe::Madrid);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = OrderingWindowConfig::from_settings(&HashMap::new()).unwrap();
        assert_eq!(cfg, OrderingWindowConfig::default());
    }

    #[test]
    fn out_of_range_hour_is_rejected() {
        let err = OrderingWindowConfig::from_settings(&settings(&[(keys::OPENING_HOUR, "24")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn bad_weekday_index_is_rejected() {
        let err =
            OrderingWindowConfig::from_settings(&settings(&[(keys::CLOSING_DAY, "7")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = OrderingWindowConfig::from_settings(&settings(&[(
            keys::TIMEZONE,
            "Europe/Atlantis",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
