//! Pipeline configuration.
//!
//! [`PipelineSettings`] is the raw, deserializable form (timestamps as
//! strings) read from files and the environment. [`PipelineConfig`] is the
//! validated form the pipeline runs with.

use crate::error::ConfigError;
use chrono::{NaiveDate, NaiveDateTime};
use hobart_data::parse_timestamp;
use serde::{Deserialize, Serialize};

/// Trailing window sizes, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Short moving average / volatility window (default: 7)
    pub short: usize,
    /// Long moving average / volatility window (default: 30)
    pub long: usize,
    /// Rolling baseline for anomaly detection (default: 14)
    pub anomaly: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            short: 7,
            long: 30,
            anomaly: 14,
        }
    }
}

impl WindowConfig {
    /// Check every window covers at least one row.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, size) in [
            ("short", self.short),
            ("long", self.long),
            ("anomaly", self.anomaly),
        ] {
            if size == 0 {
                return Err(ConfigError::InvalidWindow { name, size });
            }
        }
        Ok(())
    }
}

/// Sigma multipliers for the outlier and anomaly flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Observation outlier threshold in category standard deviations (default: 2.0)
    pub outlier_sigma: f64,
    /// Daily anomaly threshold in rolling standard deviations (default: 3.0)
    pub anomaly_sigma: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            outlier_sigma: 2.0,
            anomaly_sigma: 3.0,
        }
    }
}

impl ThresholdConfig {
    /// Check both multipliers are positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("outlier_sigma", self.outlier_sigma),
            ("anomaly_sigma", self.anomaly_sigma),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

/// Start of the default reporting period.
pub fn default_cutoff() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Unvalidated pipeline settings as read from configuration sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Inclusive lower bound on `created_at` (default: 2023-01-01)
    pub cutoff: Option<String>,
    /// Timestamp all "time since" columns are measured against
    pub run_timestamp: Option<String>,
    /// Window sizes
    pub windows: WindowConfig,
    /// Classification thresholds
    pub thresholds: ThresholdConfig,
}

/// Validated pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    cutoff: NaiveDateTime,
    run_timestamp: NaiveDateTime,
    windows: WindowConfig,
    thresholds: ThresholdConfig,
}

impl PipelineConfig {
    /// Create a configuration with default windows and thresholds.
    ///
    /// The run timestamp is supplied by the caller; the pipeline never
    /// reads the clock.
    pub fn new(run_timestamp: NaiveDateTime) -> Self {
        Self {
            cutoff: default_cutoff(),
            run_timestamp,
            windows: WindowConfig::default(),
            thresholds: ThresholdConfig::default(),
        }
    }

    /// Replace the cutoff.
    pub fn with_cutoff(mut self, cutoff: NaiveDateTime) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Replace the window sizes, validating them.
    pub fn with_windows(mut self, windows: WindowConfig) -> Result<Self, ConfigError> {
        windows.validate()?;
        self.windows = windows;
        Ok(self)
    }

    /// Replace the thresholds, validating them.
    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        self.thresholds = thresholds;
        Ok(self)
    }

    /// Validate raw settings.
    ///
    /// `fallback_run_timestamp` is used when the settings carry none.
    ///
    /// # Errors
    /// Returns an error for a zero window, a non-positive or non-finite
    /// sigma, or an unparsable timestamp.
    pub fn from_settings(
        settings: &PipelineSettings,
        fallback_run_timestamp: NaiveDateTime,
    ) -> Result<Self, ConfigError> {
        let cutoff = match settings.cutoff.as_deref() {
            Some(raw) => parse_setting("cutoff", raw)?,
            None => default_cutoff(),
        };
        let run_timestamp = match settings.run_timestamp.as_deref() {
            Some(raw) => parse_setting("run_timestamp", raw)?,
            None => fallback_run_timestamp,
        };

        Self::new(run_timestamp)
            .with_cutoff(cutoff)
            .with_windows(settings.windows)?
            .with_thresholds(settings.thresholds)
    }

    /// Inclusive lower bound on `created_at`.
    pub const fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    /// Injected run timestamp.
    pub const fn run_timestamp(&self) -> NaiveDateTime {
        self.run_timestamp
    }

    /// Window sizes.
    pub const fn windows(&self) -> &WindowConfig {
        &self.windows
    }

    /// Classification thresholds.
    pub const fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }
}

fn parse_setting(field: &'static str, raw: &str) -> Result<NaiveDateTime, ConfigError> {
    parse_timestamp(raw).map_err(|_| ConfigError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run_ts() -> NaiveDateTime {
        parse_timestamp("2024-06-30 12:00:00").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new(run_ts());
        assert_eq!(config.cutoff(), parse_timestamp("2023-01-01").unwrap());
        assert_eq!(config.windows().short, 7);
        assert_eq!(config.windows().long, 30);
        assert_eq!(config.windows().anomaly, 14);
        assert_eq!(config.thresholds().outlier_sigma, 2.0);
        assert_eq!(config.thresholds().anomaly_sigma, 3.0);
    }

    #[test]
    fn test_from_settings() {
        let settings = PipelineSettings {
            cutoff: Some("2024-01-01".to_string()),
            run_timestamp: Some("2024-07-01T00:00:00Z".to_string()),
            windows: WindowConfig {
                short: 3,
                ..WindowConfig::default()
            },
            ..PipelineSettings::default()
        };

        let config = PipelineConfig::from_settings(&settings, run_ts()).unwrap();
        assert_eq!(config.cutoff(), parse_timestamp("2024-01-01").unwrap());
        assert_eq!(
            config.run_timestamp(),
            parse_timestamp("2024-07-01 00:00:00").unwrap()
        );
        assert_eq!(config.windows().short, 3);
    }

    #[test]
    fn test_fallback_run_timestamp() {
        let config = PipelineConfig::from_settings(&PipelineSettings::default(), run_ts()).unwrap();
        assert_eq!(config.run_timestamp(), run_ts());
    }

    #[test]
    fn test_invalid_cutoff() {
        let settings = PipelineSettings {
            cutoff: Some("yesterday".to_string()),
            ..PipelineSettings::default()
        };
        let err = PipelineConfig::from_settings(&settings, run_ts()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidTimestamp {
                field: "cutoff",
                value: "yesterday".to_string()
            }
        );
    }

    #[test]
    fn test_zero_window_rejected() {
        let windows = WindowConfig {
            anomaly: 0,
            ..WindowConfig::default()
        };
        let result = PipelineConfig::new(run_ts()).with_windows(windows);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidWindow {
                name: "anomaly",
                size: 0
            })
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_bad_thresholds_rejected(#[case] sigma: f64) {
        let thresholds = ThresholdConfig {
            outlier_sigma: sigma,
            ..ThresholdConfig::default()
        };
        assert!(thresholds.validate().is_err());
    }
}
