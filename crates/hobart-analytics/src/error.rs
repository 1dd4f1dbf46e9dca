//! Error types for pipeline configuration and execution.

use hobart_data::DataError;
use thiserror::Error;

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Invalid pipeline configuration, detected before any processing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A trailing window must cover at least one row.
    #[error("Invalid {name} window size: {size} (must be at least 1)")]
    InvalidWindow {
        /// Which window
        name: &'static str,
        /// Rejected size
        size: usize,
    },

    /// Sigma multipliers must be positive and finite.
    #[error("Invalid {name} threshold: {value} (must be positive and finite)")]
    InvalidThreshold {
        /// Which threshold
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// A configured timestamp could not be parsed.
    #[error("Invalid {field} timestamp: {value:?}")]
    InvalidTimestamp {
        /// Which setting
        field: &'static str,
        /// Raw value
        value: String,
    },
}

/// Errors raised while running the pipeline.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A stage looked up a category its upstream stage never produced.
    #[error("Missing {stage} entry for category {category:?}")]
    MissingDependency {
        /// Category that was looked up
        category: String,
        /// Stage whose output was missing
        stage: &'static str,
    },

    /// Configuration rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Loading observations failed.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

impl AnalyticsError {
    /// Build a [`AnalyticsError::MissingDependency`].
    pub fn missing(category: impl Into<String>, stage: &'static str) -> Self {
        Self::MissingDependency {
            category: category.into(),
            stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalyticsError::missing("alpha", "category statistics");
        assert_eq!(
            err.to_string(),
            "Missing category statistics entry for category \"alpha\""
        );

        let err: AnalyticsError = ConfigError::InvalidWindow {
            name: "short",
            size: 0,
        }
        .into();
        assert!(err.to_string().contains("short window size: 0"));
    }
}
