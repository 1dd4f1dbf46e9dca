//! Windowed analytics over ordered partitions.
//!
//! Every trailing computation in the pipeline goes through
//! [`TrailingWindow`]: the frame for row `i` is row `i` plus up to
//! `size - 1` preceding rows of the same partition. Frames at the start of
//! a partition are shorter and used as-is. Windows count rows, not calendar
//! time, so a gap between two buckets does not shrink the frame.

pub mod daily;
pub mod lag;
pub mod monthly;

pub use daily::{DailyWindowMetric, DailyWindowTable};
pub use lag::{ObservationLag, ObservationLagTable};
pub use monthly::{MonthlyWindowMetric, MonthlyWindowTable};

use crate::error::ConfigError;
use crate::stats::{mean, sample_std};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Aggregate applied to each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowStatistic {
    /// Arithmetic mean
    Mean,
    /// Sample standard deviation, `None` below two rows
    StdDev,
    /// Sum
    Sum,
    /// Row count
    Count,
    /// Minimum
    Min,
    /// Maximum
    Max,
}

impl WindowStatistic {
    /// Apply the statistic to one frame.
    pub fn apply(&self, frame: &[f64]) -> Option<f64> {
        match self {
            Self::Mean => mean(frame),
            Self::StdDev => sample_std(frame),
            Self::Sum => Some(frame.iter().sum()),
            Self::Count => Some(frame.len() as f64),
            Self::Min => frame.iter().copied().reduce(f64::min),
            Self::Max => frame.iter().copied().reduce(f64::max),
        }
    }
}

/// A row-based trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingWindow {
    size: NonZeroUsize,
}

impl TrailingWindow {
    /// Create a window covering `size` rows.
    pub const fn new(size: NonZeroUsize) -> Self {
        Self { size }
    }

    /// Create a window covering `size` rows, rejecting an empty window.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidWindow`] when `size` is zero.
    pub fn try_new(name: &'static str, size: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(size)
            .map(Self::new)
            .ok_or(ConfigError::InvalidWindow { name, size })
    }

    /// Number of rows per full frame.
    pub const fn size(&self) -> usize {
        self.size.get()
    }

    /// Frame ending at row `index`.
    pub fn frame<'a>(&self, values: &'a [f64], index: usize) -> &'a [f64] {
        let end = (index + 1).min(values.len());
        let start = end.saturating_sub(self.size.get());
        &values[start..end]
    }

    /// Apply `statistic` to the frame ending at every row.
    pub fn apply(&self, values: &[f64], statistic: WindowStatistic) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|i| statistic.apply(self.frame(values, i)))
            .collect()
    }
}

/// Running sum from the partition start through each row.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |total, v| {
            *total += v;
            Some(*total)
        })
        .collect()
}

/// Value of the previous row, `None` for the first.
pub fn lag(values: &[f64]) -> Vec<Option<f64>> {
    std::iter::once(None)
        .chain(values.iter().copied().map(Some))
        .take(values.len())
        .collect()
}
