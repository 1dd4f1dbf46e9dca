//! Per-category descriptive statistics.
//!
//! Computed once per run and looked up by every later stage.

use crate::error::{AnalyticsError, Result};
use crate::stats::{mean, percentile_cont_sorted, sample_variance, sorted};
use hobart_data::ObservationSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics of one category's metric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatistics {
    /// Category label
    pub category: String,
    /// Number of observations
    pub count: usize,
    /// Sum of metrics
    pub sum: f64,
    /// Mean metric
    pub mean: f64,
    /// Smallest metric
    pub min: f64,
    /// Largest metric
    pub max: f64,
    /// Sample variance, `None` below two observations
    pub variance: Option<f64>,
    /// Sample standard deviation, `None` below two observations
    pub stddev: Option<f64>,
    /// 25th percentile (continuous)
    pub p25: f64,
    /// Median (continuous)
    pub median: f64,
    /// 75th percentile (continuous)
    pub p75: f64,
}

impl CategoryStatistics {
    /// Compute statistics over a non-empty set of values.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_values(category: impl Into<String>, values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let ordered = sorted(values);
        let variance = sample_variance(values);

        Some(Self {
            category: category.into(),
            count: values.len(),
            sum: values.iter().sum(),
            mean,
            min: *ordered.first()?,
            max: *ordered.last()?,
            variance,
            stddev: variance.map(f64::sqrt),
            p25: percentile_cont_sorted(&ordered, 0.25)?,
            median: percentile_cont_sorted(&ordered, 0.5)?,
            p75: percentile_cont_sorted(&ordered, 0.75)?,
        })
    }

    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }
}

/// Category statistics keyed by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryStatsTable {
    stats: BTreeMap<String, CategoryStatistics>,
}

impl CategoryStatsTable {
    /// Compute statistics for every category in the snapshot.
    pub fn compute(snapshot: &ObservationSnapshot) -> Self {
        let stats: BTreeMap<String, CategoryStatistics> = snapshot
            .by_category()
            .into_iter()
            .filter_map(|(category, rows)| {
                let values: Vec<f64> = rows.iter().map(|r| r.metric()).collect();
                CategoryStatistics::from_values(category, &values)
                    .map(|s| (category.to_string(), s))
            })
            .collect();

        tracing::debug!(categories = stats.len(), "computed category statistics");
        Self { stats }
    }

    /// Statistics for `category`.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] if the category was
    /// never computed.
    pub fn get(&self, category: &str) -> Result<&CategoryStatistics> {
        self.stats
            .get(category)
            .ok_or_else(|| AnalyticsError::missing(category, "category statistics"))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether no category was computed.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Iterate in category order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryStatistics> {
        self.stats.values()
    }
}
