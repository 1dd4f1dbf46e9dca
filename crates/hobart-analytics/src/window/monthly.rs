//! Monthly lag deltas, growth rate and next-month forecast.

use super::lag;
use crate::bucket::{BucketTable, Granularity};
use crate::classify::TrendDirection;
use crate::error::{AnalyticsError, Result};
use crate::stats::safe_div;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Windowed metrics of one (category, month) bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyWindowMetric {
    /// Category label
    pub category: String,
    /// First day of the month
    pub month: NaiveDate,
    /// Observations in the month
    pub count: usize,
    /// Sum of metrics in the month
    pub sum: f64,
    /// Mean metric in the month
    pub mean: f64,
    /// Mean of the previous month bucket
    pub prev_mean: Option<f64>,
    /// `mean - prev_mean`
    pub delta: Option<f64>,
    /// Sum of the previous month bucket
    pub prev_sum: Option<f64>,
    /// `(sum - prev_sum) / prev_sum`, `None` when there is no previous sum
    /// or it is zero
    pub growth_rate: Option<f64>,
    /// `sum * (1 + growth_rate)`, growth taken as zero when absent
    pub forecast: f64,
    /// Direction of `delta`
    pub trend: TrendDirection,
}

/// Growth of `current` over `previous`.
pub fn growth_rate(current: f64, previous: Option<f64>) -> Option<f64> {
    previous.and_then(|prev| safe_div(current - prev, prev))
}

/// Naive next-period projection.
pub fn forecast(current: f64, growth: Option<f64>) -> f64 {
    current * (1.0 + growth.unwrap_or(0.0))
}

/// Monthly window metrics per category, ordered by month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyWindowTable {
    partitions: BTreeMap<String, Vec<MonthlyWindowMetric>>,
}

impl MonthlyWindowTable {
    /// Compute metrics over the monthly bucket table.
    pub fn compute(monthly: &BucketTable) -> Self {
        let mut partitions = BTreeMap::new();
        for (category, buckets) in monthly.partitions() {
            let sums: Vec<f64> = buckets.iter().map(|b| b.sum).collect();
            let means: Vec<f64> = buckets.iter().map(|b| b.mean).collect();
            let prev_sums = lag(&sums);
            let prev_means = lag(&means);

            let series = buckets
                .iter()
                .enumerate()
                .map(|(i, bucket)| {
                    let delta = prev_means[i].map(|p| bucket.mean - p);
                    let growth = growth_rate(bucket.sum, prev_sums[i]);
                    MonthlyWindowMetric {
                        category: category.to_string(),
                        month: bucket.start,
                        count: bucket.count,
                        sum: bucket.sum,
                        mean: bucket.mean,
                        prev_mean: prev_means[i],
                        delta,
                        prev_sum: prev_sums[i],
                        growth_rate: growth,
                        forecast: forecast(bucket.sum, growth),
                        trend: TrendDirection::from_delta(delta),
                    }
                })
                .collect();
            partitions.insert(category.to_string(), series);
        }

        tracing::debug!(
            categories = partitions.len(),
            "computed monthly window metrics"
        );
        Self { partitions }
    }

    /// Metrics of `category` ordered by month.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] for an unknown category.
    pub fn partition(&self, category: &str) -> Result<&[MonthlyWindowMetric]> {
        self.partitions
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalyticsError::missing(category, "monthly window"))
    }

    /// Metrics of the month containing `date`.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] if no such month exists.
    pub fn get(&self, category: &str, date: NaiveDate) -> Result<&MonthlyWindowMetric> {
        let month = Granularity::Month.bucket_start(date);
        let series = self.partition(category)?;
        series
            .binary_search_by(|m| m.month.cmp(&month))
            .map(|i| &series[i])
            .map_err(|_| AnalyticsError::missing(category, "monthly window"))
    }

    /// Iterate every metric in category then month order.
    pub fn iter(&self) -> impl Iterator<Item = &MonthlyWindowMetric> {
        self.partitions.values().flatten()
    }
}
