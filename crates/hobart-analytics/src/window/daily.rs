//! Daily windowed metrics: cumulative totals, moving averages, volatility
//! and the rolling anomaly baseline.

use super::{TrailingWindow, WindowStatistic, cumulative_sum, lag};
use crate::bucket::{BucketTable, Granularity};
use crate::config::WindowConfig;
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Windowed metrics of one (category, day) bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWindowMetric {
    /// Category label
    pub category: String,
    /// Bucket day
    pub date: NaiveDate,
    /// Observations on the day
    pub count: usize,
    /// Sum of metrics on the day
    pub sum: f64,
    /// Mean metric on the day
    pub mean: f64,
    /// Sum from the first day of the category through this day
    pub cumulative_sum: f64,
    /// Count from the first day of the category through this day
    pub cumulative_count: usize,
    /// Sum of the previous day bucket
    pub prev_sum: Option<f64>,
    /// `sum - prev_sum`
    pub delta: Option<f64>,
    /// Mean of `sum` over the short window
    pub moving_avg_short: Option<f64>,
    /// Standard deviation of `sum` over the short window
    pub volatility_short: Option<f64>,
    /// Mean of `sum` over the long window
    pub moving_avg_long: Option<f64>,
    /// Standard deviation of `sum` over the long window
    pub volatility_long: Option<f64>,
    /// Mean of `sum` over the anomaly window
    pub rolling_avg: Option<f64>,
    /// Standard deviation of `sum` over the anomaly window
    pub rolling_stddev: Option<f64>,
}

/// Daily window metrics per category, ordered by day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyWindowTable {
    partitions: BTreeMap<String, Vec<DailyWindowMetric>>,
}

impl DailyWindowTable {
    /// Compute metrics over the daily bucket table.
    ///
    /// # Errors
    /// Returns [`crate::ConfigError::InvalidWindow`] for a zero window size.
    pub fn compute(daily: &BucketTable, windows: &WindowConfig) -> Result<Self> {
        let short = TrailingWindow::try_new("short", windows.short)?;
        let long = TrailingWindow::try_new("long", windows.long)?;
        let anomaly = TrailingWindow::try_new("anomaly", windows.anomaly)?;

        let mut partitions = BTreeMap::new();
        for (category, buckets) in daily.partitions() {
            let sums: Vec<f64> = buckets.iter().map(|b| b.sum).collect();
            let counts: Vec<f64> = buckets.iter().map(|b| b.count as f64).collect();

            let cum_sum = cumulative_sum(&sums);
            let cum_count = cumulative_sum(&counts);
            let prev = lag(&sums);
            let ma_short = short.apply(&sums, WindowStatistic::Mean);
            let vol_short = short.apply(&sums, WindowStatistic::StdDev);
            let ma_long = long.apply(&sums, WindowStatistic::Mean);
            let vol_long = long.apply(&sums, WindowStatistic::StdDev);
            let roll_avg = anomaly.apply(&sums, WindowStatistic::Mean);
            let roll_std = anomaly.apply(&sums, WindowStatistic::StdDev);

            let series = buckets
                .iter()
                .enumerate()
                .map(|(i, bucket)| DailyWindowMetric {
                    category: category.to_string(),
                    date: bucket.start,
                    count: bucket.count,
                    sum: bucket.sum,
                    mean: bucket.mean,
                    cumulative_sum: cum_sum[i],
                    cumulative_count: cum_count[i] as usize,
                    prev_sum: prev[i],
                    delta: prev[i].map(|p| bucket.sum - p),
                    moving_avg_short: ma_short[i],
                    volatility_short: vol_short[i],
                    moving_avg_long: ma_long[i],
                    volatility_long: vol_long[i],
                    rolling_avg: roll_avg[i],
                    rolling_stddev: roll_std[i],
                })
                .collect();
            partitions.insert(category.to_string(), series);
        }

        tracing::debug!(
            categories = partitions.len(),
            short = short.size(),
            long = long.size(),
            anomaly = anomaly.size(),
            "computed daily window metrics"
        );
        Ok(Self { partitions })
    }

    /// Metrics of `category` ordered by day.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] for an unknown category.
    pub fn partition(&self, category: &str) -> Result<&[DailyWindowMetric]> {
        self.partitions
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalyticsError::missing(category, "daily window"))
    }

    /// Metrics of the day containing `date`.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] if no such day exists.
    pub fn get(&self, category: &str, date: NaiveDate) -> Result<&DailyWindowMetric> {
        let day = Granularity::Day.bucket_start(date);
        let series = self.partition(category)?;
        series
            .binary_search_by(|m| m.date.cmp(&day))
            .map(|i| &series[i])
            .map_err(|_| AnalyticsError::missing(category, "daily window"))
    }

    /// Iterate every metric in category then day order.
    pub fn iter(&self) -> impl Iterator<Item = &DailyWindowMetric> {
        self.partitions.values().flatten()
    }
}
