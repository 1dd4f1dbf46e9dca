//! Derived labels.
//!
//! Comparisons are made on unrounded values. Exact float equality is
//! intentional for [`Performance::Equal`] and [`QuartileBand::Median`].

use crate::category::CategoryStatistics;
use crate::config::ThresholdConfig;
use crate::window::{DailyWindowMetric, MonthlyWindowMetric, MonthlyWindowTable};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric relative to its category mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    /// Above the mean
    #[display("above")]
    Above,
    /// Exactly the mean
    #[display("equal")]
    Equal,
    /// Below the mean
    #[display("below")]
    Below,
}

impl Performance {
    /// Classify `metric` against `mean`.
    pub fn classify(metric: f64, mean: f64) -> Self {
        if metric > mean {
            Self::Above
        } else if metric == mean {
            Self::Equal
        } else {
            Self::Below
        }
    }
}

/// Observation outlier flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum OutlierFlag {
    /// More than the threshold away from the mean
    #[display("Outlier")]
    Outlier,
    /// Within the threshold, or no spread to compare against
    #[display("Normal")]
    Normal,
}

impl OutlierFlag {
    /// `Outlier` when `|metric - mean| > sigma * stddev`.
    pub fn classify(metric: f64, mean: f64, stddev: Option<f64>, sigma: f64) -> Self {
        match stddev {
            Some(std) if (metric - mean).abs() > sigma * std => Self::Outlier,
            _ => Self::Normal,
        }
    }
}

/// Daily anomaly flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum AnomalyFlag {
    /// Day sum far from its rolling baseline
    #[display("Anomaly")]
    Anomaly,
    /// Within the baseline band, or no baseline spread
    #[display("Normal")]
    Normal,
}

impl AnomalyFlag {
    /// `Anomaly` when `|sum - rolling_avg| > sigma * rolling_stddev`.
    pub fn classify(
        sum: f64,
        rolling_avg: Option<f64>,
        rolling_stddev: Option<f64>,
        sigma: f64,
    ) -> Self {
        match (rolling_avg, rolling_stddev) {
            (Some(avg), Some(std)) if (sum - avg).abs() > sigma * std => Self::Anomaly,
            _ => Self::Normal,
        }
    }

    /// Flag of a daily window metric.
    pub fn for_day(day: &DailyWindowMetric, sigma: f64) -> Self {
        Self::classify(day.sum, day.rolling_avg, day.rolling_stddev, sigma)
    }
}

/// Direction of a period-over-period delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Positive delta
    #[display("increasing")]
    Increasing,
    /// Zero or absent delta
    #[display("stable")]
    Stable,
    /// Negative delta
    #[display("decreasing")]
    Decreasing,
}

impl TrendDirection {
    /// Direction of `delta`; an absent delta is stable.
    pub fn from_delta(delta: Option<f64>) -> Self {
        match delta {
            Some(d) if d > 0.0 => Self::Increasing,
            Some(d) if d < 0.0 => Self::Decreasing,
            _ => Self::Stable,
        }
    }
}

/// Position of a metric within its category's quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum QuartileBand {
    /// Below p25
    #[display("Bottom Quartile")]
    BottomQuartile,
    /// Between p25 and the median
    #[display("Lower Middle")]
    LowerMiddle,
    /// Exactly the median
    #[display("Median")]
    Median,
    /// Above the median, up to p75
    #[display("Upper Middle")]
    UpperMiddle,
    /// Above p75
    #[display("Top Quartile")]
    TopQuartile,
}

impl QuartileBand {
    /// Band of `metric` against the category quartiles.
    pub fn classify(metric: f64, stats: &CategoryStatistics) -> Self {
        if metric < stats.p25 {
            Self::BottomQuartile
        } else if metric < stats.median {
            Self::LowerMiddle
        } else if metric == stats.median {
            Self::Median
        } else if metric <= stats.p75 {
            Self::UpperMiddle
        } else {
            Self::TopQuartile
        }
    }
}

/// Size relative to the category mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum SizeLabel {
    /// At least 1.5x the mean
    Large,
    /// At least half the mean
    Medium,
    /// Under half the mean
    Small,
    /// Ratio undefined
    Unknown,
}

impl SizeLabel {
    /// Label a metric-to-mean ratio.
    pub fn classify(ratio: Option<f64>) -> Self {
        match ratio {
            None => Self::Unknown,
            Some(r) if r >= 1.5 => Self::Large,
            Some(r) if r >= 0.5 => Self::Medium,
            Some(_) => Self::Small,
        }
    }
}

/// Category size by observation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum VolumeLabel {
    /// 1000 or more observations
    #[display("High Volume")]
    High,
    /// 100 or more observations
    #[display("Medium Volume")]
    Medium,
    /// Fewer than 100 observations
    #[display("Low Volume")]
    Low,
}

impl VolumeLabel {
    /// Label a category count.
    pub const fn classify(count: usize) -> Self {
        if count >= 1000 {
            Self::High
        } else if count >= 100 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// How typical a metric is, by absolute z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum QualityLabel {
    /// Within one standard deviation
    Typical,
    /// Within two standard deviations
    Unusual,
    /// Beyond two standard deviations
    Extreme,
    /// No z-score
    #[display("Insufficient Data")]
    InsufficientData,
}

impl QualityLabel {
    /// Label a z-score.
    pub fn classify(z_score: Option<f64>) -> Self {
        match z_score.map(f64::abs) {
            None => Self::InsufficientData,
            Some(z) if z <= 1.0 => Self::Typical,
            Some(z) if z <= 2.0 => Self::Unusual,
            Some(_) => Self::Extreme,
        }
    }
}

/// Age of an observation relative to the run date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum AgeBand {
    /// Up to 7 days
    #[display("new")]
    New,
    /// Up to 30 days
    #[display("recent")]
    Recent,
    /// Up to 90 days
    #[display("aging")]
    Aging,
    /// Older
    #[display("stale")]
    Stale,
}

impl AgeBand {
    /// Band of an age in days.
    pub const fn classify(days: i64) -> Self {
        if days <= 7 {
            Self::New
        } else if days <= 30 {
            Self::Recent
        } else if days <= 90 {
            Self::Aging
        } else {
            Self::Stale
        }
    }
}

/// Mean monthly average per (category, calendar month) across all years.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonalFactors {
    factors: BTreeMap<(String, u32), f64>,
}

impl SeasonalFactors {
    /// Average the monthly means of each calendar month.
    pub fn compute(monthly: &MonthlyWindowTable) -> Self {
        let mut acc: BTreeMap<(String, u32), (f64, usize)> = BTreeMap::new();
        for metric in monthly.iter() {
            let entry = acc
                .entry((metric.category.clone(), metric.month.month()))
                .or_insert((0.0, 0));
            entry.0 += metric.mean;
            entry.1 += 1;
        }

        let factors = acc
            .into_iter()
            .map(|(key, (total, n))| (key, total / n as f64))
            .collect();
        Self { factors }
    }

    /// Factor of `category` in calendar month `month` (1-12).
    pub fn get(&self, category: &str, month: u32) -> Option<f64> {
        self.factors.get(&(category.to_string(), month)).copied()
    }
}

/// Labels and projections attached to one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Metric relative to the category mean
    pub performance: Performance,
    /// Observation outlier flag
    pub outlier: OutlierFlag,
    /// Anomaly flag of the observation's day
    pub anomaly: AnomalyFlag,
    /// Trend of the observation's month
    pub trend: TrendDirection,
    /// Growth rate of the observation's month
    pub growth_rate: Option<f64>,
    /// Forecast from the observation's month
    pub forecast: f64,
}

/// Applies the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    thresholds: ThresholdConfig,
}

impl Classifier {
    /// Create a classifier.
    pub const fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// Classify one observation from its upstream metrics.
    pub fn classify(
        &self,
        metric: f64,
        stats: &CategoryStatistics,
        day: &DailyWindowMetric,
        month: &MonthlyWindowMetric,
    ) -> ClassificationResult {
        ClassificationResult {
            performance: Performance::classify(metric, stats.mean),
            outlier: OutlierFlag::classify(
                metric,
                stats.mean,
                stats.stddev,
                self.thresholds.outlier_sigma,
            ),
            anomaly: AnomalyFlag::for_day(day, self.thresholds.anomaly_sigma),
            trend: month.trend,
            growth_rate: month.growth_rate,
            forecast: month.forecast,
        }
    }
}
