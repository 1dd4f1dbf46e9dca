//! The flat report row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names of a [`ReportRow`], in output order.
pub const REPORT_COLUMNS: [&str; 94] = [
    "id",
    "category",
    "metric",
    "created_at",
    "updated_at",
    "obs_date",
    "obs_year",
    "obs_quarter",
    "obs_month",
    "obs_month_name",
    "obs_iso_year",
    "obs_iso_week",
    "obs_day",
    "obs_weekday",
    "obs_weekday_name",
    "obs_day_of_year",
    "obs_hour",
    "is_weekend",
    "run_date",
    "run_year",
    "run_month",
    "run_iso_week",
    "run_day",
    "days_since_created",
    "hours_since_update",
    "update_lag_hours",
    "age_band",
    "category_count",
    "category_mean",
    "category_min",
    "category_max",
    "category_stddev",
    "category_p25",
    "category_median",
    "category_p75",
    "category_iqr",
    "metric_to_mean_ratio",
    "metric_to_median_ratio",
    "deviation_from_mean",
    "z_score",
    "percentile_position",
    "range_position",
    "category_share_pct",
    "quartile_band",
    "size_label",
    "volume_label",
    "quality_label",
    "performance",
    "outlier_flag",
    "previous_metric",
    "metric_change",
    "metric_change_pct",
    "running_total",
    "running_count",
    "running_avg",
    "daily_count",
    "daily_sum",
    "daily_avg",
    "daily_cumulative_sum",
    "daily_cumulative_count",
    "prev_daily_sum",
    "daily_delta",
    "moving_avg_short",
    "volatility_short",
    "moving_avg_long",
    "volatility_long",
    "rolling_avg_anomaly",
    "rolling_stddev_anomaly",
    "anomaly_flag",
    "metric_to_moving_avg_ratio",
    "weekly_bucket",
    "weekly_count",
    "weekly_sum",
    "weekly_avg",
    "monthly_bucket",
    "monthly_count",
    "monthly_sum",
    "monthly_avg",
    "prev_monthly_avg",
    "monthly_delta",
    "trend_direction",
    "growth_rate",
    "forecast_next",
    "seasonal_factor",
    "seasonal_index",
    "month_share_pct",
    "row_number",
    "category_rank",
    "global_rank",
    "global_dense_rank",
    "decile",
    "quartile",
    "cume_dist",
    "percent_rank",
];

/// One output row per filtered observation.
///
/// Ratios and statistics are rounded for display; `None` marks a value
/// that is undefined (no previous bucket, zero denominator, fewer than two
/// values for a standard deviation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Observation id
    pub id: String,
    /// Category label
    pub category: String,
    /// Raw metric
    pub metric: f64,
    /// Creation timestamp, `%Y-%m-%d %H:%M:%S`
    pub created_at: String,
    /// Update timestamp, `%Y-%m-%d %H:%M:%S`
    pub updated_at: String,

    /// Calendar date of creation
    pub obs_date: NaiveDate,
    /// Year
    pub obs_year: i32,
    /// Quarter (1-4)
    pub obs_quarter: u32,
    /// Month (1-12)
    pub obs_month: u32,
    /// English month name
    pub obs_month_name: String,
    /// ISO week-numbering year
    pub obs_iso_year: i32,
    /// ISO week
    pub obs_iso_week: u32,
    /// Day of month
    pub obs_day: u32,
    /// ISO weekday (Monday = 1)
    pub obs_weekday: u32,
    /// English weekday name
    pub obs_weekday_name: String,
    /// Day of year
    pub obs_day_of_year: u32,
    /// Hour of day
    pub obs_hour: u32,
    /// Saturday or Sunday
    pub is_weekend: bool,

    /// Date of the run timestamp
    pub run_date: NaiveDate,
    /// Year of the run timestamp
    pub run_year: i32,
    /// Month of the run timestamp
    pub run_month: u32,
    /// ISO week of the run timestamp
    pub run_iso_week: u32,
    /// Day of month of the run timestamp
    pub run_day: u32,
    /// Whole days from creation date to run date
    pub days_since_created: i64,
    /// Whole hours from last update to the run timestamp
    pub hours_since_update: i64,
    /// Hours between creation and last update
    pub update_lag_hours: f64,
    /// Age band by `days_since_created`
    pub age_band: String,

    /// Observations in the category
    pub category_count: usize,
    /// Category mean
    pub category_mean: f64,
    /// Category minimum
    pub category_min: f64,
    /// Category maximum
    pub category_max: f64,
    /// Category sample standard deviation
    pub category_stddev: Option<f64>,
    /// Category 25th percentile
    pub category_p25: f64,
    /// Category median
    pub category_median: f64,
    /// Category 75th percentile
    pub category_p75: f64,
    /// Category interquartile range
    pub category_iqr: f64,
    /// Metric over category mean
    pub metric_to_mean_ratio: Option<f64>,
    /// Metric over category median
    pub metric_to_median_ratio: Option<f64>,
    /// Metric minus category mean
    pub deviation_from_mean: f64,
    /// Standard score within the category
    pub z_score: Option<f64>,
    /// Position between p25 and p75
    pub percentile_position: Option<f64>,
    /// Position between min and max
    pub range_position: Option<f64>,
    /// Share of the category total, in percent
    pub category_share_pct: Option<f64>,
    /// Quartile band label
    pub quartile_band: String,
    /// Size label by mean ratio
    pub size_label: String,
    /// Volume label by category count
    pub volume_label: String,
    /// Quality label by z-score
    pub quality_label: String,
    /// Performance against the category mean
    pub performance: String,
    /// Outlier flag
    pub outlier_flag: String,

    /// Metric of the previous observation in the category
    pub previous_metric: Option<f64>,
    /// Change from the previous observation
    pub metric_change: Option<f64>,
    /// Change from the previous observation, in percent
    pub metric_change_pct: Option<f64>,
    /// Running metric total in the category
    pub running_total: f64,
    /// Running observation count in the category
    pub running_count: usize,
    /// Running average in the category
    pub running_avg: f64,

    /// Observations on the day
    pub daily_count: usize,
    /// Day sum
    pub daily_sum: f64,
    /// Day mean
    pub daily_avg: f64,
    /// Cumulative day sums
    pub daily_cumulative_sum: f64,
    /// Cumulative day counts
    pub daily_cumulative_count: usize,
    /// Previous day bucket's sum
    pub prev_daily_sum: Option<f64>,
    /// Change from the previous day bucket
    pub daily_delta: Option<f64>,
    /// Short moving average of day sums
    pub moving_avg_short: Option<f64>,
    /// Short window volatility of day sums
    pub volatility_short: Option<f64>,
    /// Long moving average of day sums
    pub moving_avg_long: Option<f64>,
    /// Long window volatility of day sums
    pub volatility_long: Option<f64>,
    /// Rolling anomaly baseline mean
    pub rolling_avg_anomaly: Option<f64>,
    /// Rolling anomaly baseline standard deviation
    pub rolling_stddev_anomaly: Option<f64>,
    /// Anomaly flag of the day
    pub anomaly_flag: String,
    /// Metric over the short moving average
    pub metric_to_moving_avg_ratio: Option<f64>,

    /// ISO week label, `YYYY-Www`
    pub weekly_bucket: String,
    /// Observations in the week
    pub weekly_count: usize,
    /// Week sum
    pub weekly_sum: f64,
    /// Week mean
    pub weekly_avg: f64,

    /// Month label, `YYYY-MM`
    pub monthly_bucket: String,
    /// Observations in the month
    pub monthly_count: usize,
    /// Month sum
    pub monthly_sum: f64,
    /// Month mean
    pub monthly_avg: f64,
    /// Previous month bucket's mean
    pub prev_monthly_avg: Option<f64>,
    /// Change from the previous month's mean
    pub monthly_delta: Option<f64>,
    /// Trend of the month
    pub trend_direction: String,
    /// Month-over-month growth of sums
    pub growth_rate: Option<f64>,
    /// Next month projection
    pub forecast_next: f64,
    /// Mean of monthly averages for this calendar month
    pub seasonal_factor: Option<f64>,
    /// Month mean over the seasonal factor
    pub seasonal_index: Option<f64>,
    /// Month share of the category total, in percent
    pub month_share_pct: Option<f64>,

    /// Position over all rows by category, creation time and id
    pub row_number: usize,
    /// Rank by metric descending within the category
    pub category_rank: usize,
    /// Rank over all rows by category and metric
    pub global_rank: usize,
    /// Dense rank over all rows by category and metric
    pub global_dense_rank: usize,
    /// Decile over all rows by category, metric and id
    pub decile: usize,
    /// Quartile over all rows by category, metric and id
    pub quartile: usize,
    /// Cumulative distribution by category and metric
    pub cume_dist: f64,
    /// Percent rank by category and metric
    pub percent_rank: f64,
}
