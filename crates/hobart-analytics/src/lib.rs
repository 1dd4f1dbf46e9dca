#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bucket;
pub mod category;
pub mod classify;
pub mod cohort;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod ranking;
pub mod stats;
pub mod window;

pub use bucket::{BucketTable, BucketedAggregates, Granularity, TimeBucketAggregate};
pub use category::{CategoryStatistics, CategoryStatsTable};
pub use classify::{
    AgeBand, AnomalyFlag, ClassificationResult, Classifier, OutlierFlag, Performance,
    QualityLabel, QuartileBand, SeasonalFactors, SizeLabel, TrendDirection, VolumeLabel,
};
pub use cohort::{MonthlyCohort, RiskBand, monthly_cohorts};
pub use config::{PipelineConfig, PipelineSettings, ThresholdConfig, WindowConfig};
pub use error::{AnalyticsError, ConfigError, Result};
pub use pipeline::{Pipeline, PipelineOutput};
pub use ranking::PeerRanks;
pub use window::{
    DailyWindowMetric, DailyWindowTable, MonthlyWindowMetric, MonthlyWindowTable,
    ObservationLag, ObservationLagTable, TrailingWindow, WindowStatistic,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
