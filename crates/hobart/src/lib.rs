#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod run;

// Re-export main types from sub-crates
pub use hobart_analytics as analytics;
pub use hobart_data as data;
pub use hobart_output as output;

pub use hobart_analytics::{Pipeline, PipelineConfig, PipelineOutput, PipelineSettings};
pub use hobart_data::{Observation, ObservationSource};
pub use hobart_output::{ExportFormat, Exporter, ReportRow, RunSummary};
pub use run::{HobartError, Report, report_from_source, run_report};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
