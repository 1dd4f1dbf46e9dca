//! End-to-end run: load, compute, assemble.

use hobart_analytics::{AnalyticsError, Pipeline, PipelineConfig, PipelineOutput};
use hobart_data::{DataError, ObservationSource};
use hobart_output::{ExportError, ReportAssembler, ReportRow, RunSummary};
use thiserror::Error;

/// Any failure of a full run.
#[derive(Debug, Error)]
pub enum HobartError {
    /// Loading observations failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A pipeline stage failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Writing the report failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct Report {
    /// Every stage output.
    pub output: PipelineOutput,

    /// One row per filtered observation, in report order.
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Per-category overview of this run.
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_run(&self.output, &self.rows)
    }

    /// Consume the report, keeping only its rows.
    pub fn into_rows(self) -> Vec<ReportRow> {
        self.rows
    }
}

/// Run the pipeline on `source` and assemble the report.
///
/// # Errors
/// Returns an error if the source cannot be read or a stage fails. No rows
/// are returned on failure.
pub fn run_report(
    config: &PipelineConfig,
    source: &dyn ObservationSource,
) -> Result<Report, HobartError> {
    let output = Pipeline::new(config.clone()).run_source(source)?;
    let rows = ReportAssembler::new(&output).assemble()?;
    tracing::info!(rows = rows.len(), "report assembled");
    Ok(Report { output, rows })
}

/// Run the pipeline on `source` and return only the report rows.
///
/// # Errors
/// See [`run_report`].
pub fn report_from_source(
    config: &PipelineConfig,
    source: &dyn ObservationSource,
) -> Result<Vec<ReportRow>, HobartError> {
    run_report(config, source).map(Report::into_rows)
}
