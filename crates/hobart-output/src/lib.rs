#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod export;
pub mod frame;
pub mod row;
pub mod summary;

pub use assemble::{ReportAssembler, finalize};
pub use export::{ExportError, ExportFormat, Exporter};
pub use frame::rows_to_frame;
pub use row::{REPORT_COLUMNS, ReportRow};
pub use summary::{CategorySummary, RunSummary, cohort_ascii_table};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
