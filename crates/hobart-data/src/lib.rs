#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod observation;
pub mod risk;
pub mod snapshot;
pub mod source;

pub use error::{DataError, Result};
pub use observation::{CalendarFields, Observation, TIMESTAMP_DISPLAY_FORMAT, parse_timestamp};
pub use risk::{CustomerRiskRecord, load_risk_records, read_risk_records};
pub use snapshot::{FilteredObservation, ObservationSnapshot};
pub use source::{
    CsvSource, FrameSource, ObservationSource, SqliteStore, StoreStats, observations_to_frame,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
