//! Observation sources.
//!
//! Where observations come from is outside the pipeline's concern; each
//! source performs one bulk read and hands back the full record set.

pub mod csv;
pub mod frame;
pub mod sqlite;

pub use self::csv::CsvSource;
pub use frame::{FrameSource, observations_to_frame};
pub use sqlite::{SqliteStore, StoreStats};

use crate::error::Result;
use crate::observation::Observation;

/// A bulk-readable collection of observations.
pub trait ObservationSource {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Read every observation the source holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read or a record
    /// cannot be parsed.
    fn load(&self) -> Result<Vec<Observation>>;
}

impl ObservationSource for Vec<Observation> {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<Vec<Observation>> {
        Ok(self.clone())
    }
}
