//! CSV observation source.
//!
//! Expects a header row with `id,created_at,updated_at,metric,category`.
//! Column order is free; extra columns are ignored.

use super::ObservationSource;
use crate::error::{DataError, Result};
use crate::observation::{Observation, finite_metric, parse_timestamp};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Raw CSV row before timestamp parsing.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    id: String,
    created_at: String,
    updated_at: Option<String>,
    metric: f64,
    category: String,
}

impl CsvRecord {
    fn into_observation(self, line: usize) -> Result<Observation> {
        let created_at = parse_timestamp(&self.created_at)
            .map_err(|e| DataError::Parse(format!("line {}: created_at: {}", line, e)))?;
        // A missing update timestamp means the record was never touched
        let updated_at = match self.updated_at.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => parse_timestamp(value)
                .map_err(|e| DataError::Parse(format!("line {}: updated_at: {}", line, e)))?,
            _ => created_at,
        };

        let metric = finite_metric(self.metric, format_args!("line {}", line))?;

        Ok(Observation {
            id: self.id,
            created_at,
            updated_at,
            metric,
            category: self.category,
        })
    }
}

/// Reads observations from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Create a source for the CSV file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the CSV file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse observations from any reader holding CSV data.
    pub fn read_from<R: Read>(reader: R) -> Result<Vec<Observation>> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut observations = Vec::new();
        for (index, record) in rdr.deserialize::<CsvRecord>().enumerate() {
            // Header is line 1
            observations.push(record?.into_observation(index + 2)?);
        }

        Ok(observations)
    }
}

impl ObservationSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self) -> Result<Vec<Observation>> {
        let file = std::fs::File::open(&self.path)?;
        let observations = Self::read_from(file)?;
        tracing::debug!(
            path = %self.path.display(),
            count = observations.len(),
            "loaded observations from csv"
        );
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_read_from_csv() {
        let data = "\
id,created_at,updated_at,metric,category
1,2024-01-01 10:00:00,2024-01-02 10:00:00,10.5,alpha
2,2024-01-02,,20,beta
";
        let observations = CsvSource::read_from(data.as_bytes()).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].id, "1");
        assert_eq!(observations[0].metric, 10.5);
        assert_eq!(observations[0].category, "alpha");
        assert!(observations[0].updated_at > observations[0].created_at);
        // Empty updated_at falls back to created_at
        assert_eq!(observations[1].updated_at, observations[1].created_at);
    }

    #[test]
    fn test_column_order_is_free() {
        let data = "\
category,metric,id,created_at,updated_at
alpha,1.5,x,2024-02-01T00:00:00,2024-02-01T00:00:00
";
        let observations = CsvSource::read_from(data.as_bytes()).unwrap();
        assert_eq!(observations[0].id, "x");
        assert_eq!(observations[0].metric, 1.5);
    }

    #[rstest]
    #[case("NaN")]
    #[case("inf")]
    #[case("-inf")]
    fn test_non_finite_metric_is_rejected(#[case] metric: &str) {
        let data = format!(
            "id,created_at,updated_at,metric,category\n1,2024-01-01,,1,a\n2,2024-01-02,,{},a\n",
            metric
        );
        let err = CsvSource::read_from(data.as_bytes()).unwrap_err();
        match err {
            DataError::Parse(msg) => {
                assert!(msg.contains("line 3"), "{}", msg);
                assert!(msg.contains("finite"), "{}", msg);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_reports_line() {
        let data = "\
id,created_at,updated_at,metric,category
1,2024-01-01,2024-01-01,1,a
2,not-a-date,2024-01-01,1,a
";
        let err = CsvSource::read_from(data.as_bytes()).unwrap_err();
        match err {
            DataError::Parse(msg) => assert!(msg.contains("line 3"), "{}", msg),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_metric_is_csv_error() {
        let data = "\
id,created_at,updated_at,metric,category
1,2024-01-01,2024-01-01,abc,a
";
        assert!(matches!(
            CsvSource::read_from(data.as_bytes()),
            Err(DataError::Csv(_))
        ));
    }
}
