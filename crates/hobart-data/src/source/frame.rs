//! Polars `DataFrame` interchange for observations.

use super::ObservationSource;
use crate::error::{DataError, Result};
use crate::observation::{Observation, finite_metric, parse_timestamp};
use polars::prelude::*;

/// Column names of an observation frame.
pub const OBSERVATION_COLUMNS: [&str; 5] = ["id", "created_at", "updated_at", "metric", "category"];

/// Reads observations out of an in-memory `DataFrame`.
///
/// Timestamp columns may be `Datetime`, `Date` or strings in any layout
/// [`parse_timestamp`] accepts; `id` may be any type castable to string.
#[derive(Debug, Clone)]
pub struct FrameSource {
    frame: DataFrame,
}

impl FrameSource {
    /// Wrap a frame.
    pub const fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// The wrapped frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }
}

fn string_column(df: &DataFrame, name: &str) -> Result<Column> {
    let column = df
        .column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))?;
    Ok(column.cast(&DataType::String)?)
}

impl ObservationSource for FrameSource {
    fn name(&self) -> &str {
        "frame"
    }

    fn load(&self) -> Result<Vec<Observation>> {
        let df = &self.frame;

        let ids = string_column(df, "id")?;
        let ids = ids.str()?;
        let created = string_column(df, "created_at")?;
        let created = created.str()?;
        let updated = string_column(df, "updated_at")?;
        let updated = updated.str()?;
        let categories = string_column(df, "category")?;
        let categories = categories.str()?;
        let metrics = df
            .column("metric")
            .map_err(|_| DataError::MissingColumn("metric".to_string()))?
            .cast(&DataType::Float64)?;
        let metrics = metrics.f64()?;

        let missing = |column: &str, row: usize| DataError::MissingValue {
            column: column.to_string(),
            row,
        };

        let mut observations = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let id = ids.get(i).ok_or_else(|| missing("id", i))?;
            let created_at = parse_timestamp(created.get(i).ok_or_else(|| missing("created_at", i))?)?;
            let updated_at = match updated.get(i) {
                Some(value) => parse_timestamp(value)?,
                None => created_at,
            };
            let metric = metrics.get(i).ok_or_else(|| missing("metric", i))?;
            let metric = finite_metric(metric, format_args!("row {}", i))?;
            let category = categories.get(i).ok_or_else(|| missing("category", i))?;

            observations.push(Observation {
                id: id.to_string(),
                created_at,
                updated_at,
                metric,
                category: category.to_string(),
            });
        }

        Ok(observations)
    }
}

/// Build a frame with [`OBSERVATION_COLUMNS`] from observations.
///
/// Timestamps become millisecond `Datetime` columns.
pub fn observations_to_frame(observations: &[Observation]) -> Result<DataFrame> {
    let ids: Vec<&str> = observations.iter().map(|o| o.id.as_str()).collect();
    let created: Vec<i64> = observations
        .iter()
        .map(|o| o.created_at.and_utc().timestamp_millis())
        .collect();
    let updated: Vec<i64> = observations
        .iter()
        .map(|o| o.updated_at.and_utc().timestamp_millis())
        .collect();
    let metrics: Vec<f64> = observations.iter().map(|o| o.metric).collect();
    let categories: Vec<&str> = observations.iter().map(|o| o.category.as_str()).collect();

    let datetime = DataType::Datetime(TimeUnit::Milliseconds, None);
    let df = DataFrame::new(vec![
        Column::new("id".into(), ids),
        Column::new("created_at".into(), created).cast(&datetime)?,
        Column::new("updated_at".into(), updated).cast(&datetime)?,
        Column::new("metric".into(), metrics),
        Column::new("category".into(), categories),
    ])?;

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_with_string_timestamps() {
        let df = DataFrame::new(vec![
            Column::new("id".into(), vec![1i64, 2]),
            Column::new("created_at".into(), vec!["2024-01-01 00:00:00", "2024-01-02"]),
            Column::new("updated_at".into(), vec![Some("2024-01-03"), None]),
            Column::new("metric".into(), vec![1i32, 2]),
            Column::new("category".into(), vec!["a", "b"]),
        ])
        .unwrap();

        let observations = FrameSource::new(df).load().unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].id, "1");
        assert_eq!(observations[1].metric, 2.0);
        assert_eq!(observations[1].updated_at, observations[1].created_at);
    }

    #[test]
    fn test_nan_metric_is_rejected() {
        let df = DataFrame::new(vec![
            Column::new("id".into(), vec!["1", "2"]),
            Column::new("created_at".into(), vec!["2024-01-01", "2024-01-02"]),
            Column::new("updated_at".into(), vec!["2024-01-01", "2024-01-02"]),
            Column::new("metric".into(), vec![1.0, f64::NAN]),
            Column::new("category".into(), vec!["a", "a"]),
        ])
        .unwrap();

        match FrameSource::new(df).load() {
            Err(DataError::Parse(msg)) => assert!(msg.contains("row 1"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_column() {
        let df = DataFrame::new(vec![Column::new("id".into(), vec!["1"])]).unwrap();
        assert!(matches!(
            FrameSource::new(df).load(),
            Err(DataError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_observations_survive_frame_conversion() {
        let ts = parse_timestamp("2024-05-06 07:08:09").unwrap();
        let original = vec![
            Observation::new("a", ts, ts, 1.25, "x"),
            Observation::new("b", ts, ts, -3.0, "y"),
        ];

        let df = observations_to_frame(&original).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names(), OBSERVATION_COLUMNS.to_vec());

        let loaded = FrameSource::new(df).load().unwrap();
        assert_eq!(loaded, original);
    }
}
