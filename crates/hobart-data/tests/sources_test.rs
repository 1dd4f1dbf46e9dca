//! Integration tests for observation sources feeding a snapshot.

use hobart_data::{
    CsvSource, DataError, FrameSource, ObservationSnapshot, ObservationSource, SqliteStore,
    observations_to_frame, parse_timestamp,
};
use std::io::Write;

const SAMPLE_CSV: &str = "\
id,created_at,updated_at,metric,category
1,2022-12-31 10:00:00,2022-12-31 10:00:00,99,legacy
2,2023-01-01 00:00:00,2023-01-01 06:00:00,10,alpha
3,2023-01-02 09:00:00,2023-01-02 09:00:00,20,alpha
4,2023-01-03 09:00:00,,30,alpha
5,2023-02-01 12:00:00,2023-02-01 12:00:00,5,beta
";

#[test]
fn test_csv_file_to_snapshot() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE_CSV.as_bytes()).unwrap();

    let source = CsvSource::new(file.path());
    let observations = source.load().unwrap();
    assert_eq!(observations.len(), 5);

    let snapshot =
        ObservationSnapshot::filter(observations, parse_timestamp("2023-01-01").unwrap());
    assert_eq!(snapshot.len(), 4);
    assert_eq!(snapshot.categories(), vec!["alpha", "beta"]);
}

#[test]
fn test_missing_csv_file_is_io_error() {
    let source = CsvSource::new("/definitely/not/here.csv");
    assert!(matches!(source.load(), Err(DataError::Io(_))));
}

#[test]
fn test_sources_agree() {
    let observations = CsvSource::read_from(SAMPLE_CSV.as_bytes()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("metrics.db")).unwrap();
    store.put_observations(&observations).unwrap();

    let frame = FrameSource::new(observations_to_frame(&observations).unwrap());

    let cutoff = parse_timestamp("2023-01-01").unwrap();
    let from_csv = ObservationSnapshot::filter(observations.clone(), cutoff);
    let from_sqlite = ObservationSnapshot::filter(store.load().unwrap(), cutoff);
    let from_frame = ObservationSnapshot::filter(frame.load().unwrap(), cutoff);

    assert_eq!(from_csv.rows(), from_sqlite.rows());
    assert_eq!(from_csv.rows(), from_frame.rows());
}
