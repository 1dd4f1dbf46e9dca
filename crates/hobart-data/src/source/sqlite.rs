//! SQLite-backed observation store.

use super::ObservationSource;
use crate::error::{DataError, Result};
use crate::observation::{Observation, TIMESTAMP_DISPLAY_FORMAT, finite_metric, parse_timestamp};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use std::path::Path;

/// Default table holding the metrics records.
pub const DEFAULT_TABLE: &str = "metrics";

/// Observation table in a SQLite database.
///
/// The table layout is `id TEXT, created_at TEXT, updated_at TEXT,
/// metric REAL, category TEXT`; timestamps are stored as
/// `YYYY-MM-DD HH:MM:SS`. Existing tables with integer ids or other
/// timestamp layouts accepted by [`parse_timestamp`] are also readable.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    table: String,
    since: Option<NaiveDateTime>,
}

/// Statistics about the stored observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of stored observations.
    pub total_observations: usize,
    /// Number of distinct categories.
    pub unique_categories: usize,
}

fn validate_table(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DataError::InvalidTable(table.to_string()))
    }
}

impl SqliteStore {
    /// Open (or create) a database file using the default table.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            table: DEFAULT_TABLE.to_string(),
            since: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            table: DEFAULT_TABLE.to_string(),
            since: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Read from and write to `table` instead of the default.
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        validate_table(table)?;
        self.table = table.to_string();
        self.initialize_schema()?;
        Ok(self)
    }

    /// Only load rows created on or after the date of `cutoff`.
    ///
    /// The query compares on the date prefix so every stored timestamp
    /// layout is covered; callers apply the exact cutoff afterwards.
    pub fn with_since(mut self, cutoff: NaiveDateTime) -> Self {
        self.since = Some(cutoff);
        self
    }

    /// Name of the table in use.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    metric REAL NOT NULL,
                    category TEXT NOT NULL
                )",
                table = self.table
            ),
            [],
        )?;

        self.conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at)",
                table = self.table
            ),
            [],
        )?;

        Ok(())
    }

    /// Insert or replace observations in one transaction.
    pub fn put_observations(&self, observations: &[Observation]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO {table} (id, created_at, updated_at, metric, category)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                table = self.table
            ))?;

            for obs in observations {
                stmt.execute(params![
                    obs.id,
                    obs.created_at.format(TIMESTAMP_DISPLAY_FORMAT).to_string(),
                    obs.updated_at.format(TIMESTAMP_DISPLAY_FORMAT).to_string(),
                    obs.metric,
                    obs.category,
                ])?;
            }
        }
        tx.commit()?;
        Ok(observations.len())
    }

    /// Read observations, honouring [`SqliteStore::with_since`].
    pub fn get_observations(&self) -> Result<Vec<Observation>> {
        let since = self
            .since
            .map(|ts| ts.date().format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let mut stmt = self.conn.prepare(&format!(
            "SELECT CAST(id AS TEXT), CAST(created_at AS TEXT), CAST(updated_at AS TEXT),
                    CAST(metric AS REAL), CAST(category AS TEXT)
             FROM {table}
             WHERE created_at >= ?1
             ORDER BY category, created_at, id",
            table = self.table
        ))?;

        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut observations = Vec::new();
        for row in rows {
            let (id, created, updated, metric, category) = row?;
            let metric = finite_metric(metric, format_args!("id {}", id))?;
            let created_at = parse_timestamp(&created)?;
            let updated_at = match updated {
                Some(value) => parse_timestamp(&value)?,
                None => created_at,
            };
            observations.push(Observation {
                id,
                created_at,
                updated_at,
                metric,
                category,
            });
        }

        Ok(observations)
    }

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let (total, categories): (i64, i64) = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), COUNT(DISTINCT category) FROM {table}",
                table = self.table
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            total_observations: total as usize,
            unique_categories: categories as usize,
        })
    }
}

impl ObservationSource for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> Result<Vec<Observation>> {
        let observations = self.get_observations()?;
        tracing::debug!(
            table = %self.table,
            count = observations.len(),
            "loaded observations from sqlite"
        );
        Ok(observations)
    }
}
