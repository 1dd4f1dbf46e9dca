//! Daily, ISO-weekly and monthly roll-ups per category.

use crate::error::{AnalyticsError, Result};
use chrono::{Datelike, Days, NaiveDate};
use hobart_data::ObservationSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Calendar day
    #[display("daily")]
    Day,
    /// ISO 8601 week, starting Monday
    #[display("weekly")]
    Week,
    /// Calendar month
    #[display("monthly")]
    Month,
}

impl Granularity {
    /// First date of the bucket containing `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Display label of the bucket starting at `start`.
    ///
    /// Weeks use the ISO year, so the week of 2024-12-30 is `2025-W01`.
    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            Self::Day => start.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let iso = start.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Self::Month => format!("{}-{:02}", start.year(), start.month()),
        }
    }
}

/// Count, sum and mean of one category's metrics within one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucketAggregate {
    /// Category label
    pub category: String,
    /// First date of the bucket
    pub start: NaiveDate,
    /// Number of observations
    pub count: usize,
    /// Sum of metrics
    pub sum: f64,
    /// Mean metric
    pub mean: f64,
}

/// Buckets of one granularity, per category, ordered by start date.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketTable {
    granularity: Granularity,
    partitions: BTreeMap<String, Vec<TimeBucketAggregate>>,
}

impl BucketTable {
    /// Group the snapshot by (category, bucket).
    pub fn compute(snapshot: &ObservationSnapshot, granularity: Granularity) -> Self {
        let mut grouped: BTreeMap<String, BTreeMap<NaiveDate, (usize, f64)>> = BTreeMap::new();
        for row in snapshot {
            let start = granularity.bucket_start(row.calendar.date);
            let entry = grouped
                .entry(row.category().to_string())
                .or_default()
                .entry(start)
                .or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += row.metric();
        }

        let partitions: BTreeMap<String, Vec<TimeBucketAggregate>> = grouped
            .into_iter()
            .map(|(category, buckets)| {
                let series = buckets
                    .into_iter()
                    .map(|(start, (count, sum))| TimeBucketAggregate {
                        category: category.clone(),
                        start,
                        count,
                        sum,
                        mean: sum / count as f64,
                    })
                    .collect();
                (category, series)
            })
            .collect();

        tracing::debug!(
            granularity = %granularity,
            buckets = partitions.values().map(Vec::len).sum::<usize>(),
            "aggregated time buckets"
        );

        Self {
            granularity,
            partitions,
        }
    }

    /// Bucket width of this table.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Buckets of `category`, ordered by start date.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] for an unknown category.
    pub fn partition(&self, category: &str) -> Result<&[TimeBucketAggregate]> {
        self.partitions
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalyticsError::missing(category, self.stage()))
    }

    /// Position of the bucket containing `date` within its partition.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] if no such bucket exists.
    pub fn position(&self, category: &str, date: NaiveDate) -> Result<usize> {
        let start = self.granularity.bucket_start(date);
        self.partition(category)?
            .binary_search_by(|b| b.start.cmp(&start))
            .map_err(|_| AnalyticsError::missing(category, self.stage()))
    }

    /// The bucket containing `date`.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] if no such bucket exists.
    pub fn get(&self, category: &str, date: NaiveDate) -> Result<&TimeBucketAggregate> {
        let index = self.position(category, date)?;
        Ok(&self.partition(category)?[index])
    }

    /// Iterate partitions in category order.
    pub fn partitions(&self) -> impl Iterator<Item = (&str, &[TimeBucketAggregate])> {
        self.partitions
            .iter()
            .map(|(category, series)| (category.as_str(), series.as_slice()))
    }

    const fn stage(&self) -> &'static str {
        match self.granularity {
            Granularity::Day => "daily bucket",
            Granularity::Week => "weekly bucket",
            Granularity::Month => "monthly bucket",
        }
    }
}

/// The three bucket tables of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedAggregates {
    /// Day buckets
    pub daily: BucketTable,
    /// ISO week buckets
    pub weekly: BucketTable,
    /// Month buckets
    pub monthly: BucketTable,
}

impl BucketedAggregates {
    /// Compute all three granularities.
    pub fn compute(snapshot: &ObservationSnapshot) -> Self {
        Self {
            daily: BucketTable::compute(snapshot, Granularity::Day),
            weekly: BucketTable::compute(snapshot, Granularity::Week),
            monthly: BucketTable::compute(snapshot, Granularity::Month),
        }
    }
}
