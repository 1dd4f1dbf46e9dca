//! Cutoff filtering and the immutable snapshot every pipeline stage reads.

use crate::error::{DataError, Result};
use crate::observation::{CalendarFields, Observation};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};

/// An observation that passed the cutoff filter, with its calendar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredObservation {
    /// The source record.
    pub observation: Observation,
    /// Calendar breakdown of `observation.created_at`.
    pub calendar: CalendarFields,
}

impl FilteredObservation {
    /// Annotate an observation with its calendar fields.
    pub fn new(observation: Observation) -> Self {
        let calendar = observation.calendar();
        Self {
            observation,
            calendar,
        }
    }

    /// Category label.
    pub fn category(&self) -> &str {
        &self.observation.category
    }

    /// Metric value.
    pub const fn metric(&self) -> f64 {
        self.observation.metric
    }
}

/// Filtered observations ordered by category, creation time, then id.
///
/// The ordering makes every downstream stage independent of input order.
#[derive(Debug, Clone, Default)]
pub struct ObservationSnapshot {
    cutoff: Option<NaiveDateTime>,
    rows: Vec<FilteredObservation>,
}

impl ObservationSnapshot {
    /// Keep observations created at or after `cutoff`.
    ///
    /// A cutoff that excludes everything yields an empty snapshot.
    pub fn filter<I>(observations: I, cutoff: NaiveDateTime) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut total = 0usize;
        let mut rows: Vec<FilteredObservation> = observations
            .into_iter()
            .inspect(|_| total += 1)
            .filter(|obs| obs.created_at >= cutoff)
            .map(FilteredObservation::new)
            .collect();

        rows.sort_by(|a, b| {
            a.observation
                .category
                .cmp(&b.observation.category)
                .then_with(|| a.observation.created_at.cmp(&b.observation.created_at))
                .then_with(|| a.observation.id.cmp(&b.observation.id))
        });

        tracing::debug!(
            total,
            kept = rows.len(),
            cutoff = %cutoff,
            "filtered observations"
        );

        Self {
            cutoff: Some(cutoff),
            rows,
        }
    }

    /// Cutoff the snapshot was filtered with.
    pub const fn cutoff(&self) -> Option<NaiveDateTime> {
        self.cutoff
    }

    /// Number of observations kept.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the filter removed everything.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All kept observations in snapshot order.
    pub fn rows(&self) -> &[FilteredObservation] {
        &self.rows
    }

    /// Iterate over kept observations in snapshot order.
    pub fn iter(&self) -> std::slice::Iter<'_, FilteredObservation> {
        self.rows.iter()
    }

    /// Fail on the first identifier held by more than one observation.
    ///
    /// # Errors
    /// Returns [`DataError::DuplicateId`] naming the repeated id.
    pub fn ensure_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if !seen.insert(row.observation.id.as_str()) {
                return Err(DataError::DuplicateId(row.observation.id.clone()));
            }
        }
        Ok(())
    }

    /// Observations grouped by category, each group in snapshot order.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&FilteredObservation>> {
        let mut groups: BTreeMap<&str, Vec<&FilteredObservation>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.category()).or_default().push(row);
        }
        groups
    }

    /// Distinct categories in sorted order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.rows.iter().map(|r| r.category()).collect();
        categories.dedup();
        categories
    }
}

impl<'a> IntoIterator for &'a ObservationSnapshot {
    type Item = &'a FilteredObservation;
    type IntoIter = std::slice::Iter<'a, FilteredObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::parse_timestamp;

    fn obs(id: &str, created: &str, metric: f64, category: &str) -> Observation {
        let ts = parse_timestamp(created).unwrap();
        Observation::new(id, ts, ts, metric, category)
    }

    #[test]
    fn test_filter_is_inclusive_at_cutoff() {
        let cutoff = parse_timestamp("2024-01-01").unwrap();
        let snapshot = ObservationSnapshot::filter(
            vec![
                obs("1", "2023-12-31 23:59:59", 1.0, "A"),
                obs("2", "2024-01-01 00:00:00", 2.0, "A"),
                obs("3", "2024-01-02", 3.0, "A"),
            ],
            cutoff,
        );

        assert_eq!(snapshot.len(), 2);
        let ids: Vec<&str> = snapshot.iter().map(|r| r.observation.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(snapshot.cutoff(), Some(cutoff));
    }

    #[test]
    fn test_filter_excluding_everything_is_empty() {
        let cutoff = parse_timestamp("2030-01-01").unwrap();
        let snapshot = ObservationSnapshot::filter(vec![obs("1", "2024-01-01", 1.0, "A")], cutoff);
        assert!(snapshot.is_empty());
        assert!(snapshot.categories().is_empty());
    }

    #[test]
    fn test_snapshot_ordering_and_grouping() {
        let cutoff = parse_timestamp("2024-01-01").unwrap();
        let snapshot = ObservationSnapshot::filter(
            vec![
                obs("b2", "2024-01-03", 5.0, "B"),
                obs("a2", "2024-01-02", 2.0, "A"),
                obs("b1", "2024-01-01", 4.0, "B"),
                obs("a1", "2024-01-02", 1.0, "A"),
            ],
            cutoff,
        );

        let ids: Vec<&str> = snapshot.iter().map(|r| r.observation.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b1", "b2"]);
        assert_eq!(snapshot.categories(), vec!["A", "B"]);

        let groups = snapshot.by_category();
        assert_eq!(groups["A"].len(), 2);
        assert_eq!(groups["B"].len(), 2);
    }

    #[test]
    fn test_duplicate_ids_are_reported() {
        let cutoff = parse_timestamp("2024-01-01").unwrap();
        let unique = ObservationSnapshot::filter(
            vec![obs("x", "2024-01-02", 1.0, "A"), obs("y", "2024-01-02", 2.0, "B")],
            cutoff,
        );
        assert!(unique.ensure_unique_ids().is_ok());

        let duplicated = ObservationSnapshot::filter(
            vec![obs("x", "2024-01-02", 10.0, "A"), obs("x", "2024-01-03", 999.0, "B")],
            cutoff,
        );
        assert!(matches!(
            duplicated.ensure_unique_ids(),
            Err(DataError::DuplicateId(id)) if id == "x"
        ));
    }
}
