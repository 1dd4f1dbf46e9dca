//! Observation-level lag, running totals and rank within category.

use crate::error::{AnalyticsError, Result};
use crate::ranking::rank_desc;
use crate::stats::safe_div;
use hobart_data::ObservationSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Lag and running metrics of one observation within its category.
///
/// Observations are ordered by `created_at`, then `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationLag {
    /// Metric of the preceding observation
    pub previous_metric: Option<f64>,
    /// `metric - previous_metric`
    pub change: Option<f64>,
    /// `100 * change / previous_metric`, `None` when the previous metric is
    /// absent or zero
    pub change_pct: Option<f64>,
    /// Sum of metrics up to and including this observation
    pub running_total: f64,
    /// Number of observations up to and including this one
    pub running_count: usize,
    /// `running_total / running_count`
    pub running_avg: f64,
    /// `RANK()` by metric descending within the category
    pub category_rank: usize,
}

/// Per-observation lag metrics keyed by category, then observation id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationLagTable {
    partitions: BTreeMap<String, HashMap<String, ObservationLag>>,
}

impl ObservationLagTable {
    /// Compute lag metrics for every observation in the snapshot.
    pub fn compute(snapshot: &ObservationSnapshot) -> Self {
        let mut partitions = BTreeMap::new();

        for (category, partition) in snapshot.by_category() {
            let mut rows = HashMap::with_capacity(partition.len());
            let metrics: Vec<f64> = partition.iter().map(|r| r.metric()).collect();
            let ranks = rank_desc(&metrics);

            let mut running_total = 0.0;
            let mut previous: Option<f64> = None;
            for (i, row) in partition.iter().enumerate() {
                let metric = row.metric();
                running_total += metric;
                let running_count = i + 1;
                let change = previous.map(|p| metric - p);

                rows.insert(
                    row.observation.id.clone(),
                    ObservationLag {
                        previous_metric: previous,
                        change,
                        change_pct: change
                            .zip(previous)
                            .and_then(|(c, p)| safe_div(100.0 * c, p)),
                        running_total,
                        running_count,
                        running_avg: running_total / running_count as f64,
                        category_rank: ranks[i],
                    },
                );
                previous = Some(metric);
            }
            partitions.insert(category.to_string(), rows);
        }

        let table = Self { partitions };
        tracing::debug!(rows = table.len(), "computed observation lag metrics");
        table
    }

    /// Lag metrics of observation `id` in `category`.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingDependency`] if the category holds no
    /// such id.
    pub fn get(&self, category: &str, id: &str) -> Result<&ObservationLag> {
        self.partitions
            .get(category)
            .and_then(|rows| rows.get(id))
            .ok_or_else(|| AnalyticsError::missing(category, "observation lag"))
    }

    /// Number of observations covered.
    pub fn len(&self) -> usize {
        self.partitions.values().map(HashMap::len).sum()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(HashMap::is_empty)
    }
}
