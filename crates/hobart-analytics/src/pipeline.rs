//! Stage orchestration.
//!
//! Stages run strictly forward over one snapshot: category statistics and
//! time buckets read the snapshot, windowed metrics read the buckets and
//! classification reads both. A run either produces the full
//! [`PipelineOutput`] or fails without partial results.

use crate::bucket::BucketedAggregates;
use crate::category::CategoryStatsTable;
use crate::classify::{ClassificationResult, Classifier, SeasonalFactors};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::window::{DailyWindowTable, MonthlyWindowTable, ObservationLagTable};
use hobart_data::{FilteredObservation, Observation, ObservationSnapshot, ObservationSource};

/// Everything one run derives, owned by the run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Configuration the run used
    pub config: PipelineConfig,
    /// Filtered observations
    pub snapshot: ObservationSnapshot,
    /// Per-category statistics
    pub category_stats: CategoryStatsTable,
    /// Daily, weekly and monthly buckets
    pub buckets: BucketedAggregates,
    /// Daily windowed metrics
    pub daily: DailyWindowTable,
    /// Monthly windowed metrics
    pub monthly: MonthlyWindowTable,
    /// Observation-level lag metrics
    pub lags: ObservationLagTable,
    /// Seasonal factors per (category, calendar month)
    pub seasonal: SeasonalFactors,
    /// Classification of each snapshot row, in snapshot order
    pub classifications: Vec<ClassificationResult>,
}

impl PipelineOutput {
    /// Snapshot rows paired with their classification.
    pub fn classified_rows(
        &self,
    ) -> impl Iterator<Item = (&FilteredObservation, &ClassificationResult)> {
        self.snapshot.iter().zip(self.classifications.iter())
    }
}

/// Runs the analytical stages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load from `source`, filter and run.
    ///
    /// # Errors
    /// Returns an error if loading fails or a stage is inconsistent.
    pub fn run_source(&self, source: &dyn ObservationSource) -> Result<PipelineOutput> {
        let observations = source.load()?;
        tracing::debug!(
            source = source.name(),
            count = observations.len(),
            "loaded observations"
        );
        self.run_observations(observations)
    }

    /// Filter `observations` by the configured cutoff and run.
    ///
    /// # Errors
    /// Returns an error if a stage is inconsistent.
    pub fn run_observations<I>(&self, observations: I) -> Result<PipelineOutput>
    where
        I: IntoIterator<Item = Observation>,
    {
        self.run(ObservationSnapshot::filter(observations, self.config.cutoff()))
    }

    /// Run every stage over an already filtered snapshot.
    ///
    /// # Errors
    /// Returns [`crate::AnalyticsError::Data`] if two observations share an
    /// id, or [`crate::AnalyticsError::MissingDependency`] if a stage looks
    /// up an entry its upstream stage did not produce.
    pub fn run(&self, snapshot: ObservationSnapshot) -> Result<PipelineOutput> {
        snapshot.ensure_unique_ids()?;
        if snapshot.is_empty() {
            tracing::warn!(cutoff = %self.config.cutoff(), "no observations after cutoff");
        }

        let category_stats = CategoryStatsTable::compute(&snapshot);
        let buckets = BucketedAggregates::compute(&snapshot);
        let daily = DailyWindowTable::compute(&buckets.daily, self.config.windows())?;
        let monthly = MonthlyWindowTable::compute(&buckets.monthly);
        let lags = ObservationLagTable::compute(&snapshot);
        let seasonal = SeasonalFactors::compute(&monthly);

        let classifier = Classifier::new(*self.config.thresholds());
        let classifications = snapshot
            .iter()
            .map(|row| {
                let category = row.category();
                let date = row.calendar.date;
                Ok(classifier.classify(
                    row.metric(),
                    category_stats.get(category)?,
                    daily.get(category, date)?,
                    monthly.get(category, date)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(rows = classifications.len(), "classified observations");

        tracing::info!(
            observations = snapshot.len(),
            categories = category_stats.len(),
            "pipeline run complete"
        );

        Ok(PipelineOutput {
            config: self.config.clone(),
            snapshot,
            category_stats,
            buckets,
            daily,
            monthly,
            lags,
            seasonal,
            classifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{OutlierFlag, Performance};
    use hobart_data::parse_timestamp;

    fn obs(id: &str, ts: &str, metric: f64, category: &str) -> Observation {
        let ts = parse_timestamp(ts).unwrap();
        Observation::new(id, ts, ts, metric, category)
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::new(
            parse_timestamp("2024-02-01 00:00:00").unwrap(),
        ))
    }

    #[test]
    fn test_run_classifies_every_row() {
        let output = pipeline()
            .run_observations(vec![
                obs("1", "2024-01-01", 10.0, "A"),
                obs("2", "2024-01-02", 20.0, "A"),
                obs("3", "2024-01-03", 30.0, "A"),
                obs("4", "2022-06-01", 99.0, "A"),
            ])
            .unwrap();

        assert_eq!(output.snapshot.len(), 3);
        let labels: Vec<Performance> = output
            .classified_rows()
            .map(|(_, c)| c.performance)
            .collect();
        assert_eq!(
            labels,
            vec![Performance::Below, Performance::Equal, Performance::Above]
        );
        assert!(
            output
                .classifications
                .iter()
                .all(|c| c.outlier == OutlierFlag::Normal)
        );
    }

    #[test]
    fn test_empty_snapshot_is_not_an_error() {
        let output = pipeline()
            .run_observations(vec![obs("1", "2020-01-01", 1.0, "A")])
            .unwrap();
        assert!(output.snapshot.is_empty());
        assert!(output.classifications.is_empty());
        assert!(output.category_stats.is_empty());
    }

    #[test]
    fn test_run_source() {
        let source = vec![obs("1", "2024-01-01", 1.0, "A")];
        let output = pipeline().run_source(&source).unwrap();
        assert_eq!(output.snapshot.len(), 1);
    }
}
