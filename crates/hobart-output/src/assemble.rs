//! Joins every stage output back onto each observation.
//!
//! Assembly runs in two passes. The first builds one [`ReportRow`] per
//! snapshot row from category, bucket, window and classification lookups.
//! The second fills the global ranking columns, which need every row
//! materialised first.

use crate::row::ReportRow;
use chrono::{Datelike, NaiveDateTime};
use hobart_analytics::ranking::{cmp_f64, ntile_by, peer_ranks_by, row_numbers_by};
use hobart_analytics::stats::{round_opt, round_to, safe_div};
use hobart_analytics::{
    AgeBand, ClassificationResult, Granularity, PipelineOutput, QualityLabel, QuartileBand,
    Result, SizeLabel, VolumeLabel,
};
use hobart_data::{FilteredObservation, TIMESTAMP_DISPLAY_FORMAT};

/// Builds report rows from a pipeline run.
#[derive(Debug)]
pub struct ReportAssembler<'a> {
    output: &'a PipelineOutput,
}

impl<'a> ReportAssembler<'a> {
    /// Create an assembler over `output`.
    pub const fn new(output: &'a PipelineOutput) -> Self {
        Self { output }
    }

    /// Build every row, ordered by category, date, creation time and id.
    ///
    /// # Errors
    /// Returns [`hobart_analytics::AnalyticsError::MissingDependency`] if a
    /// stage has no entry for an observation's category or bucket.
    pub fn assemble(&self) -> Result<Vec<ReportRow>> {
        let mut rows = self
            .output
            .classified_rows()
            .map(|(row, classification)| self.build_row(row, classification))
            .collect::<Result<Vec<_>>>()?;

        finalize(&mut rows);
        tracing::debug!(rows = rows.len(), "assembled report rows");
        Ok(rows)
    }

    fn build_row(
        &self,
        row: &FilteredObservation,
        classification: &ClassificationResult,
    ) -> Result<ReportRow> {
        let out = self.output;
        let obs = &row.observation;
        let cal = &row.calendar;
        let category = obs.category.as_str();
        let metric = obs.metric;

        let stats = out.category_stats.get(category)?;
        let lag = out.lags.get(category, &obs.id)?;
        let day = out.daily.get(category, cal.date)?;
        let week = out.buckets.weekly.get(category, cal.date)?;
        let month = out.monthly.get(category, cal.date)?;
        let seasonal_factor = out.seasonal.get(category, cal.month);

        let run_ts: NaiveDateTime = out.config.run_timestamp();
        let run_date = run_ts.date();
        let days_since_created = (run_date - cal.date).num_days();
        let update_lag_seconds = (obs.updated_at - obs.created_at).num_seconds();

        let mean_ratio = safe_div(metric, stats.mean);
        let z_score = stats.stddev.and_then(|std| safe_div(metric - stats.mean, std));

        Ok(ReportRow {
            id: obs.id.clone(),
            category: obs.category.clone(),
            metric,
            created_at: obs.created_at.format(TIMESTAMP_DISPLAY_FORMAT).to_string(),
            updated_at: obs.updated_at.format(TIMESTAMP_DISPLAY_FORMAT).to_string(),

            obs_date: cal.date,
            obs_year: cal.year,
            obs_quarter: cal.quarter,
            obs_month: cal.month,
            obs_month_name: cal.month_name().to_string(),
            obs_iso_year: cal.iso_year,
            obs_iso_week: cal.iso_week,
            obs_day: cal.day,
            obs_weekday: cal.weekday,
            obs_weekday_name: cal.weekday_name().to_string(),
            obs_day_of_year: cal.day_of_year,
            obs_hour: cal.hour,
            is_weekend: cal.is_weekend(),

            run_date,
            run_year: run_date.year(),
            run_month: run_date.month(),
            run_iso_week: run_date.iso_week().week(),
            run_day: run_date.day(),
            days_since_created,
            hours_since_update: (run_ts - obs.updated_at).num_hours(),
            update_lag_hours: round_to(update_lag_seconds as f64 / 3600.0, 2),
            age_band: AgeBand::classify(days_since_created).to_string(),

            category_count: stats.count,
            category_mean: round_to(stats.mean, 2),
            category_min: stats.min,
            category_max: stats.max,
            category_stddev: round_opt(stats.stddev, 2),
            category_p25: round_to(stats.p25, 2),
            category_median: round_to(stats.median, 2),
            category_p75: round_to(stats.p75, 2),
            category_iqr: round_to(stats.iqr(), 2),
            metric_to_mean_ratio: round_opt(mean_ratio, 2),
            metric_to_median_ratio: round_opt(safe_div(metric, stats.median), 2),
            deviation_from_mean: round_to(metric - stats.mean, 2),
            z_score: round_opt(z_score, 2),
            percentile_position: round_opt(safe_div(metric - stats.p25, stats.iqr()), 2),
            range_position: round_opt(safe_div(metric - stats.min, stats.max - stats.min), 2),
            category_share_pct: round_opt(safe_div(100.0 * metric, stats.sum), 2),
            quartile_band: QuartileBand::classify(metric, stats).to_string(),
            size_label: SizeLabel::classify(mean_ratio).to_string(),
            volume_label: VolumeLabel::classify(stats.count).to_string(),
            quality_label: QualityLabel::classify(z_score).to_string(),
            performance: classification.performance.to_string(),
            outlier_flag: classification.outlier.to_string(),

            previous_metric: lag.previous_metric,
            metric_change: round_opt(lag.change, 2),
            metric_change_pct: round_opt(lag.change_pct, 2),
            running_total: round_to(lag.running_total, 2),
            running_count: lag.running_count,
            running_avg: round_to(lag.running_avg, 2),

            daily_count: day.count,
            daily_sum: round_to(day.sum, 2),
            daily_avg: round_to(day.mean, 2),
            daily_cumulative_sum: round_to(day.cumulative_sum, 2),
            daily_cumulative_count: day.cumulative_count,
            prev_daily_sum: round_opt(day.prev_sum, 2),
            daily_delta: round_opt(day.delta, 2),
            moving_avg_short: round_opt(day.moving_avg_short, 2),
            volatility_short: round_opt(day.volatility_short, 2),
            moving_avg_long: round_opt(day.moving_avg_long, 2),
            volatility_long: round_opt(day.volatility_long, 2),
            rolling_avg_anomaly: round_opt(day.rolling_avg, 2),
            rolling_stddev_anomaly: round_opt(day.rolling_stddev, 2),
            anomaly_flag: classification.anomaly.to_string(),
            metric_to_moving_avg_ratio: round_opt(
                day.moving_avg_short.and_then(|ma| safe_div(metric, ma)),
                2,
            ),

            weekly_bucket: Granularity::Week.label(week.start),
            weekly_count: week.count,
            weekly_sum: round_to(week.sum, 2),
            weekly_avg: round_to(week.mean, 2),

            monthly_bucket: Granularity::Month.label(month.month),
            monthly_count: month.count,
            monthly_sum: round_to(month.sum, 2),
            monthly_avg: round_to(month.mean, 2),
            prev_monthly_avg: round_opt(month.prev_mean, 2),
            monthly_delta: round_opt(month.delta, 2),
            trend_direction: classification.trend.to_string(),
            growth_rate: round_opt(classification.growth_rate, 4),
            forecast_next: round_to(classification.forecast, 2),
            seasonal_factor: round_opt(seasonal_factor, 2),
            seasonal_index: round_opt(seasonal_factor.and_then(|f| safe_div(month.mean, f)), 2),
            month_share_pct: round_opt(safe_div(100.0 * month.sum, stats.sum), 2),

            row_number: 0,
            category_rank: lag.category_rank,
            global_rank: 0,
            global_dense_rank: 0,
            decile: 0,
            quartile: 0,
            cume_dist: 0.0,
            percent_rank: 0.0,
        })
    }
}

/// Fill the cross-category window columns over the full row set.
pub fn finalize(rows: &mut [ReportRow]) {
    let row_numbers = row_numbers_by(&*rows, |a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    let by_metric = |a: &ReportRow, b: &ReportRow| {
        a.category
            .cmp(&b.category)
            .then_with(|| cmp_f64(a.metric, b.metric))
    };
    let by_metric_id = |a: &ReportRow, b: &ReportRow| by_metric(a, b).then_with(|| a.id.cmp(&b.id));

    let peers = peer_ranks_by(&*rows, by_metric);
    let deciles = ntile_by(&*rows, 10, by_metric_id);
    let quartiles = ntile_by(&*rows, 4, by_metric_id);

    for (i, row) in rows.iter_mut().enumerate() {
        row.row_number = row_numbers[i];
        row.global_rank = peers[i].rank;
        row.global_dense_rank = peers[i].dense_rank;
        row.cume_dist = round_to(peers[i].cume_dist, 4);
        row.percent_rank = round_to(peers[i].percent_rank, 4);
        row.decile = deciles[i];
        row.quartile = quartiles[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_analytics::{Pipeline, PipelineConfig};
    use hobart_data::{Observation, parse_timestamp};

    fn assemble(observations: Vec<Observation>) -> Vec<ReportRow> {
        let config = PipelineConfig::new(parse_timestamp("2024-01-10 12:00:00").unwrap());
        let output = Pipeline::new(config).run_observations(observations).unwrap();
        ReportAssembler::new(&output).assemble().unwrap()
    }

    fn obs(id: &str, created: &str, updated: &str, metric: f64, category: &str) -> Observation {
        Observation::new(
            id,
            parse_timestamp(created).unwrap(),
            parse_timestamp(updated).unwrap(),
            metric,
            category,
        )
    }

    #[test]
    fn test_worked_example_rows() {
        let rows = assemble(vec![
            obs("1", "2024-01-01 00:00:00", "2024-01-01 06:30:00", 10.0, "A"),
            obs("2", "2024-01-02 00:00:00", "2024-01-02 00:00:00", 20.0, "A"),
            obs("3", "2024-01-03 00:00:00", "2024-01-03 00:00:00", 30.0, "A"),
        ]);
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.created_at, "2024-01-01 00:00:00");
        assert_eq!(first.obs_month_name, "January");
        assert_eq!(first.obs_weekday_name, "Monday");
        assert_eq!(first.days_since_created, 9);
        assert_eq!(first.hours_since_update, 221);
        assert_eq!(first.update_lag_hours, 6.5);
        assert_eq!(first.age_band, "recent");
        assert_eq!(first.category_mean, 20.0);
        assert_eq!(first.category_stddev, Some(10.0));
        assert_eq!(first.z_score, Some(-1.0));
        assert_eq!(first.quality_label, "Typical");
        assert_eq!(first.quartile_band, "Bottom Quartile");
        assert_eq!(first.size_label, "Medium");
        assert_eq!(first.performance, "below");
        assert_eq!(first.previous_metric, None);
        assert_eq!(first.weekly_bucket, "2024-W01");
        assert_eq!(first.monthly_bucket, "2024-01");

        let cumulative: Vec<f64> = rows.iter().map(|r| r.daily_cumulative_sum).collect();
        assert_eq!(cumulative, vec![10.0, 30.0, 60.0]);

        let middle = &rows[1];
        assert_eq!(middle.performance, "equal");
        assert_eq!(middle.quartile_band, "Median");
        assert_eq!(middle.metric_change_pct, Some(100.0));
        assert_eq!(middle.category_share_pct, Some(33.33));

        let last = &rows[2];
        assert_eq!(last.performance, "above");
        assert_eq!(last.category_rank, 1);
        assert_eq!(last.range_position, Some(1.0));
        assert_eq!(last.month_share_pct, Some(100.0));
        assert_eq!(last.trend_direction, "stable");
    }

    #[test]
    fn test_global_ranks_span_categories() {
        let rows = assemble(vec![
            obs("a1", "2024-01-01", "2024-01-01", 5.0, "A"),
            obs("a2", "2024-01-02", "2024-01-02", 5.0, "A"),
            obs("b1", "2024-01-01", "2024-01-01", 1.0, "B"),
        ]);

        let numbers: Vec<usize> = rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        assert_eq!(rows[0].global_rank, 1);
        assert_eq!(rows[1].global_rank, 1);
        assert_eq!(rows[2].global_rank, 3);
        assert_eq!(rows[2].global_dense_rank, 2);
        assert_eq!(rows[0].cume_dist, 0.6667);
        assert_eq!(rows[2].percent_rank, 1.0);

        let quartiles: Vec<usize> = rows.iter().map(|r| r.quartile).collect();
        assert_eq!(quartiles, vec![1, 2, 3]);
        assert_eq!(rows[0].category_rank, 1);
        assert_eq!(rows[1].category_rank, 1);
    }

    #[test]
    fn test_single_observation_nulls() {
        let rows = assemble(vec![obs("x", "2024-01-05", "2024-01-05", 0.0, "Z")]);
        let row = &rows[0];
        assert_eq!(row.category_stddev, None);
        assert_eq!(row.z_score, None);
        assert_eq!(row.quality_label, "Insufficient Data");
        assert_eq!(row.metric_to_mean_ratio, None);
        assert_eq!(row.size_label, "Unknown");
        assert_eq!(row.category_share_pct, None);
        assert_eq!(row.outlier_flag, "Normal");
        assert_eq!(row.anomaly_flag, "Normal");
        assert_eq!(row.percent_rank, 0.0);
        assert_eq!(row.cume_dist, 1.0);
    }
}
