//! End-to-end properties of a pipeline run.

use approx::assert_relative_eq;
use chrono::Duration;
use hobart_analytics::{
    AnalyticsError, AnomalyFlag, OutlierFlag, Performance, Pipeline, PipelineConfig,
    PipelineOutput, TrendDirection, WindowConfig,
};
use hobart_data::{DataError, Observation, parse_timestamp};

fn obs(id: &str, ts: &str, metric: f64, category: &str) -> Observation {
    let ts = parse_timestamp(ts).unwrap();
    Observation::new(id, ts, ts, metric, category)
}

fn run(observations: Vec<Observation>) -> PipelineOutput {
    let config = PipelineConfig::new(parse_timestamp("2024-07-01 00:00:00").unwrap());
    Pipeline::new(config).run_observations(observations).unwrap()
}

fn mixed_dataset() -> Vec<Observation> {
    vec![
        obs("a1", "2024-01-01 08:00:00", 10.0, "A"),
        obs("a2", "2024-01-01 17:30:00", 12.0, "A"),
        obs("a3", "2024-01-09 09:00:00", 30.0, "A"),
        obs("a4", "2024-02-14 10:00:00", 25.0, "A"),
        obs("a5", "2024-03-30 23:59:59", 5.0, "A"),
        obs("b1", "2024-01-05 12:00:00", 100.0, "B"),
        obs("b2", "2024-03-05 12:00:00", 0.0, "B"),
        obs("c1", "2024-04-01 00:00:00", 7.0, "C"),
    ]
}

#[test]
fn test_worked_example() {
    let output = run(vec![
        obs("1", "2024-01-01", 10.0, "A"),
        obs("2", "2024-01-02", 20.0, "A"),
        obs("3", "2024-01-03", 30.0, "A"),
    ]);

    let stats = output.category_stats.get("A").unwrap();
    assert_relative_eq!(stats.mean, 20.0);
    assert_relative_eq!(stats.stddev.unwrap(), 10.0);

    let performance: Vec<Performance> = output
        .classifications
        .iter()
        .map(|c| c.performance)
        .collect();
    assert_eq!(
        performance,
        vec![Performance::Below, Performance::Equal, Performance::Above]
    );

    let cumulative: Vec<f64> = output
        .daily
        .partition("A")
        .unwrap()
        .iter()
        .map(|d| d.cumulative_sum)
        .collect();
    assert_eq!(cumulative, vec![10.0, 30.0, 60.0]);
}

#[test]
fn test_bucket_counts_sum_to_category_count() {
    let output = run(mixed_dataset());

    for stats in output.category_stats.iter() {
        let daily: usize = output
            .buckets
            .daily
            .partition(&stats.category)
            .unwrap()
            .iter()
            .map(|b| b.count)
            .sum();
        let weekly: usize = output
            .buckets
            .weekly
            .partition(&stats.category)
            .unwrap()
            .iter()
            .map(|b| b.count)
            .sum();
        let monthly: usize = output
            .buckets
            .monthly
            .partition(&stats.category)
            .unwrap()
            .iter()
            .map(|b| b.count)
            .sum();
        assert_eq!(daily, stats.count);
        assert_eq!(weekly, stats.count);
        assert_eq!(monthly, stats.count);
    }
}

#[test]
fn test_last_cumulative_sum_is_category_total() {
    let output = run(mixed_dataset());

    for stats in output.category_stats.iter() {
        let last = output
            .daily
            .partition(&stats.category)
            .unwrap()
            .last()
            .unwrap();
        assert_relative_eq!(last.cumulative_sum, stats.sum);
        assert_eq!(last.cumulative_count, stats.count);
    }
}

#[test]
fn test_quartiles_are_ordered() {
    let output = run(mixed_dataset());
    for stats in output.category_stats.iter() {
        assert!(stats.p25 <= stats.median);
        assert!(stats.median <= stats.p75);
    }
}

#[test]
fn test_single_observation_category() {
    let output = run(mixed_dataset());

    let stats = output.category_stats.get("C").unwrap();
    assert_eq!(stats.stddev, None);

    let (_, classification) = output
        .classified_rows()
        .find(|(row, _)| row.observation.id == "c1")
        .unwrap();
    assert_eq!(classification.outlier, OutlierFlag::Normal);
    assert_eq!(classification.trend, TrendDirection::Stable);
    assert_eq!(classification.growth_rate, None);
}

#[test]
fn test_zero_previous_month_has_no_growth() {
    let output = run(vec![
        obs("1", "2024-01-10", 0.0, "Z"),
        obs("2", "2024-02-10", 40.0, "Z"),
    ]);

    let feb = &output.monthly.partition("Z").unwrap()[1];
    assert_eq!(feb.growth_rate, None);
    assert_relative_eq!(feb.forecast, feb.sum);
}

#[test]
fn test_short_partition_window_is_plain_mean() {
    let config = PipelineConfig::new(parse_timestamp("2024-07-01").unwrap())
        .with_windows(WindowConfig {
            short: 50,
            long: 50,
            anomaly: 50,
        })
        .unwrap();
    let output = Pipeline::new(config).run_observations(mixed_dataset()).unwrap();

    let days = output.daily.partition("A").unwrap();
    let sums: Vec<f64> = days.iter().map(|d| d.sum).collect();
    let plain = sums.iter().sum::<f64>() / sums.len() as f64;
    assert_relative_eq!(days.last().unwrap().moving_avg_short.unwrap(), plain);
}

#[test]
fn test_runs_are_deterministic() {
    let mut shuffled = mixed_dataset();
    shuffled.reverse();

    let first = run(mixed_dataset());
    let second = run(shuffled);

    assert_eq!(first.snapshot.rows(), second.snapshot.rows());
    assert_eq!(first.classifications, second.classifications);
    assert_eq!(first.category_stats, second.category_stats);
}

/// One observation per day from 2024-01-01 in category "A".
fn daily_series(metrics: &[f64]) -> Vec<Observation> {
    let start = parse_timestamp("2024-01-01").unwrap();
    metrics
        .iter()
        .enumerate()
        .map(|(i, &metric)| {
            let ts = start + Duration::days(i as i64);
            Observation::new(format!("d{:02}", i), ts, ts, metric, "A")
        })
        .collect()
}

#[test]
fn test_spike_day_is_anomaly_and_outlier() {
    let mut metrics = vec![10.0; 13];
    metrics.push(1000.0);
    let output = run(daily_series(&metrics));

    let days = output.daily.partition("A").unwrap();
    assert_eq!(days.len(), 14);
    let spike = &days[13];
    assert_relative_eq!(spike.rolling_avg.unwrap(), 1130.0 / 14.0);
    assert_eq!(AnomalyFlag::for_day(spike, 3.0), AnomalyFlag::Anomaly);
    assert!(
        days[..13]
            .iter()
            .all(|d| AnomalyFlag::for_day(d, 3.0) == AnomalyFlag::Normal)
    );

    let (last, rest) = output.classifications.split_last().unwrap();
    assert_eq!(last.anomaly, AnomalyFlag::Anomaly);
    assert_eq!(last.outlier, OutlierFlag::Outlier);
    assert!(rest.iter().all(|c| c.anomaly == AnomalyFlag::Normal));
    assert!(rest.iter().all(|c| c.outlier == OutlierFlag::Normal));
}

#[test]
fn test_nan_metrics_do_not_abort_the_run() {
    let metrics: Vec<f64> = (0..40)
        .map(|i| if i % 3 == 0 { f64::NAN } else { i as f64 })
        .collect();
    let config = PipelineConfig::new(parse_timestamp("2024-07-01").unwrap());
    let output = Pipeline::new(config)
        .run_observations(daily_series(&metrics))
        .unwrap();

    assert_eq!(output.classifications.len(), 40);
    assert_eq!(output.category_stats.get("A").unwrap().count, 40);
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let config = PipelineConfig::new(parse_timestamp("2024-07-01").unwrap());
    let result = Pipeline::new(config).run_observations(vec![
        obs("x", "2024-01-01", 10.0, "A"),
        obs("x", "2024-01-02", 999.0, "B"),
    ]);

    assert!(matches!(
        result,
        Err(AnalyticsError::Data(DataError::DuplicateId(id))) if id == "x"
    ));
}
