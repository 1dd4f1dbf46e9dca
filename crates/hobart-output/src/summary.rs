//! Run overview per category.

use crate::row::ReportRow;
use chrono::NaiveDateTime;
use hobart_analytics::stats::{round_opt, round_to};
use hobart_analytics::{MonthlyCohort, PipelineOutput};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Headline numbers of one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    /// Category label.
    pub category: String,

    /// Number of observations.
    pub count: usize,

    /// Mean metric.
    pub mean: f64,

    /// Sample standard deviation.
    pub stddev: Option<f64>,

    /// Smallest metric.
    pub min: f64,

    /// Largest metric.
    pub max: f64,

    /// Observations flagged as outliers.
    pub outliers: usize,

    /// Day buckets flagged as anomalies.
    pub anomaly_days: usize,

    /// Trend of the latest month.
    pub latest_trend: String,
}

/// Overview of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Lower bound on `created_at`.
    pub cutoff: NaiveDateTime,

    /// Timestamp the run was measured against.
    pub run_timestamp: NaiveDateTime,

    /// Observations after filtering.
    pub observations: usize,

    /// Per-category summaries in category order.
    pub categories: Vec<CategorySummary>,
}

impl RunSummary {
    /// Summarise a run and its assembled rows.
    pub fn from_run(output: &PipelineOutput, rows: &[ReportRow]) -> Self {
        let categories = output
            .category_stats
            .iter()
            .map(|stats| {
                let category_rows = rows.iter().filter(|r| r.category == stats.category);
                let outliers = category_rows
                    .clone()
                    .filter(|r| r.outlier_flag == "Outlier")
                    .count();
                let mut anomaly_days: Vec<_> = category_rows
                    .filter(|r| r.anomaly_flag == "Anomaly")
                    .map(|r| r.obs_date)
                    .collect();
                anomaly_days.dedup();

                let latest_trend = output
                    .monthly
                    .partition(&stats.category)
                    .ok()
                    .and_then(|months| months.last())
                    .map(|m| m.trend.to_string())
                    .unwrap_or_default();

                CategorySummary {
                    category: stats.category.clone(),
                    count: stats.count,
                    mean: round_to(stats.mean, 2),
                    stddev: round_opt(stats.stddev, 2),
                    min: stats.min,
                    max: stats.max,
                    outliers,
                    anomaly_days: anomaly_days.len(),
                    latest_trend,
                }
            })
            .collect();

        Self {
            cutoff: output.config.cutoff(),
            run_timestamp: output.config.run_timestamp(),
            observations: output.snapshot.len(),
            categories,
        }
    }

    /// Total outliers across categories.
    pub fn total_outliers(&self) -> usize {
        self.categories.iter().map(|c| c.outliers).sum()
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nRun Summary: {} observations since {}\n",
            self.observations, self.cutoff
        ));
        output.push_str(&format!("Measured at: {}\n", self.run_timestamp));
        output.push_str(&"=".repeat(96));
        output.push('\n');
        output.push_str(&format!(
            "{:<20} {:>8} {:>12} {:>12} {:>12} {:>12} {:>8} {:>8}\n",
            "Category", "Count", "Mean", "Std Dev", "Min", "Max", "Outl.", "Anom."
        ));
        output.push_str(&"-".repeat(96));
        output.push('\n');

        for c in &self.categories {
            let stddev = c
                .stddev
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<20} {:>8} {:>12.2} {:>12} {:>12.2} {:>12.2} {:>8} {:>8}\n",
                c.category, c.count, c.mean, stddev, c.min, c.max, c.outliers, c.anomaly_days
            ));
        }

        output.push_str(&"=".repeat(96));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Run Summary\n\n");
        output.push_str(&format!("**Cutoff:** {}\n\n", self.cutoff));
        output.push_str(&format!("**Measured at:** {}\n\n", self.run_timestamp));
        output.push_str(&format!("**Observations:** {}\n\n", self.observations));

        if !self.categories.is_empty() {
            output.push_str(
                "| Category | Count | Mean | Std Dev | Min | Max | Outliers | Anomaly Days | Trend |\n",
            );
            output.push_str(
                "|----------|-------|------|---------|-----|-----|----------|--------------|-------|\n",
            );
            for c in &self.categories {
                let stddev = c.stddev.map(|s| format!("{:.2}", s)).unwrap_or_default();
                output.push_str(&format!(
                    "| {} | {} | {:.2} | {} | {:.2} | {:.2} | {} | {} | {} |\n",
                    c.category,
                    c.count,
                    c.mean,
                    stddev,
                    c.min,
                    c.max,
                    c.outliers,
                    c.anomaly_days,
                    c.latest_trend
                ));
            }
        }

        output
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run Summary: {} observations in {} categories",
            self.observations,
            self.categories.len()
        )?;
        writeln!(f, "  Cutoff: {}", self.cutoff)?;
        writeln!(f, "  Outliers: {}", self.total_outliers())?;
        Ok(())
    }
}

/// Format risk cohorts as an ASCII table.
pub fn cohort_ascii_table(cohorts: &[MonthlyCohort]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<16} {:>8} {:>10} {:>10} {:>10} {:>6} {:>9} {:>9} {:>11}\n",
        "Segment", "Month", "Customers", "Avg Risk", "Median", "High", "Contact%", "Tax%", "Trend"
    ));
    output.push_str(&"-".repeat(96));
    output.push('\n');

    for c in cohorts {
        output.push_str(&format!(
            "{:<16} {:>8} {:>10} {:>10.4} {:>10.4} {:>6} {:>9.2} {:>9.2} {:>11}\n",
            c.segment,
            c.month.format("%Y-%m"),
            c.customers,
            c.avg_risk_score,
            c.median_risk_score,
            c.high_risk_count,
            c.contact_verified_pct,
            c.tax_profile_pct,
            c.trend_direction
        ));
    }

    output
}
