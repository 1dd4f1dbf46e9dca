//! Monthly customer risk cohorts.
//!
//! Records are grouped by (segment, reporting month). Each cohort carries
//! score statistics, verification rates and the month-over-month change of
//! the average score within its segment.

use crate::bucket::Granularity;
use crate::classify::TrendDirection;
use crate::stats::{mean, percentile_cont, round_opt, round_to, sample_std};
use crate::window::lag;
use chrono::NaiveDate;
use hobart_data::CustomerRiskRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Risk band of a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    /// Score of 0.7 or more
    #[display("high")]
    High,
    /// Score of 0.4 or more
    #[display("medium")]
    Medium,
    /// Below 0.4
    #[display("low")]
    Low,
}

impl RiskBand {
    /// Band of `score`.
    pub fn classify(score: f64) -> Self {
        if score >= 0.7 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Aggregates of one segment in one reporting month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCohort {
    /// Customer segment
    pub segment: String,
    /// First day of the reporting month
    pub month: NaiveDate,
    /// Records in the cohort
    pub customers: usize,
    /// Mean risk score
    pub avg_risk_score: f64,
    /// Sample standard deviation of scores
    pub risk_stddev: Option<f64>,
    /// Median score (continuous)
    pub median_risk_score: f64,
    /// Records in the high risk band
    pub high_risk_count: usize,
    /// Share of records with verified contact details, in percent
    pub contact_verified_pct: f64,
    /// Share of records with a complete tax profile, in percent
    pub tax_profile_pct: f64,
    /// Records flagged bankrupt
    pub bankrupt_count: usize,
    /// Average score of the segment's previous cohort
    pub prev_avg_risk_score: Option<f64>,
    /// `avg_risk_score - prev_avg_risk_score`
    pub risk_delta: Option<f64>,
    /// Direction of `risk_delta`
    pub trend_direction: TrendDirection,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to(100.0 * part as f64 / whole as f64, 2)
    }
}

/// Build monthly cohorts ordered by segment, then month.
pub fn monthly_cohorts(records: &[CustomerRiskRecord]) -> Vec<MonthlyCohort> {
    let mut grouped: BTreeMap<&str, BTreeMap<NaiveDate, Vec<&CustomerRiskRecord>>> =
        BTreeMap::new();
    for record in records {
        grouped
            .entry(record.segment.as_str())
            .or_default()
            .entry(Granularity::Month.bucket_start(record.reported_at))
            .or_default()
            .push(record);
    }

    let mut cohorts = Vec::new();
    for (segment, months) in grouped {
        let mut segment_cohorts: Vec<MonthlyCohort> = months
            .into_iter()
            .map(|(month, members)| {
                let scores: Vec<f64> = members.iter().map(|r| r.risk_score).collect();
                let customers = members.len();
                MonthlyCohort {
                    segment: segment.to_string(),
                    month,
                    customers,
                    avg_risk_score: round_to(mean(&scores).unwrap_or_default(), 4),
                    risk_stddev: round_opt(sample_std(&scores), 4),
                    median_risk_score: round_to(
                        percentile_cont(&scores, 0.5).unwrap_or_default(),
                        4,
                    ),
                    high_risk_count: scores
                        .iter()
                        .filter(|&&s| RiskBand::classify(s) == RiskBand::High)
                        .count(),
                    contact_verified_pct: percent(
                        members.iter().filter(|r| r.contact_verified).count(),
                        customers,
                    ),
                    tax_profile_pct: percent(
                        members.iter().filter(|r| r.tax_profile_complete).count(),
                        customers,
                    ),
                    bankrupt_count: members.iter().filter(|r| r.bankrupt).count(),
                    prev_avg_risk_score: None,
                    risk_delta: None,
                    trend_direction: TrendDirection::Stable,
                }
            })
            .collect();

        let averages: Vec<f64> = segment_cohorts.iter().map(|c| c.avg_risk_score).collect();
        for (cohort, prev) in segment_cohorts.iter_mut().zip(lag(&averages)) {
            let delta = prev.map(|p| round_to(cohort.avg_risk_score - p, 4));
            cohort.prev_avg_risk_score = prev;
            cohort.risk_delta = delta;
            cohort.trend_direction = TrendDirection::from_delta(delta);
        }

        cohorts.append(&mut segment_cohorts);
    }

    tracing::debug!(
        records = records.len(),
        cohorts = cohorts.len(),
        "built monthly risk cohorts"
    );
    cohorts
}
