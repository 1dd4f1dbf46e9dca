//! Observation records and calendar derivation.

use crate::error::{DataError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp layouts accepted for input records and configuration values.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Display layout used for timestamps in exported reports.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a timestamp string.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS[.f]]` (with either a space or
/// `T` separator) and RFC 3339 with an offset, which is normalised to UTC.
/// A bare date maps to midnight.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.naive_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DataError::Parse(format!("Unrecognised timestamp: {:?}", value)))
}

/// Reject NaN and infinite metrics; `location` names the offending record.
pub(crate) fn finite_metric(metric: f64, location: impl std::fmt::Display) -> Result<f64> {
    if metric.is_finite() {
        Ok(metric)
    } else {
        Err(DataError::Parse(format!(
            "{}: metric must be finite, got {}",
            location, metric
        )))
    }
}

/// One input record of the metrics table.
///
/// Observations are never mutated by the pipeline; every derived value is
/// carried alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp, the only time source for calendar fields.
    pub created_at: NaiveDateTime,
    /// Last update timestamp.
    pub updated_at: NaiveDateTime,
    /// Numeric metric value.
    pub metric: f64,
    /// Low-cardinality category label.
    pub category: String,
}

impl Observation {
    /// Create a new observation.
    pub fn new(
        id: impl Into<String>,
        created_at: NaiveDateTime,
        updated_at: NaiveDateTime,
        metric: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at,
            updated_at,
            metric,
            category: category.into(),
        }
    }

    /// Calendar fields derived from the creation timestamp.
    pub fn calendar(&self) -> CalendarFields {
        CalendarFields::from_timestamp(self.created_at)
    }
}

/// Calendar breakdown of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    /// Calendar date.
    pub date: NaiveDate,
    /// Calendar year.
    pub year: i32,
    /// Quarter of the year (1-4).
    pub quarter: u32,
    /// Month of the year (1-12).
    pub month: u32,
    /// ISO 8601 week-numbering year.
    pub iso_year: i32,
    /// ISO 8601 week of the year (1-53).
    pub iso_week: u32,
    /// Day of the month (1-31).
    pub day: u32,
    /// ISO weekday, Monday = 1 through Sunday = 7.
    pub weekday: u32,
    /// Day of the year (1-366).
    pub day_of_year: u32,
    /// Hour of the day (0-23).
    pub hour: u32,
}

impl CalendarFields {
    /// Derive calendar fields from a timestamp.
    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        let date = ts.date();
        let iso = date.iso_week();
        Self {
            date,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            iso_year: iso.year(),
            iso_week: iso.week(),
            day: date.day(),
            weekday: date.weekday().number_from_monday(),
            day_of_year: date.ordinal(),
            hour: ts.hour(),
        }
    }

    /// Saturday or Sunday.
    pub const fn is_weekend(&self) -> bool {
        self.weekday >= 6
    }

    /// English month name.
    pub const fn month_name(&self) -> &'static str {
        match self.month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            _ => "December",
        }
    }

    /// English weekday name.
    pub const fn weekday_name(&self) -> &'static str {
        match self.weekday {
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            6 => "Saturday",
            _ => "Sunday",
        }
    }
}
