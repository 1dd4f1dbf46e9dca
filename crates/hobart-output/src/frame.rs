//! Polars `DataFrame` conversion of report rows.
//!
//! Column types follow the serialized values: integer columns become
//! `Int64`, other numeric columns `Float64`, flags `Boolean`, and labels,
//! dates and timestamps `String`. Undefined values become nulls.

use crate::export::ExportError;
use crate::row::{REPORT_COLUMNS, ReportRow};
use polars::prelude::*;
use serde_json::Value;

fn build_column(name: &str, values: &[Value]) -> Column {
    let non_null = || values.iter().filter(|v| !v.is_null());

    if non_null().all(Value::is_boolean) && non_null().next().is_some() {
        let data: Vec<Option<bool>> = values.iter().map(Value::as_bool).collect();
        Column::new(name.into(), data)
    } else if non_null().all(|v| v.is_i64()) && non_null().next().is_some() {
        let data: Vec<Option<i64>> = values.iter().map(Value::as_i64).collect();
        Column::new(name.into(), data)
    } else if non_null().all(Value::is_number) {
        let data: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
        Column::new(name.into(), data)
    } else {
        let data: Vec<Option<String>> = values
            .iter()
            .map(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Column::new(name.into(), data)
    }
}

/// Convert report rows to a frame with [`REPORT_COLUMNS`] in order.
///
/// # Errors
/// Returns an error if a row cannot be serialized or the frame cannot be
/// built.
pub fn rows_to_frame(rows: &[ReportRow]) -> Result<DataFrame, ExportError> {
    let objects = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let columns: Vec<Column> = REPORT_COLUMNS
        .iter()
        .map(|&name| {
            let values: Vec<Value> = objects
                .iter()
                .map(|obj| obj.get(name).cloned().unwrap_or(Value::Null))
                .collect();
            build_column(name, &values)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}
