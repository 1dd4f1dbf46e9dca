//! Customer risk records for cohort reporting.

use crate::error::{DataError, Result};
use crate::observation::parse_timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One customer's risk snapshot at a reporting date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRiskRecord {
    /// Customer identifier
    pub customer_id: String,
    /// Date the scores were reported
    pub reported_at: NaiveDate,
    /// Customer segment
    pub segment: String,
    /// Financial risk score in `[0, 1]`
    pub risk_score: f64,
    /// Tax profile on file
    pub tax_profile_complete: bool,
    /// Contact details verified
    pub contact_verified: bool,
    /// Listed in the bankruptcy registry
    pub bankrupt: bool,
}

#[derive(Debug, Deserialize)]
struct RiskCsvRecord {
    customer_id: String,
    reported_at: String,
    segment: String,
    risk_score: f64,
    tax_profile_complete: String,
    contact_verified: String,
    bankrupt: String,
}

fn parse_flag(column: &str, value: &str, line: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" | "" => Ok(false),
        _ => Err(DataError::Parse(format!(
            "line {}: {}: not a boolean: {:?}",
            line, column, value
        ))),
    }
}

impl RiskCsvRecord {
    fn into_record(self, line: usize) -> Result<CustomerRiskRecord> {
        let reported_at = parse_timestamp(&self.reported_at)
            .map_err(|e| DataError::Parse(format!("line {}: reported_at: {}", line, e)))?
            .date();

        Ok(CustomerRiskRecord {
            customer_id: self.customer_id,
            reported_at,
            segment: self.segment,
            risk_score: self.risk_score,
            tax_profile_complete: parse_flag(
                "tax_profile_complete",
                &self.tax_profile_complete,
                line,
            )?,
            contact_verified: parse_flag("contact_verified", &self.contact_verified, line)?,
            bankrupt: parse_flag("bankrupt", &self.bankrupt, line)?,
        })
    }
}

/// Parse risk records from CSV with a header row.
pub fn read_risk_records<R: Read>(reader: R) -> Result<Vec<CustomerRiskRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, row) in rdr.deserialize::<RiskCsvRecord>().enumerate() {
        records.push(row?.into_record(index + 2)?);
    }
    Ok(records)
}

/// Load risk records from a CSV file.
pub fn load_risk_records<P: AsRef<Path>>(path: P) -> Result<Vec<CustomerRiskRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    let records = read_risk_records(file)?;
    tracing::debug!(
        path = %path.as_ref().display(),
        count = records.len(),
        "loaded risk records"
    );
    Ok(records)
}
