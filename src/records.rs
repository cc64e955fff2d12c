// 📥 Records - Tabular boundary (CSV → typed records)
//
// Raw rows keep every column as optional text so a bad cell never aborts a load.
// Each row is validated once into a typed record or a `RowError`; rejected rows
// only bump the skip counter of the `LoadReport`.

use crate::error::{Result, RowError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// LEDGER KIND
// ============================================================================

/// Which table a contributor row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerKind {
    /// Primary contribution ledger (donations)
    Donation,

    /// Secondary ledger (investors)
    Investor,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Donation => "donation",
            LedgerKind::Investor => "investor",
        }
    }
}

// ============================================================================
// TYPED RECORDS
// ============================================================================

/// One contribution; many records may share a contributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorRecord {
    /// Display name as typed in the ledger
    pub name: String,

    /// Negative and zero amounts pass through untouched
    pub amount: f64,

    pub date: Option<NaiveDate>,

    pub ledger: LedgerKind,
}

impl ContributorRecord {
    pub fn new(name: &str, amount: f64, date: Option<NaiveDate>) -> Self {
        ContributorRecord {
            name: name.to_string(),
            amount,
            date,
            ledger: LedgerKind::Donation,
        }
    }

    /// Builder pattern: mark as a secondary-ledger record
    pub fn with_ledger(mut self, ledger: LedgerKind) -> Self {
        self.ledger = ledger;
        self
    }
}

/// One supported individual, optionally attributed to a contributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryRecord {
    pub name: String,

    /// Free-text contributor name typed by whoever filled the row
    pub declared_contributor: Option<String>,

    /// `None` when the cell was absent, empty or not a number
    pub monthly_support: Option<f64>,
}

impl BeneficiaryRecord {
    pub fn new(name: &str, declared_contributor: Option<&str>, monthly_support: Option<f64>) -> Self {
        BeneficiaryRecord {
            name: name.to_string(),
            declared_contributor: declared_contributor.map(|s| s.to_string()),
            monthly_support,
        }
    }

    /// Monthly support with the default substitution applied (absent / NaN → 0)
    pub fn resolved_support(&self) -> f64 {
        match self.monthly_support {
            Some(amount) if amount.is_finite() => amount,
            _ => 0.0,
        }
    }
}

// ============================================================================
// RAW ROWS (column names are the contract)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RawContributionRow {
    #[serde(rename = "שם התורם", alias = "שם", alias = "name", alias = "donor", default)]
    pub name: Option<String>,

    #[serde(rename = "סכום", alias = "שקלים", alias = "amount", default)]
    pub amount: Option<String>,

    #[serde(rename = "תאריך", alias = "date", default)]
    pub date: Option<String>,
}

impl RawContributionRow {
    pub fn validate(self, ledger: LedgerKind) -> std::result::Result<ContributorRecord, RowError> {
        let name = non_empty(self.name).ok_or(RowError::MissingName)?;
        let raw_amount = non_empty(self.amount).ok_or(RowError::MissingAmount)?;
        let amount = parse_amount(&raw_amount).ok_or(RowError::InvalidAmount(raw_amount))?;

        Ok(ContributorRecord {
            name,
            amount,
            date: self.date.as_deref().and_then(parse_date),
            ledger,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawBeneficiaryRow {
    #[serde(rename = "שם", alias = "name", default)]
    pub name: Option<String>,

    #[serde(rename = "תורם", alias = "donor", alias = "contributor", default)]
    pub declared_contributor: Option<String>,

    #[serde(rename = "סכום חודשי", alias = "monthly_support", default)]
    pub monthly_support: Option<String>,
}

impl RawBeneficiaryRow {
    pub fn validate(self) -> std::result::Result<BeneficiaryRecord, RowError> {
        let name = non_empty(self.name).ok_or(RowError::MissingName)?;

        Ok(BeneficiaryRecord {
            name,
            declared_contributor: non_empty(self.declared_contributor),
            monthly_support: self.monthly_support.as_deref().and_then(parse_amount),
        })
    }
}

// ============================================================================
// LOAD REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport<T> {
    pub records: Vec<T>,

    /// Rows dropped at the boundary (malformed, empty name, bad amount)
    pub skipped: usize,
}

impl<T> LoadReport<T> {
    pub fn empty() -> Self {
        LoadReport {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

// ============================================================================
// LOADERS
// ============================================================================

/// Load a contribution ledger from a CSV file
pub fn load_contributions_csv(path: &Path, ledger: LedgerKind) -> Result<LoadReport<ContributorRecord>> {
    let file = std::fs::File::open(path)?;
    let report = read_contributions(file, ledger)?;
    debug!(
        path = %path.display(),
        loaded = report.records.len(),
        skipped = report.skipped,
        "contribution ledger loaded"
    );
    Ok(report)
}

/// Load the beneficiary table from a CSV file
pub fn load_beneficiaries_csv(path: &Path) -> Result<LoadReport<BeneficiaryRecord>> {
    let file = std::fs::File::open(path)?;
    let report = read_beneficiaries(file)?;
    debug!(
        path = %path.display(),
        loaded = report.records.len(),
        skipped = report.skipped,
        "beneficiary table loaded"
    );
    Ok(report)
}

pub fn read_contributions<R: Read>(reader: R, ledger: LedgerKind) -> Result<LoadReport<ContributorRecord>> {
    read_rows(reader, ledger.as_str(), |row: RawContributionRow| row.validate(ledger))
}

pub fn read_beneficiaries<R: Read>(reader: R) -> Result<LoadReport<BeneficiaryRecord>> {
    read_rows(reader, "beneficiary", RawBeneficiaryRow::validate)
}

/// Deserialize and validate every row; only an unreadable header fails the whole load
fn read_rows<R, Raw, T, F>(reader: R, table: &str, validate: F) -> Result<LoadReport<T>>
where
    R: Read,
    Raw: for<'de> Deserialize<'de>,
    F: Fn(Raw) -> std::result::Result<T, RowError>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    // Fail early on a broken header row
    rdr.headers()?;

    let mut report = LoadReport::empty();
    for (index, result) in rdr.deserialize::<Raw>().enumerate() {
        // Line 1 is the header
        let line = index + 2;
        let outcome = result
            .map_err(|e| RowError::Malformed(e.to_string()))
            .and_then(&validate);

        match outcome {
            Ok(record) => report.records.push(record),
            Err(reason) => {
                warn!(table, line, %reason, "row skipped");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an amount cell: "1,000", "₪ 2000", "$45.99", "-300"
///
/// Returns `None` for empty, non-numeric or non-finite input.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '₪' | '$' | '€' | '£'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date cell (day-first formats as used in the ledgers, then ISO)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in ["%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    // Spreadsheet exports carry a time component
    for format in ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000"), Some(1000.0));
        assert_eq!(parse_amount("1,000"), Some(1000.0));
        assert_eq!(parse_amount("₪ 2,000"), Some(2000.0));
        assert_eq!(parse_amount("$45.99"), Some(45.99));
        assert_eq!(parse_amount("-300"), Some(-300.0));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("15/03/2024"), expected);
        assert_eq!(parse_date("2024-03-15"), expected);
        assert_eq!(parse_date("15.03.2024"), expected);
        assert_eq!(parse_date("2024-03-15 00:00:00"), expected);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("NaT"), None);
        assert_eq!(parse_date("32/13/2024"), None);
    }

    #[test]
    fn test_resolved_support_defaults_to_zero() {
        assert_eq!(BeneficiaryRecord::new("Dana", Some("ACME"), None).resolved_support(), 0.0);
        assert_eq!(
            BeneficiaryRecord::new("Dana", Some("ACME"), Some(f64::NAN)).resolved_support(),
            0.0
        );
        assert_eq!(
            BeneficiaryRecord::new("Dana", Some("ACME"), Some(1000.0)).resolved_support(),
            1000.0
        );
    }

    #[test]
    fn test_read_contributions_hebrew_headers() {
        let data = "תאריך,שם התורם,סכום\n01/02/2024,ACME Ltd,\"1,000\"\n,אור,500\n";
        let report = read_contributions(data.as_bytes(), LedgerKind::Donation).unwrap();

        assert_eq!(report.skipped, 0);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].name, "ACME Ltd");
        assert_eq!(report.records[0].amount, 1000.0);
        assert_eq!(report.records[0].date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(report.records[1].date, None);
        assert_eq!(report.records[1].ledger, LedgerKind::Donation);
    }

    #[test]
    fn test_read_contributions_skips_bad_rows() {
        let data = "name,amount,date\n\
                    ACME,1000,2024-01-01\n\
                    ,500,2024-01-02\n\
                    Globex,lots,2024-01-03\n\
                    Initech,,2024-01-04\n\
                    Umbrella,-50,\n";
        let report = read_contributions(data.as_bytes(), LedgerKind::Investor).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.records[1].name, "Umbrella");
        assert_eq!(report.records[1].amount, -50.0);
        assert_eq!(report.records[1].ledger, LedgerKind::Investor);
    }

    #[test]
    fn test_read_contributions_missing_name_column() {
        let data = "amount,date\n1000,2024-01-01\n";
        let report = read_contributions(data.as_bytes(), LedgerKind::Donation).unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_read_beneficiaries_trims_headers() {
        // The beneficiary sheet carries a trailing space in its name header
        let data = "שם ,תורם,סכום חודשי\nDana,ACME,1000\nNoa,,\nRuth,Globex,abc\n";
        let report = read_beneficiaries(data.as_bytes()).unwrap();

        assert_eq!(report.skipped, 0);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].declared_contributor.as_deref(), Some("ACME"));
        assert_eq!(report.records[0].monthly_support, Some(1000.0));
        assert_eq!(report.records[1].declared_contributor, None);
        assert_eq!(report.records[1].monthly_support, None);
        assert_eq!(report.records[2].monthly_support, None);
    }

    #[test]
    fn test_read_beneficiaries_skips_empty_names() {
        let data = "name,donor,monthly_support\n   ,ACME,1000\nDana,ACME,1000\n";
        let report = read_beneficiaries(data.as_bytes()).unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_load_contributions_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,amount,date").unwrap();
        writeln!(file, "ACME,2000,15/03/2024").unwrap();

        let report = load_contributions_csv(file.path(), LedgerKind::Donation).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].amount, 2000.0);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_beneficiaries_csv(&dir.path().join("missing.csv"));
        assert!(result.is_err());
    }
}
