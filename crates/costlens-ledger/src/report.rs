//! # Cost Report Decoder
//!
//! Strict decoder for the analyzer's `costs-report.json`. The report is a JSON
//! array of procedures:
//!
//! ```text
//! [
//!   {
//!     "procedure_name": "bar",
//!     "loc": { "file": "src/Foo.java", "lnum": 12 },
//!     "alloc_cost": { "hum": { "hum_polynomial": "0", "hum_degree": "0", "big_o": "O(1)" } },
//!     "exec_cost":  { "hum": { "hum_polynomial": "3 + n", "hum_degree": "1", "big_o": "O(n)" } }
//!   }
//! ]
//! ```
//!
//! Extra fields are ignored. Missing or mistyped required fields fail the
//! whole report: a partially-populated record set is never produced.
//!
//! `hum_degree` is accepted as an integer, a numeric string, or `"Top"` for
//! unbounded costs.

use crate::models::{Cost, CostRecord, DocumentId, LedgerError, Location, RecordId, Result};
use serde::Deserialize;

/// Degree marker the analyzer emits for costs it cannot bound.
const UNBOUNDED_DEGREE: &str = "Top";

/// One procedure entry as written by the analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCostItem {
    /// Simple procedure name.
    pub procedure_name: String,
    /// Declaration location.
    pub loc: RawLocation,
    /// Allocation cost.
    pub alloc_cost: RawCost,
    /// Execution cost.
    pub exec_cost: RawCost,
}

/// Location as written by the analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLocation {
    /// File path, relative to the directory the analyzer ran in.
    pub file: String,
    /// Line number; negative values are rejected.
    pub lnum: i64,
}

/// Wrapper around the human-readable cost block.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCost {
    /// Human-readable rendering of the cost.
    pub hum: RawHumanCost,
}

/// Human-readable cost fields.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHumanCost {
    /// Cost polynomial.
    pub hum_polynomial: String,
    /// Polynomial degree.
    pub hum_degree: RawDegree,
    /// Asymptotic class.
    pub big_o: String,
}

/// Degree as written by the analyzer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDegree {
    /// Degree written as a JSON number.
    Number(u32),
    /// Degree written as a string: digits or `"Top"`.
    Text(String),
}

impl RawDegree {
    fn resolve(&self) -> Result<Option<u32>> {
        match self {
            RawDegree::Number(degree) => Ok(Some(*degree)),
            RawDegree::Text(text) => {
                let text = text.trim();
                if text == UNBOUNDED_DEGREE {
                    return Ok(None);
                }
                text.parse::<u32>().map(Some).map_err(|_| {
                    LedgerError::MalformedReport(format!("invalid hum_degree {:?}", text))
                })
            }
        }
    }
}

impl RawCost {
    fn normalize(&self) -> Result<Cost> {
        Ok(Cost {
            polynomial: self.hum.hum_polynomial.clone(),
            degree: self.hum.hum_degree.resolve()?,
            big_o: self.hum.big_o.clone(),
        })
    }
}

/// Decodes the raw report bytes.
///
/// # Errors
///
/// Returns `LedgerError::MalformedReport` if the bytes are not a JSON array of
/// procedures with every required field present and correctly typed.
pub fn decode_report(bytes: &[u8]) -> Result<Vec<RawCostItem>> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::MalformedReport(e.to_string()))
}

/// Normalizes raw entries into cost records sorted by line number.
///
/// `document_for` maps the report's `loc.file` to the document the record
/// belongs to; the record id is derived from that document.
///
/// # Errors
///
/// Returns `LedgerError::MalformedReport` on an empty procedure name, a
/// negative line number, or an unparsable degree.
pub fn into_records<F>(items: Vec<RawCostItem>, mut document_for: F) -> Result<Vec<CostRecord>>
where
    F: FnMut(&str) -> DocumentId,
{
    let mut records = Vec::with_capacity(items.len());

    for item in items {
        if item.procedure_name.trim().is_empty() {
            return Err(LedgerError::MalformedReport(
                "procedure_name must not be empty".to_string(),
            ));
        }

        let lnum = u32::try_from(item.loc.lnum).map_err(|_| {
            LedgerError::MalformedReport(format!(
                "invalid line number {} for {}",
                item.loc.lnum, item.procedure_name
            ))
        })?;

        let document = document_for(&item.loc.file);
        records.push(CostRecord {
            id: RecordId::new(&document, &item.procedure_name),
            alloc_cost: item.alloc_cost.normalize()?,
            exec_cost: item.exec_cost.normalize()?,
            method_name: item.procedure_name,
            location: Location {
                file: item.loc.file,
                lnum,
            },
            timestamp: None,
        });
    }

    records.sort_by_key(|record| record.location.lnum);
    Ok(records)
}

/// Decodes and normalizes a report in one step.
///
/// # Example
///
/// ```rust
/// use costlens_ledger::report::parse_report;
/// use costlens_ledger::DocumentId;
///
/// let json = br#"[{
///     "procedure_name": "bar",
///     "loc": {"file": "Foo.java", "lnum": 4},
///     "alloc_cost": {"hum": {"hum_polynomial": "0", "hum_degree": "0", "big_o": "O(1)"}},
///     "exec_cost": {"hum": {"hum_polynomial": "n", "hum_degree": "1", "big_o": "O(n)"}}
/// }]"#;
///
/// let document = DocumentId::new("/work/Foo.java");
/// let records = parse_report(json, |_| document.clone()).unwrap();
/// assert_eq!(records[0].id.as_str(), "/work/Foo.java:bar");
/// assert_eq!(records[0].exec_cost.degree, Some(1));
/// ```
pub fn parse_report<F>(bytes: &[u8], document_for: F) -> Result<Vec<CostRecord>>
where
    F: FnMut(&str) -> DocumentId,
{
    into_records(decode_report(bytes)?, document_for)
}
