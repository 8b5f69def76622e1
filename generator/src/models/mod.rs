//! Domain models for the record generation pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Row`] - One line of the input table
//! - [`Identifier`] - Repository PID assigned to a record
//! - [`RecordKind`] - Parent (UMDM) or part (UMAM) record
//! - [`ArrangementMode`] - Single or multi-row input layout
//! - [`Document`] - A generated FOXML document
//! - [`SummaryEntry`] - One line of the links summary
//! - [`Diagnostic`] - Non-fatal findings collected during a batch

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::BatchError;

// =============================================================================
// Row
// =============================================================================

/// One line of the input table, keyed by header name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Row {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    /// Column name -> raw value.
    pub fields: HashMap<String, String>,
}

impl Row {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: HashMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests.
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.fields.insert(column.to_string(), value.to_string());
        self
    }

    /// Raw value of a column, `None` if the column is absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Raw value of a column, empty if the column is absent.
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }
}

// =============================================================================
// Identifier
// =============================================================================

/// An opaque repository identifier such as `umd:123456`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename-safe form: the namespace separator becomes an underscore.
    pub fn file_stem(&self) -> String {
        self.0.replace(':', "_")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Record Kind
// =============================================================================

/// Kind of record a row or document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Holding-level record (UMDM).
    Parent,
    /// File-level record (UMAM).
    Part,
}

impl RecordKind {
    /// Parse the `XML Type` discriminator.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "UMDM" => Some(Self::Parent),
            "UMAM" => Some(Self::Part),
            _ => None,
        }
    }

    /// Discriminator code as written in data files and summaries.
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Parent => "UMDM",
            Self::Part => "UMAM",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_code())
    }
}

// =============================================================================
// Arrangement Mode
// =============================================================================

/// How the input table lays out items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArrangementMode {
    /// One row per item, carrying both parent and part fields.
    Single,
    /// One parent row followed by one row per part.
    #[default]
    Multi,
}

impl ArrangementMode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "S" | "SINGLE" => Some(Self::Single),
            "M" | "MULTI" | "MULTIPLE" => Some(Self::Multi),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::Multi => "M",
        }
    }
}

impl FromStr for ArrangementMode {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| {
            BatchError::arrangement(0, format!("unknown arrangement mode '{}' (expected S or M)", s))
        })
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// A generated FOXML document, not yet persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub identifier: Identifier,
    pub kind: RecordKind,
    pub content: String,
}

impl Document {
    /// Name under which the document is persisted (without extension).
    pub fn file_stem(&self) -> String {
        self.identifier.file_stem()
    }
}

/// One line of the links summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub control_number: String,
    pub kind: RecordKind,
    pub identifier: Identifier,
    /// Deep link, parent records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl SummaryEntry {
    /// Fields in output order.
    pub fn to_record(&self) -> Vec<&str> {
        let mut record = vec![
            self.control_number.as_str(),
            self.kind.to_code(),
            self.identifier.as_str(),
        ];
        if let Some(ref link) = self.link {
            record.push(link);
        }
        record
    }
}

/// Non-fatal finding reported after the batch completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A template sentinel was left without a value.
    UnboundPlaceholder {
        identifier: Identifier,
        kind: RecordKind,
        sentinels: Vec<String>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnboundPlaceholder {
                identifier,
                kind,
                sentinels,
            } => write!(
                f,
                "{} {}: unbound placeholder(s) {}",
                kind,
                identifier,
                sentinels.join(", ")
            ),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_file_stem() {
        let id = Identifier::new(" umd:12345 ");
        assert_eq!(id.as_str(), "umd:12345");
        assert_eq!(id.file_stem(), "umd_12345");
    }

    #[test]
    fn test_record_kind_from_code() {
        assert_eq!(RecordKind::from_code("UMDM"), Some(RecordKind::Parent));
        assert_eq!(RecordKind::from_code(" umam "), Some(RecordKind::Part));
        assert_eq!(RecordKind::from_code("MODS"), None);
        assert_eq!(RecordKind::from_code(""), None);
    }

    #[test]
    fn test_arrangement_mode_parse() {
        assert_eq!("S".parse::<ArrangementMode>().unwrap(), ArrangementMode::Single);
        assert_eq!("m".parse::<ArrangementMode>().unwrap(), ArrangementMode::Multi);
        let err = "X".parse::<ArrangementMode>().unwrap_err();
        assert!(matches!(err, BatchError::MalformedRowArrangement { .. }));
    }

    #[test]
    fn test_row_missing_column() {
        let row = Row::new(2).with("Title", "Reel 1");
        assert_eq!(row.get("Title"), Some("Reel 1"));
        assert_eq!(row.get("Collection"), None);
        assert_eq!(row.value("Collection"), "");
    }

    #[test]
    fn test_summary_record_fields() {
        let entry = SummaryEntry {
            control_number: "0001".into(),
            kind: RecordKind::Part,
            identifier: Identifier::new("umd:2"),
            link: None,
        };
        assert_eq!(entry.to_record(), vec!["0001", "UMAM", "umd:2"]);
    }
}
