//! Error types for the record generation pipeline.
//!
//! This module defines one error type per layer:
//!
//! - [`CsvError`] - Row source (CSV) errors
//! - [`CodecError`] - Field encoding errors (durations, dates)
//! - [`IdentifierError`] - Identifier registry / PID file errors
//! - [`StoreError`] - Template loading and document writing errors
//! - [`BatchError`] - Top-level batch errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file contents.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Field Codec Errors
// =============================================================================

/// Errors while encoding a field value into its document literal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CodecError {
    /// Duration is not `H:MM:SS` or has non-numeric components.
    #[error("Malformed duration '{0}' (expected H:MM:SS)")]
    MalformedDuration(String),

    /// Date range does not split into 2 or 6 parts.
    #[error("Unsupported date shape '{value}': {parts} part(s), expected 2 or 6")]
    UnsupportedDateShape { value: String, parts: usize },
}

// =============================================================================
// Identifier Errors
// =============================================================================

/// Errors from the identifier registry or a saved PID file.
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// Missing registry credentials.
    #[error("Missing registry credentials: {0}")]
    MissingCredentials(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Registry answered with a non-success status.
    #[error("Registry error: {0}")]
    ServerError(String),

    /// Fewer identifiers than required.
    #[error("Not enough identifiers: {required} required, {available} available")]
    Insufficient { required: usize, available: usize },

    /// Failed to read a PID file.
    #[error("PID file error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the template store and the document sink.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Template file not found.
    #[error("Template not found: {0}")]
    MissingTemplate(String),

    /// IO error.
    #[error("Store IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Summary serialization error.
    #[error("Summary write error: {0}")]
    SummaryError(#[from] csv::Error),
}

// =============================================================================
// Batch Errors (top-level)
// =============================================================================

/// Top-level batch errors.
///
/// Every variant is fatal: the batch stops and nothing is written.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Pre-flight check failed.
    #[error("Not enough identifiers for this dataset: {required} required, {available} supplied")]
    InsufficientIdentifiers { required: usize, available: usize },

    /// Unknown discriminator, unknown arrangement mode, or a row out of place.
    #[error("Malformed row arrangement at line {line}: {message}")]
    MalformedRowArrangement { line: usize, message: String },

    /// A field could not be encoded.
    #[error("Line {line}, column '{column}': {source}")]
    InvalidField {
        line: usize,
        column: String,
        #[source]
        source: CodecError,
    },

    /// No rows to process.
    #[error("No rows to process")]
    EmptyInput,

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Identifier source error.
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// Template store or document sink error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl BatchError {
    /// Shorthand for [`BatchError::MalformedRowArrangement`].
    pub fn arrangement(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedRowArrangement {
            line,
            message: message.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for field codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for identifier operations.
pub type IdentifierResult<T> = Result<T, IdentifierError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
