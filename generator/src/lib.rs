//! # xmlgen - FOXML records from spreadsheet inventories
//!
//! xmlgen turns a CSV inventory of audio/video reels into FOXML ingest
//! documents: one holding-level UMDM record per reel, one file-level UMAM
//! record per digitized part, and a METS structural map linking them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Assembler  │────▶│ FOXML + txt │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (templates) │     │  summaries  │
//! └─────────────┘     └─────────────┘     └──────▲──────┘     └─────────────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │  PID list   │
//!                                         │ (registry)  │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xmlgen::{generate_csv, load_pid_file, write_batch, DirectorySink, GenerateOptions, TemplateSet};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = GenerateOptions::default();
//!     let templates = TemplateSet::load_dir("templates", &options.templates)?;
//!     let output = generate_csv("reels.csv", load_pid_file("pids.xml")?, &templates, &options)?;
//!     write_batch(&output, &mut DirectorySink::new("output"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Rows, identifiers, documents and summary entries
//! - [`parser`] - CSV parsing with auto-detection
//! - [`codec`] - Duration and date conversions
//! - [`transform`] - Binding, structural map, grouping, assembly and batch driver
//! - [`identifiers`] - PID files, queue and registry client
//! - [`store`] - Template loading and document sinks
//! - [`logs`] - Progress output

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Field conversions
pub mod codec;

// Transformation
pub mod transform;

// PIDs
pub mod identifiers;

// Templates and output
pub mod store;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BatchError, BatchResult, CodecError, CsvError, IdentifierError, StoreError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ArrangementMode,
    Diagnostic,
    Document,
    Identifier,
    RecordKind,
    Row,
    SummaryEntry,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    parse_str,
    parse_csv_file_auto,
    parse_bytes_auto,
    detect_encoding,
    detect_delimiter,
    decode_content,
    format_delimiter,
    ParseResult,
};

// =============================================================================
// Re-exports - Codecs
// =============================================================================

pub use codec::{
    convert_duration, date_markup, duration_literal, encode_date, format_minutes, DateAttributes,
};

// =============================================================================
// Re-exports - Identifiers
// =============================================================================

pub use identifiers::{load_pid_file, parse_pid_response, IdentifierQueue, PidClient, RegistryServer};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{DirectorySink, DocumentSink, MemorySink, TemplateNames, TemplateSet};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    current_timestamp,
    generate,
    generate_csv,
    write_batch,
    BatchOutput,
    GenerateOptions,
    Summary,
    DEFAULT_LINK_BASE,
};
pub use transform::{plan, BatchPlan};
