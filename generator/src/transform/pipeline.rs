//! Batch driver.
//!
//! Combines every step of a run: parsing, pre-flight checks, assembly and
//! writing. A batch is all-or-nothing: documents are assembled in memory
//! and only handed to the sink once every row went through.
//!
//! # Example
//!
//! ```rust,ignore
//! use xmlgen::{generate_csv, load_pid_file, write_batch, DirectorySink, GenerateOptions, TemplateSet};
//!
//! let options = GenerateOptions::default();
//! let templates = TemplateSet::load_dir("templates", &options.templates)?;
//! let pids = load_pid_file("pids.xml")?;
//!
//! let output = generate_csv("reels.csv", pids, &templates, &options)?;
//! write_batch(&output, &mut DirectorySink::new("output"))?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::assembler::{AssemblySettings, RecordAssembler};
use super::grouper::{plan, BatchPlan, DEFAULT_DISCRIMINATOR};
use crate::error::{BatchError, BatchResult, StoreResult};
use crate::identifiers::IdentifierQueue;
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{ArrangementMode, Diagnostic, Document, Identifier, RecordKind, Row, SummaryEntry};
use crate::parser::{format_delimiter, parse_csv_file_auto};
use crate::store::{DocumentSink, TemplateNames, TemplateSet};

/// Default prefix of parent deep links.
pub const DEFAULT_LINK_BASE: &str = "http://digital.lib.umd.edu/video?pid=";

/// Summary list names.
pub const PIDS_SUMMARY: &str = "pids";
pub const PARENT_PIDS_SUMMARY: &str = "UMDMpids";
pub const LINKS_SUMMARY: &str = "links";

/// Options for a generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Single or multi-row input
    pub arrangement: ArrangementMode,

    /// Column with `UMDM` / `UMAM` in multi-row input
    pub discriminator: String,

    /// Prefix for parent deep links in the links summary
    pub link_base: String,

    /// Template file names
    pub templates: TemplateNames,

    /// Fixed timestamp; current UTC time when unset
    pub timestamp: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            arrangement: ArrangementMode::Multi,
            discriminator: DEFAULT_DISCRIMINATOR.to_string(),
            link_base: DEFAULT_LINK_BASE.to_string(),
            templates: TemplateNames::default(),
            timestamp: None,
        }
    }
}

/// The three summary lists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    /// Every emitted identifier, in emission order
    pub identifiers: Vec<Identifier>,
    /// Parent identifiers only, in emission order
    pub parent_identifiers: Vec<Identifier>,
    /// One entry per record, in identifier assignment order
    pub links: Vec<SummaryEntry>,
}

impl Summary {
    fn collect(documents: &[Document], links: Vec<SummaryEntry>) -> Self {
        let identifiers = documents.iter().map(|d| d.identifier.clone()).collect();
        let parent_identifiers = documents
            .iter()
            .filter(|d| d.kind == RecordKind::Parent)
            .map(|d| d.identifier.clone())
            .collect();
        Self {
            identifiers,
            parent_identifiers,
            links,
        }
    }

    /// `pids.txt` content.
    pub fn render_identifiers(&self) -> String {
        join_lines(&self.identifiers)
    }

    /// `UMDMpids.txt` content.
    pub fn render_parent_identifiers(&self) -> String {
        join_lines(&self.parent_identifiers)
    }

    /// `links.txt` content: quoted CSV, deep link on parent rows only.
    pub fn render_links(&self) -> StoreResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());
        for entry in &self.links {
            writer.write_record(entry.to_record())?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn join_lines(identifiers: &[Identifier]) -> String {
    identifiers
        .iter()
        .map(Identifier::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result of a generation run, not yet written
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub plan: BatchPlan,
    pub documents: Vec<Document>,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
    pub identifiers_consumed: usize,
    pub identifiers_unused: usize,
}

/// Current UTC time in the repository's timestamp format.
pub fn current_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

/// Parse a CSV file and generate its documents.
pub fn generate_csv(
    path: impl AsRef<Path>,
    identifiers: Vec<Identifier>,
    templates: &TemplateSet,
    options: &GenerateOptions,
) -> BatchResult<BatchOutput> {
    log_info(format!("📖 Reading {}...", path.as_ref().display()));
    let parsed = parse_csv_file_auto(path)?;
    log_success(format!(
        "Read {} rows ({}, delimiter '{}')",
        parsed.rows.len(),
        parsed.encoding,
        format_delimiter(parsed.delimiter)
    ));
    generate(&parsed.rows, identifiers, templates, options)
}

/// Generate every document for `rows`.
///
/// Fails before assembling anything if the rows do not form valid groups
/// or if fewer identifiers were supplied than the batch needs.
pub fn generate(
    rows: &[Row],
    identifiers: Vec<Identifier>,
    templates: &TemplateSet,
    options: &GenerateOptions,
) -> BatchResult<BatchOutput> {
    let plan = plan(rows, options.arrangement, &options.discriminator)?;
    log_info(format!(
        "{} group(s), {} part(s): {} PIDs needed",
        plan.groups, plan.parts, plan.identifiers_required
    ));

    let queue = IdentifierQueue::new(identifiers);
    queue
        .ensure(plan.identifiers_required)
        .map_err(|_| BatchError::InsufficientIdentifiers {
            required: plan.identifiers_required,
            available: queue.remaining(),
        })?;
    let unused = queue.remaining() - plan.identifiers_required;

    let settings = AssemblySettings {
        mode: options.arrangement,
        discriminator: options.discriminator.clone(),
        link_base: options.link_base.clone(),
        timestamp: options.timestamp.clone().unwrap_or_else(current_timestamp),
    };

    let mut assembler = RecordAssembler::new(templates, queue, settings);
    for row in rows {
        assembler.push(row)?;
    }
    let assembly = assembler.finish()?;

    for diagnostic in &assembly.diagnostics {
        log_warning(diagnostic.to_string());
    }
    if unused > 0 {
        log_info(format!("{} PID(s) left unused", unused));
    }
    log_success(format!(
        "Assembled {} documents in {} group(s)",
        assembly.documents.len(),
        assembly.groups
    ));

    let summary = Summary::collect(&assembly.documents, assembly.entries);
    Ok(BatchOutput {
        plan,
        documents: assembly.documents,
        summary,
        diagnostics: assembly.diagnostics,
        identifiers_consumed: assembly.identifiers_consumed,
        identifiers_unused: unused,
    })
}

/// Write every document, then the three summary lists.
///
/// Returns the number of files written.
pub fn write_batch(output: &BatchOutput, sink: &mut dyn DocumentSink) -> StoreResult<usize> {
    // Render first so a summary failure leaves nothing half-written
    let links = output.summary.render_links()?;

    for document in &output.documents {
        sink.write_document(&document.file_stem(), &document.content)?;
    }
    sink.write_summary(PIDS_SUMMARY, &output.summary.render_identifiers())?;
    sink.write_summary(PARENT_PIDS_SUMMARY, &output.summary.render_parent_identifiers())?;
    sink.write_summary(LINKS_SUMMARY, &links)?;

    let written = output.documents.len() + 3;
    log_success(format!(
        "{} files written: {} FOXML files plus pids, UMDMpids and links",
        written,
        output.documents.len()
    ));
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::store::MemorySink;
    use crate::transform::mets::MapTemplates;

    const DATA: &str = "\
XML Type,Item Control Number,Title,File Name,TotalRunTimeDerivatives,DateAnalogCreated,CreatedDateCertainty
UMDM,0001,Concert,,,1965,single exact date
UMAM,0001,Side A,reel1_a.wav,00:10:00,,
UMAM,0001,Side B,reel1_b.wav,00:05:30,,
";

    fn templates() -> TemplateSet {
        TemplateSet::new(
            "<umdm pid=\"!!!PID!!!\" title=\"!!!Title!!!\" runtime=\"!!!TotalRunTimeMasters!!!\" at=\"!!!TimeStamp!!!\">\n  !!!InsertDateHere!!!\n  !!!INSERT_METS_HERE!!!\n</umdm>",
            "<umam pid=\"!!!PID!!!\" title=\"!!!Title!!!\" runtime=\"!!!TotalRunTimeDerivatives!!!\"/>",
            MapTemplates::new(
                "<mets>\n    !!!Anchor-A!!!\n  </mets>",
                "<div ORDER=\"!!!Order!!!\" ID=\"!!!ID!!!\" PID=\"!!!PID!!!\" FILE=\"!!!FileName!!!\"/>\n    ",
                "",
                "",
            ),
        )
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            timestamp: Some("2013-09-01T12:00:00.000000Z".to_string()),
            ..GenerateOptions::default()
        }
    }

    fn pids(n: usize) -> Vec<Identifier> {
        (1..=n).map(|i| Identifier::new(format!("umd:{}", 100 + i))).collect()
    }

    #[test]
    fn test_default_options() {
        let opts = GenerateOptions::default();
        assert_eq!(opts.arrangement, ArrangementMode::Multi);
        assert_eq!(opts.discriminator, "XML Type");
        assert!(opts.timestamp.is_none());
    }

    #[test]
    fn test_end_to_end_multi_row() {
        let rows = parse_str(DATA, ',').unwrap().rows;
        let output = generate(&rows, pids(3), &templates(), &options()).unwrap();

        let parents: Vec<&Document> = output
            .documents
            .iter()
            .filter(|d| d.kind == RecordKind::Parent)
            .collect();
        assert_eq!(parents.len(), 1);
        assert_eq!(output.documents.len(), 3);

        let umdm = &parents[0].content;
        assert!(umdm.contains("runtime=\"15.50\""));
        assert!(umdm.contains("title=\"Concert\""));
        assert!(umdm.contains("at=\"2013-09-01T12:00:00.000000Z\""));
        assert!(umdm.contains(r#"<date certainty="exact" era="ad">1965</date>"#));
        assert!(umdm.contains(r#"<div ORDER="1" ID="3" PID="umd:102" FILE="reel1_a.wav"/>"#));
        assert!(umdm.contains(r#"<div ORDER="2" ID="4" PID="umd:103" FILE="reel1_b.wav"/>"#));

        assert_eq!(output.summary.identifiers.len(), 3);
        assert_eq!(output.summary.parent_identifiers, vec![Identifier::new("umd:101")]);
        assert_eq!(output.identifiers_consumed, 3);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_write_batch_files() {
        let rows = parse_str(DATA, ',').unwrap().rows;
        let output = generate(&rows, pids(4), &templates(), &options()).unwrap();
        assert_eq!(output.identifiers_unused, 1);

        let mut sink = MemorySink::new();
        let written = write_batch(&output, &mut sink).unwrap();
        assert_eq!(written, 6);

        assert!(sink.document("umd_101").is_some());
        assert!(sink.document("umd_102").unwrap().contains("runtime=\"10.00\""));
        assert_eq!(sink.summary(PIDS_SUMMARY), Some("umd:102\numd:103\numd:101"));
        assert_eq!(sink.summary(PARENT_PIDS_SUMMARY), Some("umd:101"));
        assert_eq!(
            sink.summary(LINKS_SUMMARY),
            Some(
                "\"0001\",\"UMDM\",\"umd:101\",\"http://digital.lib.umd.edu/video?pid=umd:101\"\n\
                 \"0001\",\"UMAM\",\"umd:102\"\n\
                 \"0001\",\"UMAM\",\"umd:103\"\n"
            )
        );
    }

    #[test]
    fn test_insufficient_identifiers_writes_nothing() {
        let rows = parse_str(DATA, ',').unwrap().rows;
        let mut sink = MemorySink::new();

        let result = generate(&rows, pids(2), &templates(), &options())
            .and_then(|output| write_batch(&output, &mut sink).map_err(BatchError::from));

        assert!(matches!(
            result,
            Err(BatchError::InsufficientIdentifiers { required: 3, available: 2 })
        ));
        assert!(sink.documents.is_empty());
        assert!(sink.summaries.is_empty());
    }

    #[test]
    fn test_single_row_identifier_count() {
        let data = "Item Control Number,Title,File Name,TotalRunTimeDerivatives\n\
                    0001,Tape 1,t1.wav,00:30:00\n\
                    0002,Tape 2,t2.wav,00:00:45\n";
        let rows = parse_str(data, ',').unwrap().rows;
        let opts = GenerateOptions {
            arrangement: ArrangementMode::Single,
            ..options()
        };

        let output = generate(&rows, pids(4), &templates(), &opts).unwrap();
        assert_eq!(output.plan.identifiers_required, 4);
        assert_eq!(output.identifiers_consumed, 4);
        assert_eq!(output.summary.parent_identifiers.len(), 2);
        assert!(generate(&rows, pids(3), &templates(), &opts).is_err());
    }

    #[test]
    fn test_malformed_row_aborts_before_assembly() {
        let data = "XML Type,Title\nUMDM,Reel\nUMAM,Side\nFOO,?\n";
        let rows = parse_str(data, ',').unwrap().rows;

        let err = generate(&rows, pids(3), &templates(), &options()).unwrap_err();
        assert!(matches!(err, BatchError::MalformedRowArrangement { line: 4, .. }));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = current_timestamp();
        assert!(ts.ends_with('Z'));
        // 2013-09-01T12:00:00.000000Z
        assert_eq!(ts.len(), 27);
    }
}
