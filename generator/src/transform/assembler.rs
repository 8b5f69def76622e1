//! Record assembler.
//!
//! Turns rows into UMDM (parent) and UMAM (part) documents, one group at a
//! time. A group is open from its parent row until the next parent row or
//! the end of input; only then are its run time total and structural map
//! known, so the parent document is always emitted after its parts.
//!
//! ```text
//!            parent row                 part row
//!   Idle ─────────────────▶ InGroup ◀───────────┐
//!    ▲                         │  └──────────────┘
//!    │  next parent row / end  │
//!    └─────── emit parent ◀────┘
//! ```
//!
//! In single-row mode each row opens a group, adds itself as the only
//! part and closes the group straight away.

use rust_decimal::Decimal;
use serde::Serialize;

use super::binder::{bind, strip_anchors, Bound, Placeholders};
use super::grouper::{classify, empty_group};
use super::mets::{StructuralMapBuilder, MAP_ORDER_OFFSET};
use crate::codec::{convert_duration, date_markup, format_minutes, strip_inch_mark};
use crate::error::{BatchError, BatchResult};
use crate::identifiers::IdentifierQueue;
use crate::logs::{log_info, log_info_indent, log_warning};
use crate::models::{
    ArrangementMode, Diagnostic, Document, Identifier, RecordKind, Row, SummaryEntry,
};
use crate::store::TemplateSet;

// =============================================================================
// Field maps
// =============================================================================

/// Parent sentinels filled verbatim from a column.
pub const PARENT_FIELDS: &[(&str, &str)] = &[
    ("Title", "Title"),
    ("AlternateTitle", "Alternate Title"),
    ("Contributor", "Contributor"),
    ("ItemControlNumber", columns::CONTROL_NUMBER),
    ("Description/Summary", "Description/Summary"),
    ("CopyrightHolder", "Copyright Holder"),
    ("Continent", "Continent"),
    ("Country", "Country"),
    ("Region/State", "Region/State"),
    ("Settlement/City", "Settlement/City"),
    ("DateAnalogCreated", columns::DATE_CREATED),
    ("Repository", "Repository"),
    ("TypeOfMaterial", "TypeofMaterial"),
    ("Collection", "Collection"),
    ("BoxNumber", "Box Number"),
    ("AccessionNumber", "Accession Number"),
];

/// Part sentinels filled verbatim from a column.
pub const PART_FIELDS: &[(&str, &str)] = &[
    ("Title", "Title"),
    ("DigitizationNotes", "Digitization Notes"),
    ("FileName", columns::FILE_NAME),
    ("Mono/Stereo", "Mono/Stereo"),
    ("Sharestream", "ShareStreamURLs"),
    ("TrackFormat", "Track Format"),
    ("DateDigitized", "DateDigitized"),
    ("DigitizedByPers", "DigitizedByPers"),
];

/// Columns with special handling.
pub mod columns {
    pub const CONTROL_NUMBER: &str = "Item Control Number";
    pub const DATE_CREATED: &str = "DateAnalogCreated";
    pub const DATE_CERTAINTY: &str = "CreatedDateCertainty";
    pub const SIZE_REEL: &str = "SizeReel";
    pub const FILE_NAME: &str = "File Name";
    pub const RUN_TIME: &str = "TotalRunTimeDerivatives";
}

/// Sentinels computed by the assembler.
pub mod sentinels {
    pub const PID: &str = "PID";
    pub const TIMESTAMP: &str = "TimeStamp";
    pub const DATE_MARKUP: &str = "InsertDateHere";
    pub const SIZE_REEL: &str = "SizeReel";
    pub const PART_RUN_TIME: &str = "TotalRunTimeDerivatives";
    pub const GROUP_RUN_TIME: &str = "TotalRunTimeMasters";
    pub const STRUCTURAL_MAP: &str = "INSERT_METS_HERE";
}

// =============================================================================
// Settings and output
// =============================================================================

/// Per-batch values the assembler needs besides rows and identifiers.
#[derive(Debug, Clone)]
pub struct AssemblySettings {
    pub mode: ArrangementMode,
    pub discriminator: String,
    /// Prefix of parent deep links; the PID is appended.
    pub link_base: String,
    /// Written into every `!!!TimeStamp!!!`.
    pub timestamp: String,
}

/// Everything a batch produced, in emission order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Assembly {
    pub documents: Vec<Document>,
    /// Links summary, in identifier assignment order.
    pub entries: Vec<SummaryEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub groups: usize,
    pub parts: usize,
    pub identifiers_consumed: usize,
}

impl Assembly {
    fn emit(&mut self, identifier: Identifier, kind: RecordKind, bound: Bound) {
        if !bound.is_complete() {
            self.diagnostics.push(Diagnostic::UnboundPlaceholder {
                identifier: identifier.clone(),
                kind,
                sentinels: bound.unresolved,
            });
        }
        self.documents.push(Document {
            identifier,
            kind,
            content: bound.document,
        });
    }
}

// =============================================================================
// State machine
// =============================================================================

struct OpenGroup {
    parent: Row,
    identifier: Identifier,
    parts: usize,
    runtime: Decimal,
}

enum GroupState {
    Idle,
    InGroup(OpenGroup),
}

/// Assembles documents from rows pushed in file order.
pub struct RecordAssembler<'a> {
    templates: &'a TemplateSet,
    settings: AssemblySettings,
    ids: IdentifierQueue,
    map: StructuralMapBuilder<'a>,
    state: GroupState,
    output: Assembly,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(templates: &'a TemplateSet, ids: IdentifierQueue, settings: AssemblySettings) -> Self {
        let map = StructuralMapBuilder::new(&templates.map).with_timestamp(&settings.timestamp);
        Self {
            templates,
            settings,
            ids,
            map,
            state: GroupState::Idle,
            output: Assembly::default(),
        }
    }

    /// Process the next row.
    pub fn push(&mut self, row: &Row) -> BatchResult<()> {
        match self.settings.mode {
            ArrangementMode::Multi => self.push_multi(row),
            ArrangementMode::Single => self.push_single(row),
        }
    }

    /// Close any open group and hand back the output.
    pub fn finish(mut self) -> BatchResult<Assembly> {
        self.close_group()?;
        self.output.identifiers_consumed = self.ids.consumed();
        Ok(self.output)
    }

    fn push_multi(&mut self, row: &Row) -> BatchResult<()> {
        match classify(row, &self.settings.discriminator)? {
            RecordKind::Parent => {
                self.close_group()?;
                let identifier = self.next_identifier()?;
                self.open_group(row, identifier);
                Ok(())
            }
            RecordKind::Part => {
                if matches!(self.state, GroupState::Idle) {
                    return Err(BatchError::arrangement(
                        row.line,
                        "UMAM row before any UMDM row",
                    ));
                }
                let identifier = self.next_identifier()?;
                self.add_part(row, identifier)
            }
        }
    }

    fn push_single(&mut self, row: &Row) -> BatchResult<()> {
        // Part first, then parent
        let part_id = self.next_identifier()?;
        let parent_id = self.next_identifier()?;

        self.open_group(row, parent_id);
        self.add_part(row, part_id)?;
        self.close_group()
    }

    fn next_identifier(&mut self) -> BatchResult<Identifier> {
        let consumed = self.ids.consumed();
        self.ids.next_id().ok_or(BatchError::InsufficientIdentifiers {
            required: consumed + 1,
            available: consumed,
        })
    }

    fn open_group(&mut self, row: &Row, identifier: Identifier) {
        self.output.groups += 1;
        log_info(format!("FILE GROUP {}: UMDM = {}", self.output.groups, identifier.file_stem()));

        let link = format!("{}{}", self.settings.link_base, identifier);
        self.output.entries.push(SummaryEntry {
            control_number: row.value(columns::CONTROL_NUMBER).to_string(),
            kind: RecordKind::Parent,
            identifier: identifier.clone(),
            link: Some(link),
        });

        self.map.begin_group();
        self.state = GroupState::InGroup(OpenGroup {
            parent: row.clone(),
            identifier,
            parts: 0,
            runtime: Decimal::ZERO,
        });
    }

    fn add_part(&mut self, row: &Row, identifier: Identifier) -> BatchResult<()> {
        let group = match &mut self.state {
            GroupState::InGroup(group) => group,
            GroupState::Idle => {
                return Err(BatchError::arrangement(row.line, "part row outside a group"))
            }
        };

        let runtime = convert_duration(row.value(columns::RUN_TIME)).map_err(|source| {
            BatchError::InvalidField {
                line: row.line,
                column: columns::RUN_TIME.to_string(),
                source,
            }
        })?;

        let control_number = match row.value(columns::CONTROL_NUMBER) {
            "" => group.parent.value(columns::CONTROL_NUMBER),
            own => own,
        };
        self.output.entries.push(SummaryEntry {
            control_number: control_number.to_string(),
            kind: RecordKind::Part,
            identifier: identifier.clone(),
            link: None,
        });

        let mut values = Placeholders::new();
        fill_columns(&mut values, row, PART_FIELDS);
        values
            .insert(sentinels::PID, identifier.as_str())
            .insert(sentinels::TIMESTAMP, self.settings.timestamp.as_str());
        if row.get(columns::RUN_TIME).is_some() {
            values.insert(
                sentinels::PART_RUN_TIME,
                runtime.map(format_minutes).unwrap_or_default(),
            );
        }
        let bound = bind(&self.templates.child, &values);

        group.parts += 1;
        group.runtime += runtime.unwrap_or_default();
        self.map.append_child(
            group.parts + MAP_ORDER_OFFSET,
            &identifier,
            row.value(columns::FILE_NAME),
        );
        self.output.parts += 1;

        log_info_indent(
            format!("Part {}: UMAM = {}", group.parts, identifier.file_stem()),
            1,
        );
        self.output.emit(identifier, RecordKind::Part, bound);
        Ok(())
    }

    fn close_group(&mut self) -> BatchResult<()> {
        let group = match std::mem::replace(&mut self.state, GroupState::Idle) {
            GroupState::Idle => return Ok(()),
            GroupState::InGroup(group) => group,
        };
        if group.parts == 0 {
            return Err(empty_group(&group.parent));
        }

        let row = &group.parent;
        let dates = match row.get(columns::DATE_CREATED) {
            Some(value) => Some(
                date_markup(value, row.value(columns::DATE_CERTAINTY)).map_err(|source| {
                    BatchError::InvalidField {
                        line: row.line,
                        column: columns::DATE_CREATED.to_string(),
                        source,
                    }
                })?,
            ),
            None => None,
        };

        let mut values = Placeholders::new();
        fill_columns(&mut values, row, PARENT_FIELDS);
        values
            .insert(sentinels::PID, group.identifier.as_str())
            .insert(sentinels::TIMESTAMP, self.settings.timestamp.as_str())
            .insert(sentinels::GROUP_RUN_TIME, format_minutes(group.runtime))
            .insert(sentinels::STRUCTURAL_MAP, self.map.seal());
        if let Some(dates) = dates {
            values.insert(sentinels::DATE_MARKUP, dates);
        }
        if let Some(size) = row.get(columns::SIZE_REEL) {
            values.insert(sentinels::SIZE_REEL, strip_inch_mark(size));
        }

        let mut bound = bind(&self.templates.parent, &values);
        bound.document = strip_anchors(&bound.document);

        log_info_indent(
            format!(
                "UMDM with {} part(s), total runtime {}",
                group.parts,
                format_minutes(group.runtime)
            ),
            1,
        );
        if !bound.is_complete() {
            log_warning(format!(
                "{} left unbound in {}",
                bound.unresolved.join(", "),
                group.identifier
            ));
        }
        self.output.emit(group.identifier, RecordKind::Parent, bound);
        Ok(())
    }
}

/// Insert `sentinel <- column` for every column present in `row`.
fn fill_columns(values: &mut Placeholders, row: &Row, fields: &[(&str, &str)]) {
    for (sentinel, column) in fields {
        if let Some(value) = row.get(column) {
            values.insert(sentinel, value);
        }
    }
}
