//! Row classification and batch planning.
//!
//! Before anything is generated the whole table is walked once to check
//! that its rows form valid groups and to count the identifiers the batch
//! will consume.
//!
//! # Multi-row layout
//!
//! ```text
//! XML Type   rows                      groups
//! ┌──────┐   ┌────────────────────┐    ┌──────────────────────┐
//! │ UMDM │   │ Reel 1             │    │ Reel 1: part a, b    │
//! │ UMAM │   │   side a           │ →  ├──────────────────────┤
//! │ UMAM │   │   side b           │    │ Reel 2: part a       │
//! │ UMDM │   │ Reel 2             │    └──────────────────────┘
//! │ UMAM │   │   side a           │
//! └──────┘   └────────────────────┘
//! ```
//!
//! In single-row layout every row is a group of one part and consumes two
//! identifiers.

use serde::Serialize;

use crate::error::{BatchError, BatchResult};
use crate::models::{ArrangementMode, RecordKind, Row};

/// Column holding `UMDM` / `UMAM` in multi-row data.
pub const DEFAULT_DISCRIMINATOR: &str = "XML Type";

/// Counts for a batch that passed pre-flight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    pub groups: usize,
    pub parts: usize,
    pub identifiers_required: usize,
}

/// Classify a multi-row line by its discriminator column.
pub fn classify(row: &Row, discriminator: &str) -> BatchResult<RecordKind> {
    let code = row.get(discriminator).ok_or_else(|| {
        BatchError::arrangement(row.line, format!("missing '{}' column", discriminator))
    })?;

    RecordKind::from_code(code).ok_or_else(|| {
        BatchError::arrangement(
            row.line,
            format!("unknown {} '{}' (expected UMDM or UMAM)", discriminator, code),
        )
    })
}

/// Check grouping rules and count what the batch needs.
pub fn plan(rows: &[Row], mode: ArrangementMode, discriminator: &str) -> BatchResult<BatchPlan> {
    if rows.is_empty() {
        return Err(BatchError::EmptyInput);
    }

    match mode {
        ArrangementMode::Single => Ok(BatchPlan {
            groups: rows.len(),
            parts: rows.len(),
            identifiers_required: rows.len() * 2,
        }),
        ArrangementMode::Multi => plan_multi(rows, discriminator),
    }
}

fn plan_multi(rows: &[Row], discriminator: &str) -> BatchResult<BatchPlan> {
    let mut groups = 0;
    let mut parts = 0;
    // Parent row of the open group and its part count
    let mut open: Option<(&Row, usize)> = None;

    for row in rows {
        match classify(row, discriminator)? {
            RecordKind::Parent => {
                if let Some((parent, 0)) = open {
                    return Err(empty_group(parent));
                }
                groups += 1;
                open = Some((row, 0));
            }
            RecordKind::Part => match open.as_mut() {
                Some((_, count)) => {
                    *count += 1;
                    parts += 1;
                }
                None => {
                    return Err(BatchError::arrangement(
                        row.line,
                        "UMAM row before any UMDM row",
                    ))
                }
            },
        }
    }

    if let Some((parent, 0)) = open {
        return Err(empty_group(parent));
    }

    Ok(BatchPlan {
        groups,
        parts,
        identifiers_required: groups + parts,
    })
}

pub(crate) fn empty_group(parent: &Row) -> BatchError {
    BatchError::arrangement(parent.line, "UMDM row has no UMAM rows")
}
