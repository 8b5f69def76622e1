//! Transformation module.
//!
//! Turns parsed rows into FOXML documents:
//! - Binder: sentinel substitution into templates
//! - Mets: structural map accumulation
//! - Grouper: row classification and pre-flight planning
//! - Assembler: per-row state machine building UMDM/UMAM documents
//! - Pipeline: batch driver and summary lists

pub mod assembler;
pub mod binder;
pub mod grouper;
pub mod mets;
pub mod pipeline;

pub use assembler::{Assembly, AssemblySettings, RecordAssembler};
pub use binder::{bind, find_sentinels, sentinel, strip_anchors, Bound, Placeholders};
pub use grouper::{classify, plan, BatchPlan, DEFAULT_DISCRIMINATOR};
pub use mets::{MapTemplates, StructuralMapBuilder, MAP_ORDER_OFFSET};
pub use pipeline::*;
