//! Structural map (METS) builder.
//!
//! The map is a skeleton document with three splice points,
//! `!!!Anchor-A!!!`, `!!!Anchor-B!!!` and `!!!Anchor-C!!!`. Every part of
//! a group contributes one rendered snippet per splice point; snippets
//! land before their anchor in append order.
//!
//! ```text
//! skeleton           after two parts           sealed
//! ┌──────────────┐   ┌──────────────────┐     ┌──────────────┐
//! │ <fileSec>    │   │ <fileSec>        │     │ <fileSec>    │
//! │  Anchor-A    │ → │  A(1) A(2)       │  →  │  A(1) A(2)   │
//! │ <structMap>  │   │  Anchor-A        │     │ <structMap>  │
//! │  Anchor-B    │   │ <structMap> ...  │     │  B(1) B(2)   │
//! └──────────────┘   └──────────────────┘     └──────────────┘
//! ```

use serde::{Deserialize, Serialize};

use super::binder::{anchor, bind, strip_anchors, Placeholders};
use crate::models::Identifier;

/// Order indices start after the two collection slots that precede the
/// parts in the repository's structural map.
pub const MAP_ORDER_OFFSET: usize = 2;

/// Splice point labels, in snippet order.
pub const ANCHOR_LABELS: [char; 3] = ['A', 'B', 'C'];

/// The skeleton and its three per-part snippets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapTemplates {
    pub skeleton: String,
    /// Snippets for anchors A, B and C.
    pub snippets: [String; 3],
}

impl MapTemplates {
    pub fn new(skeleton: impl Into<String>, a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        Self {
            skeleton: skeleton.into(),
            snippets: [a.into(), b.into(), c.into()],
        }
    }
}

/// Accumulates the structural map of one group.
#[derive(Debug, Clone)]
pub struct StructuralMapBuilder<'a> {
    templates: &'a MapTemplates,
    sections: [Vec<String>; 3],
    last_order: Option<usize>,
    /// Batch-wide values bound into the skeleton and every snippet.
    shared: Placeholders,
}

impl<'a> StructuralMapBuilder<'a> {
    pub fn new(templates: &'a MapTemplates) -> Self {
        Self {
            templates,
            sections: Default::default(),
            last_order: None,
            shared: Placeholders::new(),
        }
    }

    /// Bind `!!!TimeStamp!!!` wherever it appears in the map templates.
    pub fn with_timestamp(mut self, timestamp: &str) -> Self {
        self.shared.insert("TimeStamp", timestamp);
        self
    }

    /// Start a new group with an empty map.
    pub fn begin_group(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
        self.last_order = None;
    }

    /// Number of children appended since [`begin_group`](Self::begin_group).
    pub fn len(&self) -> usize {
        self.sections[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add one child. `order_index` already includes [`MAP_ORDER_OFFSET`]
    /// and must grow strictly within a group.
    pub fn append_child(&mut self, order_index: usize, identifier: &Identifier, file_name: &str) {
        debug_assert!(
            order_index > self.last_order.unwrap_or(MAP_ORDER_OFFSET),
            "order index {} out of sequence",
            order_index
        );
        self.last_order = Some(order_index);

        let mut values = self.shared.clone();
        values
            .insert("FileName", file_name)
            .insert("ID", order_index.to_string())
            .insert("PID", identifier.as_str())
            .insert("Order", order_index.saturating_sub(MAP_ORDER_OFFSET).to_string());

        for (section, snippet) in self.sections.iter_mut().zip(&self.templates.snippets) {
            section.push(bind(snippet, &values).document);
        }
    }

    /// Render the map for insertion into the parent document.
    ///
    /// Does not consume the accumulated children; calling it twice gives
    /// the same text.
    pub fn seal(&self) -> String {
        let mut map = bind(&self.templates.skeleton, &self.shared).document;
        for (label, section) in ANCHOR_LABELS.iter().zip(&self.sections) {
            let token = anchor(*label);
            let spliced = format!("{}{}", section.concat(), token);
            map = map.replace(&token, &spliced);
        }
        strip_anchors(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> MapTemplates {
        MapTemplates::new(
            "<mets>\n  <files>\n    !!!Anchor-A!!!\n  </files>\n  <map>\n    !!!Anchor-B!!!\n  </map>\n  <links>\n    !!!Anchor-C!!!\n  </links>\n</mets>",
            "<file ID=\"!!!ID!!!\" name=\"!!!FileName!!!\"/>\n    ",
            "<div ORDER=\"!!!Order!!!\" FILEID=\"!!!ID!!!\"/>\n    ",
            "<pid ID=\"!!!ID!!!\">!!!PID!!!</pid>\n    ",
        )
    }

    #[test]
    fn test_empty_map_strips_anchors() {
        let templates = templates();
        let builder = StructuralMapBuilder::new(&templates);

        let sealed = builder.seal();
        assert!(!sealed.contains("Anchor"));
        assert!(sealed.contains("<files>\n  </files>"));
    }

    #[test]
    fn test_children_in_order() {
        let templates = templates();
        let mut builder = StructuralMapBuilder::new(&templates);
        builder.begin_group();
        builder.append_child(3, &Identifier::new("umd:2"), "reel1_a.wav");
        builder.append_child(4, &Identifier::new("umd:3"), "reel1_b.wav");

        let sealed = builder.seal();
        let first = sealed.find("reel1_a.wav").unwrap();
        let second = sealed.find("reel1_b.wav").unwrap();
        assert!(first < second);

        assert!(sealed.contains(r#"<file ID="3" name="reel1_a.wav"/>"#));
        assert!(sealed.contains(r#"<div ORDER="1" FILEID="3"/>"#));
        assert!(sealed.contains(r#"<div ORDER="2" FILEID="4"/>"#));
        assert!(sealed.contains(r#"<pid ID="4">umd:3</pid>"#));
        assert!(!sealed.contains("!!!"));
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_seal_is_idempotent() {
        let templates = templates();
        let mut builder = StructuralMapBuilder::new(&templates);
        builder.append_child(3, &Identifier::new("umd:2"), "a.wav");

        let first = builder.seal();
        let second = builder.seal();
        assert_eq!(first, second);
        assert_eq!(first.matches("a.wav").count(), 1);
    }

    #[test]
    fn test_begin_group_resets() {
        let templates = templates();
        let mut builder = StructuralMapBuilder::new(&templates);
        builder.append_child(3, &Identifier::new("umd:2"), "old.wav");
        builder.begin_group();
        builder.append_child(3, &Identifier::new("umd:9"), "new.wav");

        let sealed = builder.seal();
        assert!(!sealed.contains("old.wav"));
        assert!(sealed.contains("new.wav"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_timestamp_in_skeleton_and_snippets() {
        let templates = MapTemplates::new(
            "<mets CREATEDATE=\"!!!TimeStamp!!!\">\n  !!!Anchor-A!!!\n</mets>",
            "<file ID=\"!!!ID!!!\" at=\"!!!TimeStamp!!!\"/>\n  ",
            "",
            "",
        );
        let mut builder =
            StructuralMapBuilder::new(&templates).with_timestamp("2013-09-01T00:00:00.000000Z");
        builder.append_child(3, &Identifier::new("umd:2"), "a.wav");

        let sealed = builder.seal();
        assert!(sealed.starts_with("<mets CREATEDATE=\"2013-09-01T00:00:00.000000Z\">"));
        assert!(sealed.contains("<file ID=\"3\" at=\"2013-09-01T00:00:00.000000Z\"/>"));
        assert!(!sealed.contains("!!!"));
    }

    #[test]
    fn test_layout_matches_spliced_snippets() {
        let templates = templates();
        let mut builder = StructuralMapBuilder::new(&templates);
        builder.append_child(3, &Identifier::new("umd:2"), "a.wav");

        let sealed = builder.seal();
        assert!(sealed.contains("<files>\n    <file ID=\"3\" name=\"a.wav\"/>\n  </files>"));
    }
}
