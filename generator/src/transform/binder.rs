//! Template binder.
//!
//! Templates are FOXML documents with `!!!Name!!!` sentinels. Binding
//! replaces every sentinel that has a value in a single pass over the
//! template, so substituted values are never rescanned and the order of
//! the placeholder map does not matter. Sentinels left over afterwards are
//! reported back to the caller instead of being silently kept.
//!
//! `!!!Anchor-X!!!` sentinels are splice points for the structural map and
//! are removed by [`strip_anchors`], never reported as unbound.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Delimiter on both sides of a sentinel name.
pub const SENTINEL_MARK: &str = "!!!";

/// Name prefix of structural map splice points.
pub const ANCHOR_PREFIX: &str = "Anchor-";

static SENTINEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!!![^!\s<>"]+!!!"#).expect("valid sentinel pattern"));

static ANCHOR_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*!!!Anchor-[A-Z]!!!").expect("valid anchor pattern"));

/// Full sentinel token for a placeholder name (`Title` -> `!!!Title!!!`).
pub fn sentinel(name: &str) -> String {
    format!("{SENTINEL_MARK}{name}{SENTINEL_MARK}")
}

/// Splice point token (`'A'` -> `!!!Anchor-A!!!`).
pub fn anchor(label: char) -> String {
    sentinel(&format!("{ANCHOR_PREFIX}{label}"))
}

fn is_anchor(token: &str) -> bool {
    token
        .strip_prefix(SENTINEL_MARK)
        .is_some_and(|rest| rest.starts_with(ANCHOR_PREFIX))
}

/// Placeholder name -> literal value.
///
/// Names must not contain `!`, whitespace, `<`, `>` or `"`.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: HashMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for `name`, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(sentinel(name), value.into());
        self
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&sentinel(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of binding a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub document: String,
    /// Distinct sentinels still present, in document order.
    pub unresolved: Vec<String>,
}

impl Bound {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Substitute every known sentinel in `template`.
///
/// # Example
/// ```ignore
/// let mut values = Placeholders::new();
/// values.insert("Title", "Reel 1");
/// let bound = bind("<t>!!!Title!!!</t><c>!!!Collection!!!</c>", &values);
/// assert_eq!(bound.document, "<t>Reel 1</t><c>!!!Collection!!!</c>");
/// assert_eq!(bound.unresolved, vec!["!!!Collection!!!"]);
/// ```
pub fn bind(template: &str, placeholders: &Placeholders) -> Bound {
    let document = SENTINEL_RE
        .replace_all(template, |caps: &Captures| {
            let token = &caps[0];
            placeholders
                .values
                .get(token)
                .cloned()
                .unwrap_or_else(|| token.to_string())
        })
        .into_owned();

    let unresolved = find_sentinels(&document);
    Bound {
        document,
        unresolved,
    }
}

/// Distinct non-anchor sentinels in `document`, in order of appearance.
pub fn find_sentinels(document: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in SENTINEL_RE.find_iter(document) {
        let token = m.as_str();
        if !is_anchor(token) && !found.iter().any(|t| t == token) {
            found.push(token.to_string());
        }
    }
    found
}

/// Remove splice-point lines together with the newline and indentation
/// before them.
pub fn strip_anchors(document: &str) -> String {
    ANCHOR_LINE_RE.replace_all(document, "").into_owned()
}
