//! Template store and document sink.
//!
//! Templates are loaded once from a directory before processing starts.
//! Generated documents go to `<output>/foxml/<pid>.xml` and summary lists
//! to `<output>/<name>.txt`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::transform::mets::MapTemplates;

/// Default output directory (relative to current dir)
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Sub-directory for FOXML documents
const DOCUMENT_DIR: &str = "foxml";

// =============================================================================
// Templates
// =============================================================================

/// File names of the six templates inside the template directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateNames {
    pub parent: String,
    pub child: String,
    pub map_skeleton: String,
    pub map_snippets: [String; 3],
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            parent: "umdm.xml".to_string(),
            child: "umam.xml".to_string(),
            map_skeleton: "mets.xml".to_string(),
            map_snippets: [
                "metsA.xml".to_string(),
                "metsB.xml".to_string(),
                "metsC.xml".to_string(),
            ],
        }
    }
}

/// All templates a batch needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSet {
    /// Holding-level (UMDM) document.
    pub parent: String,
    /// File-level (UMAM) document.
    pub child: String,
    /// Structural map skeleton and snippets.
    pub map: MapTemplates,
}

impl TemplateSet {
    pub fn new(parent: impl Into<String>, child: impl Into<String>, map: MapTemplates) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            map,
        }
    }

    /// Load every template from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>, names: &TemplateNames) -> StoreResult<Self> {
        let dir = dir.as_ref();
        let [a, b, c] = &names.map_snippets;

        Ok(Self {
            parent: read_template(dir, &names.parent)?,
            child: read_template(dir, &names.child)?,
            map: MapTemplates::new(
                read_template(dir, &names.map_skeleton)?,
                read_template(dir, a)?,
                read_template(dir, b)?,
                read_template(dir, c)?,
            ),
        })
    }
}

fn read_template(dir: &Path, name: &str) -> StoreResult<String> {
    let path = dir.join(name);
    fs::read_to_string(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StoreError::MissingTemplate(path.display().to_string()),
        _ => StoreError::IoError(e),
    })
}

// =============================================================================
// Sinks
// =============================================================================

/// Destination for generated documents and summary lists.
pub trait DocumentSink {
    /// Persist one FOXML document under `stem`.
    fn write_document(&mut self, stem: &str, content: &str) -> StoreResult<()>;

    /// Persist one summary list under `name`.
    fn write_summary(&mut self, name: &str, content: &str) -> StoreResult<()>;
}

/// Writes into an output directory, creating it on first use.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: PathBuf::from(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a document with `stem` is written to.
    pub fn document_path(&self, stem: &str) -> PathBuf {
        self.root.join(DOCUMENT_DIR).join(format!("{}.xml", stem))
    }

    /// Path a summary with `name` is written to.
    pub fn summary_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.txt", name))
    }
}

impl Default for DirectorySink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl DocumentSink for DirectorySink {
    fn write_document(&mut self, stem: &str, content: &str) -> StoreResult<()> {
        let path = self.document_path(stem);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    fn write_summary(&mut self, name: &str, content: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.summary_path(name), content)?;
        Ok(())
    }
}

/// Keeps everything in memory; used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub documents: Vec<(String, String)>,
    pub summaries: Vec<(String, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, stem: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|(s, _)| s == stem)
            .map(|(_, c)| c.as_str())
    }

    pub fn summary(&self, name: &str) -> Option<&str> {
        self.summaries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }
}

impl DocumentSink for MemorySink {
    fn write_document(&mut self, stem: &str, content: &str) -> StoreResult<()> {
        self.documents.push((stem.to_string(), content.to_string()));
        Ok(())
    }

    fn write_summary(&mut self, name: &str, content: &str) -> StoreResult<()> {
        self.summaries.push((name.to_string(), content.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_templates(dir: &Path) {
        let names = TemplateNames::default();
        fs::write(dir.join(&names.parent), "<umdm>!!!PID!!!</umdm>").unwrap();
        fs::write(dir.join(&names.child), "<umam>!!!PID!!!</umam>").unwrap();
        fs::write(dir.join(&names.map_skeleton), "<mets>!!!Anchor-A!!!</mets>").unwrap();
        for snippet in &names.map_snippets {
            fs::write(dir.join(snippet), "<x/>").unwrap();
        }
    }

    #[test]
    fn test_load_dir() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());

        let set = TemplateSet::load_dir(dir.path(), &TemplateNames::default()).unwrap();
        assert_eq!(set.parent, "<umdm>!!!PID!!!</umdm>");
        assert_eq!(set.map.skeleton, "<mets>!!!Anchor-A!!!</mets>");
        assert_eq!(set.map.snippets[2], "<x/>");
    }

    #[test]
    fn test_missing_template() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        fs::remove_file(dir.path().join("metsB.xml")).unwrap();

        let err = TemplateSet::load_dir(dir.path(), &TemplateNames::default()).unwrap_err();
        assert!(matches!(err, StoreError::MissingTemplate(ref p) if p.ends_with("metsB.xml")));
    }

    #[test]
    fn test_directory_sink_layout() {
        let dir = tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("output"));

        sink.write_document("umd_1", "<umdm/>").unwrap();
        sink.write_summary("pids", "umd:1").unwrap();

        let doc = fs::read_to_string(dir.path().join("output/foxml/umd_1.xml")).unwrap();
        let summary = fs::read_to_string(dir.path().join("output/pids.txt")).unwrap();
        assert_eq!(doc, "<umdm/>");
        assert_eq!(summary, "umd:1");
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write_document("umd_2", "<umam/>").unwrap();
        assert_eq!(sink.document("umd_2"), Some("<umam/>"));
        assert_eq!(sink.summary("links"), None);
    }
}
