//! Work-context signal model.
//!
//! A `WorkContext` is the per-call input: touched file extensions, project
//! markers discovered at context construction time, and the free-text
//! request. Extraction against the catalog index happens in the selector;
//! this module owns the input types and their normalization.

use crate::core::error::CarapaceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Load-limit tier for a single classification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskScope {
    SingleFile,
    Feature,
    MultiFile,
    Architecture,
}

impl Default for TaskScope {
    fn default() -> Self {
        TaskScope::Feature
    }
}

impl TaskScope {
    pub fn parse(s: &str) -> Result<Self, CarapaceError> {
        match s {
            "single_file" => Ok(TaskScope::SingleFile),
            "feature" => Ok(TaskScope::Feature),
            "multi_file" => Ok(TaskScope::MultiFile),
            "architecture" => Ok(TaskScope::Architecture),
            other => Err(CarapaceError::ValidationError(format!(
                "invalid scope '{}': expected single_file|feature|multi_file|architecture",
                other
            ))),
        }
    }
}

/// A project marker observed in the project root: a manifest file, plus the
/// dependency key when the manifest could be parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectMarker {
    pub file: String,
    pub key: Option<String>,
}

impl ProjectMarker {
    /// Parse the CLI form `file` or `file#key`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('#') {
            Some((file, key)) => ProjectMarker {
                file: file.to_string(),
                key: Some(key.to_string()),
            },
            None => ProjectMarker {
                file: raw.to_string(),
                key: None,
            },
        }
    }
}

/// Input to one classification call. Building a context performs any file
/// probing up front; classification itself is pure over this value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkContext {
    pub touched_extensions: BTreeSet<String>,
    pub project_markers: BTreeSet<ProjectMarker>,
    pub request_text: String,
    pub task_scope: TaskScope,
}

impl WorkContext {
    pub fn add_extension(&mut self, raw: &str) {
        self.touched_extensions.insert(normalize_extension(raw));
    }

    /// Record the extension of a touched file path, when it has one.
    pub fn add_file(&mut self, path: &Path) {
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            self.touched_extensions.insert(normalize_extension(ext));
        }
    }

    pub fn add_marker(&mut self, marker: ProjectMarker) {
        self.project_markers.insert(marker);
    }
}

/// Normalize an extension to lowercase with a leading dot.
pub fn normalize_extension(raw: &str) -> String {
    let raw = raw.trim().to_lowercase();
    if raw.starts_with('.') {
        raw
    } else {
        format!(".{}", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("tsx"), ".tsx");
        assert_eq!(normalize_extension(".TSX"), ".tsx");
    }

    #[test]
    fn test_add_file_extracts_extension() {
        let mut ctx = WorkContext::default();
        ctx.add_file(&PathBuf::from("src/App.tsx"));
        ctx.add_file(&PathBuf::from("Makefile"));
        assert!(ctx.touched_extensions.contains(".tsx"));
        assert_eq!(ctx.touched_extensions.len(), 1);
    }

    #[test]
    fn test_marker_parse_splits_key() {
        let m = ProjectMarker::parse("composer.json#laravel/framework");
        assert_eq!(m.file, "composer.json");
        assert_eq!(m.key.as_deref(), Some("laravel/framework"));
        let bare = ProjectMarker::parse("go.mod");
        assert!(bare.key.is_none());
    }
}
