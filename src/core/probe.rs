//! Project-root marker probing.
//!
//! Runs once per WorkContext construction, outside the pure classification
//! path. Every failure degrades to "marker absent": a missing file is
//! silence, an unreadable or malformed manifest is silence plus a warning
//! in the report. Probing never returns an error to the caller.

use crate::core::signal::ProjectMarker;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// How a manifest's dependency keys are extracted.
#[derive(Debug, Clone, Copy)]
enum ManifestFormat {
    /// Presence of the file is the only signal.
    Existence,
    /// JSON object with dependency-name keys under the given pointers.
    JsonKeys(&'static [&'static str]),
    /// TOML table with dependency-name keys under the given dotted paths.
    TomlKeys(&'static [&'static str]),
}

/// Manifests probed in the project root, with their dependency sections.
const MANIFESTS: &[(&str, ManifestFormat)] = &[
    (
        "package.json",
        ManifestFormat::JsonKeys(&["dependencies", "devDependencies"]),
    ),
    (
        "composer.json",
        ManifestFormat::JsonKeys(&["require", "require-dev"]),
    ),
    (
        "Cargo.toml",
        ManifestFormat::TomlKeys(&["dependencies", "dev-dependencies"]),
    ),
    ("pyproject.toml", ManifestFormat::TomlKeys(&[])),
    ("tsconfig.json", ManifestFormat::Existence),
    ("vite.config.ts", ManifestFormat::Existence),
    ("webpack.config.js", ManifestFormat::Existence),
    ("go.mod", ManifestFormat::Existence),
    ("requirements.txt", ManifestFormat::Existence),
    ("Gemfile", ManifestFormat::Existence),
    ("Gruntfile.js", ManifestFormat::Existence),
    ("Dockerfile", ManifestFormat::Existence),
];

/// Result of probing one project root.
#[derive(Debug, Default, Serialize)]
pub struct ProbeReport {
    pub markers: BTreeSet<ProjectMarker>,
    /// Low-severity degradation notes (unreadable or malformed manifests).
    pub warnings: Vec<String>,
}

/// Probe a project root for marker files and their dependency keys.
pub fn probe_project(root: &Path) -> ProbeReport {
    let mut report = ProbeReport::default();

    for (file, format) in MANIFESTS {
        let path = root.join(file);
        if !path.is_file() {
            continue;
        }
        report.markers.insert(ProjectMarker {
            file: file.to_string(),
            key: None,
        });

        let sections: &[&str] = match *format {
            ManifestFormat::Existence => continue,
            ManifestFormat::JsonKeys(sections) => sections,
            ManifestFormat::TomlKeys(sections) => sections,
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                // Existence already recorded; key probing degrades to absent.
                report
                    .warnings
                    .push(format!("{}: unreadable, keys skipped: {}", file, e));
                continue;
            }
        };

        let keys = match *format {
            ManifestFormat::JsonKeys(_) => json_dependency_keys(&raw, sections),
            ManifestFormat::TomlKeys(_) => toml_dependency_keys(&raw, sections),
            ManifestFormat::Existence => unreachable!(),
        };
        match keys {
            Ok(keys) => {
                for key in keys {
                    report.markers.insert(ProjectMarker {
                        file: file.to_string(),
                        key: Some(key),
                    });
                }
            }
            Err(reason) => {
                report.markers.remove(&ProjectMarker {
                    file: file.to_string(),
                    key: None,
                });
                report
                    .warnings
                    .push(format!("{}: malformed, marker dropped: {}", file, reason));
            }
        }
    }

    report
}

fn json_dependency_keys(raw: &str, sections: &[&str]) -> Result<Vec<String>, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let mut keys = Vec::new();
    for section in sections {
        if let Some(map) = value.get(section).and_then(|v| v.as_object()) {
            keys.extend(map.keys().cloned());
        }
    }
    Ok(keys)
}

fn toml_dependency_keys(raw: &str, sections: &[&str]) -> Result<Vec<String>, String> {
    let value: toml::Value = toml::from_str(raw).map_err(|e| e.to_string())?;
    let mut keys = Vec::new();
    for section in sections {
        if let Some(table) = value.get(section).and_then(|v| v.as_table()) {
            keys.extend(table.keys().cloned());
        }
    }
    Ok(keys)
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "probe",
        "version": "1.0.0",
        "description": "Best-effort project-root marker probing",
        "manifests": MANIFESTS.iter().map(|(f, _)| *f).collect::<Vec<_>>(),
        "failure_semantics": "missing/unreadable/malformed manifests degrade to marker-absent"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_probe_reads_package_json_keys() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"dependencies": {"react": "^19.0.0"}, "devDependencies": {"vite": "^6.0.0"}}"#,
        )
        .unwrap();
        let report = probe_project(tmp.path());
        assert!(report.markers.contains(&ProjectMarker {
            file: "package.json".to_string(),
            key: Some("react".to_string()),
        }));
        assert!(report.markers.contains(&ProjectMarker {
            file: "package.json".to_string(),
            key: Some("vite".to_string()),
        }));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_probe_malformed_manifest_degrades_to_absent() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("composer.json"), "{not json").unwrap();
        let report = probe_project(tmp.path());
        assert!(!report.markers.iter().any(|m| m.file == "composer.json"));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_probe_empty_root_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        let report = probe_project(tmp.path());
        assert!(report.markers.is_empty());
        assert!(report.warnings.is_empty());
    }
}
