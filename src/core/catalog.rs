//! Catalog of content units and the signal lookup index.
//!
//! A catalog is an immutable snapshot: parsed once from markdown frontmatter
//! (embedded defaults plus an optional project overlay), validated fail-fast,
//! then shared read-only for the duration of every classification call.
//! Catalog updates are snapshot replacement, never in-place mutation.

use crate::core::assets;
use crate::core::error::CarapaceError;
use crate::core::time::CivilDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Relative path of the project catalog overlay, mirroring the embedded layout.
pub const PROJECT_CATALOG_REL_PATH: &str = ".carapace/catalog";

/// Subdirectories scanned for unit files, in declaration order.
pub const UNIT_DIRS: [&str; 3] = ["rules", "skills", "agents"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Rule,
    Skill,
    Agent,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Rule => write!(f, "rule"),
            Category::Skill => write!(f, "skill"),
            Category::Agent => write!(f, "agent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Active,
    Deprecated,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    FileExtension,
    ProjectMarker,
    Keyword,
}

/// A declarative activation condition.
///
/// Marker patterns are either a bare file name (`composer.json`, existence
/// check) or `file#key` (`package.json#react`, dependency-key check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub kind: TriggerKind,
    pub pattern: String,
    pub case_sensitive: bool,
}

/// A rule, skill, or agent descriptor parsed from one markdown unit file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentUnit {
    pub id: String,
    pub category: Category,
    /// Coarse domain tag (frontend, backend, database, security, general).
    /// Consumed by the router's multi-domain detection.
    pub domain: String,
    pub title: String,
    pub priority: i64,
    pub lifecycle: LifecycleState,
    pub sunset: Option<CivilDate>,
    pub replacement: Option<String>,
    /// Owning agent for skills. Informational back-reference only.
    pub loaded_by: Option<String>,
    pub triggers: Vec<TriggerSpec>,
    /// Markdown payload below the frontmatter. Carried for the host and for
    /// `catalog show`; never consulted during classification.
    pub body: String,
    /// Declaration order within the catalog. Final tie-break for ranking.
    #[serde(skip)]
    pub order: usize,
}

/// A declared mutual-exclusion group: at most one member survives selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionGroup {
    pub id: String,
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GroupsFile {
    #[serde(default)]
    group: Vec<ExclusionGroup>,
}

/// Signal lookup maps, built once per catalog snapshot.
#[derive(Debug, Default)]
pub struct RuleIndex {
    by_extension: FxHashMap<String, Vec<usize>>,
    /// file name -> (required dependency key or None for existence, unit index)
    by_marker: FxHashMap<String, Vec<(Option<String>, usize)>>,
    /// (pattern pre-lowered unless case-sensitive, case_sensitive, unit index)
    keyword_triggers: Vec<(String, bool, usize)>,
}

impl RuleIndex {
    pub fn lookup_extension(&self, ext: &str) -> &[usize] {
        self.by_extension.get(ext).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lookup_marker(&self, file: &str) -> &[(Option<String>, usize)] {
        self.by_marker.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keyword_triggers(&self) -> &[(String, bool, usize)] {
        &self.keyword_triggers
    }
}

/// Immutable catalog snapshot: units in declaration order, exclusion groups,
/// the signal index, and a content hash for reproducibility envelopes.
#[derive(Debug)]
pub struct Catalog {
    units: Vec<ContentUnit>,
    by_id: FxHashMap<String, usize>,
    groups: Vec<ExclusionGroup>,
    group_of: FxHashMap<String, usize>,
    index: RuleIndex,
    hash: String,
    /// Non-fatal load observations (overlay shadowing, odd declarations).
    pub warnings: Vec<String>,
}

impl Catalog {
    /// Build a catalog from parsed units and group declarations.
    /// Fails fast on any configuration error: duplicate ids, dangling
    /// replacement/loaded_by references, or groups naming unknown units.
    pub fn from_units(
        mut units: Vec<ContentUnit>,
        groups: Vec<ExclusionGroup>,
    ) -> Result<Self, CarapaceError> {
        let mut warnings = Vec::new();
        let mut by_id = FxHashMap::default();
        for (idx, unit) in units.iter_mut().enumerate() {
            unit.order = idx;
            if by_id.insert(unit.id.clone(), idx).is_some() {
                return Err(CarapaceError::CatalogError(format!(
                    "duplicate unit id '{}'",
                    unit.id
                )));
            }
        }

        for unit in &units {
            if let Some(replacement) = &unit.replacement {
                if !by_id.contains_key(replacement) {
                    return Err(CarapaceError::CatalogError(format!(
                        "unit '{}' declares replacement '{}' which is not defined",
                        unit.id, replacement
                    )));
                }
                if unit.lifecycle != LifecycleState::Deprecated {
                    warnings.push(format!(
                        "unit '{}' declares a replacement but is not deprecated",
                        unit.id
                    ));
                }
            }
            if let Some(owner) = &unit.loaded_by {
                match by_id.get(owner).map(|i| &units[*i]) {
                    None => {
                        return Err(CarapaceError::CatalogError(format!(
                            "unit '{}' declares loaded_by '{}' which is not defined",
                            unit.id, owner
                        )));
                    }
                    Some(owner_unit) if owner_unit.category != Category::Agent => {
                        return Err(CarapaceError::CatalogError(format!(
                            "unit '{}' declares loaded_by '{}' which is not an agent",
                            unit.id, owner
                        )));
                    }
                    Some(_) => {}
                }
            }
            if unit.lifecycle == LifecycleState::Deprecated && unit.sunset.is_none() {
                warnings.push(format!(
                    "deprecated unit '{}' has no sunset date; it will be down-weighted indefinitely",
                    unit.id
                ));
            }
        }

        let mut group_of = FxHashMap::default();
        for (gidx, group) in groups.iter().enumerate() {
            if group.members.len() < 2 {
                warnings.push(format!(
                    "exclusion group '{}' has fewer than two members",
                    group.id
                ));
            }
            for member in &group.members {
                if !by_id.contains_key(member) {
                    return Err(CarapaceError::CatalogError(format!(
                        "exclusion group '{}' references unknown unit '{}'",
                        group.id, member
                    )));
                }
                if group_of.insert(member.clone(), gidx).is_some() {
                    return Err(CarapaceError::CatalogError(format!(
                        "unit '{}' appears in more than one exclusion group",
                        member
                    )));
                }
            }
        }

        let index = build_index(&units);
        let hash = snapshot_hash(&units, &groups);

        Ok(Catalog {
            units,
            by_id,
            groups,
            group_of,
            index,
            hash,
            warnings,
        })
    }

    /// Load the embedded default catalog, overlaid with the project catalog
    /// under `<root>/.carapace/catalog/` when present. Project units replace
    /// embedded units with the same id; new units append after the defaults.
    pub fn load(project_root: Option<&Path>) -> Result<Self, CarapaceError> {
        let mut units = Vec::new();
        for (path, source) in assets::embedded_unit_sources() {
            units.push(parse_unit(path, source)?);
        }
        let mut groups = parse_groups("embedded catalog/groups.toml", assets::EMBEDDED_GROUPS)?;
        let mut overlay_warnings = Vec::new();

        if let Some(root) = project_root {
            let overlay_dir = root.join(PROJECT_CATALOG_REL_PATH);
            if overlay_dir.is_dir() {
                let overlay = read_units_dir(&overlay_dir)?;
                for unit in overlay {
                    match units.iter().position(|u| u.id == unit.id) {
                        Some(pos) => {
                            overlay_warnings
                                .push(format!("project unit '{}' shadows embedded unit", unit.id));
                            units[pos] = unit;
                        }
                        None => units.push(unit),
                    }
                }
                let groups_path = overlay_dir.join("groups.toml");
                if groups_path.is_file() {
                    let raw = std::fs::read_to_string(&groups_path)?;
                    groups = parse_groups(&groups_path.display().to_string(), &raw)?;
                }
            }
        }

        let mut catalog = Self::from_units(units, groups)?;
        catalog.warnings.extend(overlay_warnings);
        Ok(catalog)
    }

    /// Load a catalog from a standalone directory (no embedded defaults).
    /// Used by `catalog validate --dir` and by tests.
    pub fn from_dir(dir: &Path) -> Result<Self, CarapaceError> {
        let units = read_units_dir(dir)?;
        let groups_path = dir.join("groups.toml");
        let groups = if groups_path.is_file() {
            let raw = std::fs::read_to_string(&groups_path)?;
            parse_groups(&groups_path.display().to_string(), &raw)?
        } else {
            Vec::new()
        };
        Self::from_units(units, groups)
    }

    pub fn get(&self, id: &str) -> Option<&ContentUnit> {
        self.by_id.get(id).map(|idx| &self.units[*idx])
    }

    pub fn unit_at(&self, idx: usize) -> &ContentUnit {
        &self.units[idx]
    }

    pub fn units(&self) -> &[ContentUnit] {
        &self.units
    }

    pub fn groups(&self) -> &[ExclusionGroup] {
        &self.groups
    }

    /// The exclusion group a unit belongs to, if any.
    pub fn group_of(&self, id: &str) -> Option<&ExclusionGroup> {
        self.group_of.get(id).map(|gidx| &self.groups[*gidx])
    }

    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    /// SHA-256 over the canonical unit and group payload.
    pub fn snapshot_hash(&self) -> &str {
        &self.hash
    }
}

fn build_index(units: &[ContentUnit]) -> RuleIndex {
    let mut index = RuleIndex::default();
    for (idx, unit) in units.iter().enumerate() {
        for trigger in &unit.triggers {
            match trigger.kind {
                TriggerKind::FileExtension => {
                    index
                        .by_extension
                        .entry(trigger.pattern.to_lowercase())
                        .or_default()
                        .push(idx);
                }
                TriggerKind::ProjectMarker => {
                    let (file, key) = match trigger.pattern.split_once('#') {
                        Some((file, key)) => (file.to_string(), Some(key.to_string())),
                        None => (trigger.pattern.clone(), None),
                    };
                    index.by_marker.entry(file).or_default().push((key, idx));
                }
                TriggerKind::Keyword => {
                    let pattern = if trigger.case_sensitive {
                        trigger.pattern.clone()
                    } else {
                        trigger.pattern.to_lowercase()
                    };
                    index
                        .keyword_triggers
                        .push((pattern, trigger.case_sensitive, idx));
                }
            }
        }
    }
    index
}

fn snapshot_hash(units: &[ContentUnit], groups: &[ExclusionGroup]) -> String {
    let payload = serde_json::to_vec(&(units, groups)).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&payload);
    format!("{:x}", hasher.finalize())
}

fn read_units_dir(dir: &Path) -> Result<Vec<ContentUnit>, CarapaceError> {
    let mut units = Vec::new();
    for sub in UNIT_DIRS {
        let sub_dir = dir.join(sub);
        if !sub_dir.is_dir() {
            continue;
        }
        let mut entries: Vec<_> = std::fs::read_dir(&sub_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("md"))
            .collect();
        entries.sort();
        for path in entries {
            let source = std::fs::read_to_string(&path)?;
            units.push(parse_unit(&path.display().to_string(), &source)?);
        }
    }
    Ok(units)
}

fn parse_groups(origin: &str, raw: &str) -> Result<Vec<ExclusionGroup>, CarapaceError> {
    let parsed: GroupsFile = toml::from_str(raw)
        .map_err(|e| CarapaceError::CatalogError(format!("{}: {}", origin, e)))?;
    Ok(parsed.group)
}

/// Parse one markdown unit file: `---`-delimited `key: value` frontmatter
/// followed by the markdown body.
pub fn parse_unit(origin: &str, source: &str) -> Result<ContentUnit, CarapaceError> {
    let mut lines = source.lines();
    match lines.find(|l| !l.trim().is_empty()) {
        Some(l) if l.trim() == "---" => {}
        _ => {
            return Err(CarapaceError::CatalogError(format!(
                "{}: missing frontmatter block",
                origin
            )));
        }
    }

    let mut fields: Vec<(String, String)> = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == "---" {
            closed = true;
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            fields.push((key.trim().to_lowercase(), value.trim().to_string()));
        }
    }
    if !closed {
        return Err(CarapaceError::CatalogError(format!(
            "{}: unterminated frontmatter block",
            origin
        )));
    }
    let body: String = lines.collect::<Vec<_>>().join("\n");

    let get = |key: &str| -> Option<&str> {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    let list = |key: &str| -> Vec<String> {
        get(key)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    let id = get("id")
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CarapaceError::CatalogError(format!("{}: missing 'id'", origin)))?;

    let category = match get("category") {
        Some("rule") => Category::Rule,
        Some("skill") => Category::Skill,
        Some("agent") => Category::Agent,
        Some(other) => {
            return Err(CarapaceError::CatalogError(format!(
                "{}: unknown category '{}' (expected rule|skill|agent)",
                origin, other
            )));
        }
        None => {
            return Err(CarapaceError::CatalogError(format!(
                "{}: missing 'category'",
                origin
            )));
        }
    };

    let lifecycle = match get("lifecycle") {
        None | Some("active") => LifecycleState::Active,
        Some("deprecated") => LifecycleState::Deprecated,
        Some("removed") => LifecycleState::Removed,
        Some(other) => {
            return Err(CarapaceError::CatalogError(format!(
                "{}: unknown lifecycle '{}' (expected active|deprecated|removed)",
                origin, other
            )));
        }
    };

    let priority = match get("priority") {
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            CarapaceError::CatalogError(format!("{}: priority '{}' is not an integer", origin, raw))
        })?,
        None => 0,
    };

    let sunset = match get("sunset") {
        Some(raw) => Some(
            CivilDate::parse(raw)
                .map_err(|e| CarapaceError::CatalogError(format!("{}: sunset: {}", origin, e)))?,
        ),
        None => None,
    };

    let case_sensitive = matches!(get("case_sensitive"), Some("true"));

    let mut triggers = Vec::new();
    for ext in list("extensions") {
        let pattern = if ext.starts_with('.') {
            ext.to_lowercase()
        } else {
            format!(".{}", ext.to_lowercase())
        };
        triggers.push(TriggerSpec {
            kind: TriggerKind::FileExtension,
            pattern,
            case_sensitive: false,
        });
    }
    for marker in list("markers") {
        triggers.push(TriggerSpec {
            kind: TriggerKind::ProjectMarker,
            pattern: marker,
            case_sensitive: true,
        });
    }
    for keyword in list("keywords") {
        triggers.push(TriggerSpec {
            kind: TriggerKind::Keyword,
            pattern: keyword,
            case_sensitive,
        });
    }

    let title = body
        .lines()
        .find_map(|l| l.strip_prefix("# "))
        .map(str::trim)
        .unwrap_or(&id)
        .to_string();

    Ok(ContentUnit {
        id,
        category,
        domain: get("domain").unwrap_or("general").to_string(),
        title,
        priority,
        lifecycle,
        sunset,
        replacement: get("replacement").map(str::to_string),
        loaded_by: get("loaded_by").map(str::to_string),
        triggers,
        body,
        order: 0,
    })
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "catalog",
        "version": "1.0.0",
        "description": "Content-unit catalog with trigger index and exclusion groups",
        "unit_frontmatter": [
            "id", "category", "domain", "priority", "lifecycle", "sunset",
            "replacement", "loaded_by", "extensions", "markers", "keywords",
            "case_sensitive"
        ],
        "categories": ["rule", "skill", "agent"],
        "lifecycle_states": ["active", "deprecated", "removed"],
        "storage": [".carapace/catalog/{rules,skills,agents}/*.md", ".carapace/catalog/groups.toml"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: &str = "---\nid: sample-rule\ncategory: rule\ndomain: frontend\npriority: 2\nextensions: tsx, .jsx\nmarkers: package.json#react\nkeywords: react, hook\n---\n# Sample Rule\n\nBody text.\n";

    #[test]
    fn test_parse_unit_frontmatter() {
        let unit = parse_unit("test", UNIT).unwrap();
        assert_eq!(unit.id, "sample-rule");
        assert_eq!(unit.category, Category::Rule);
        assert_eq!(unit.priority, 2);
        assert_eq!(unit.title, "Sample Rule");
        assert_eq!(unit.lifecycle, LifecycleState::Active);
        // extensions normalized to a leading dot
        assert!(unit.triggers.iter().any(|t| t.pattern == ".tsx"));
        assert!(unit.triggers.iter().any(|t| t.pattern == ".jsx"));
        assert_eq!(unit.triggers.len(), 5);
    }

    #[test]
    fn test_parse_unit_requires_frontmatter() {
        assert!(parse_unit("test", "# no frontmatter\n").is_err());
        assert!(parse_unit("test", "---\nid: x\ncategory: rule\n").is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let a = parse_unit("a", UNIT).unwrap();
        let b = parse_unit("b", UNIT).unwrap();
        let err = Catalog::from_units(vec![a, b], vec![]).unwrap_err();
        assert!(err.to_string().contains("duplicate unit id"));
    }

    #[test]
    fn test_dangling_group_member_rejected() {
        let a = parse_unit("a", UNIT).unwrap();
        let groups = vec![ExclusionGroup {
            id: "g".to_string(),
            members: vec!["sample-rule".to_string(), "ghost".to_string()],
        }];
        let err = Catalog::from_units(vec![a], groups).unwrap_err();
        assert!(err.to_string().contains("unknown unit 'ghost'"));
    }

    #[test]
    fn test_marker_index_splits_dependency_key() {
        let unit = parse_unit("test", UNIT).unwrap();
        let catalog = Catalog::from_units(vec![unit], vec![]).unwrap();
        let hits = catalog.index().lookup_marker("package.json");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.as_deref(), Some("react"));
    }
}
