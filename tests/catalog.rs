use carapace::core::catalog::{Catalog, Category, LifecycleState};
use carapace::core::policy::ActivationPolicy;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_unit(dir: &Path, sub: &str, name: &str, content: &str) {
    let sub_dir = dir.join(sub);
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(sub_dir.join(name), content).unwrap();
}

#[test]
fn test_embedded_catalog_loads_and_validates() {
    let catalog = Catalog::load(None).expect("embedded catalog should validate");

    assert_eq!(catalog.units().len(), 26);
    assert_eq!(catalog.groups().len(), 3);
    assert!(catalog.warnings.is_empty(), "{:?}", catalog.warnings);

    let react = catalog.get("react-patterns").expect("react rule");
    assert_eq!(react.category, Category::Rule);
    assert_eq!(react.priority, 2);
    assert_eq!(react.title, "React Patterns");

    // Every agent the skills point back to exists.
    for unit in catalog.units() {
        if let Some(owner) = &unit.loaded_by {
            let owner = catalog.get(owner).expect("loaded_by target");
            assert_eq!(owner.category, Category::Agent);
        }
    }

    // Declaration order is rules, then skills, then agents.
    let first_agent = catalog
        .units()
        .iter()
        .position(|u| u.category == Category::Agent)
        .unwrap();
    assert!(
        catalog.units()[first_agent..]
            .iter()
            .all(|u| u.category == Category::Agent)
    );
}

#[test]
fn test_default_policy_validates_against_embedded_catalog() {
    let catalog = Catalog::load(None).unwrap();
    ActivationPolicy::default()
        .validate_against(&catalog)
        .expect("default coordinator should resolve");
}

#[test]
fn test_standalone_catalog_dir_round_trip() {
    let tmp = tempdir().unwrap();
    write_unit(
        tmp.path(),
        "rules",
        "house-style.md",
        "---\nid: house-style\ncategory: rule\ndomain: general\npriority: 3\nkeywords: style\n---\n# House Style\n\nBe consistent.\n",
    );
    write_unit(
        tmp.path(),
        "agents",
        "generalist.md",
        "---\nid: generalist\ncategory: agent\ndomain: general\nkeywords: anything\n---\n# Generalist\n",
    );

    let catalog = Catalog::from_dir(tmp.path()).unwrap();
    assert_eq!(catalog.units().len(), 2);
    assert_eq!(catalog.get("house-style").unwrap().priority, 3);
    assert!(catalog.groups().is_empty());
}

#[test]
fn test_dangling_replacement_aborts_load() {
    let tmp = tempdir().unwrap();
    write_unit(
        tmp.path(),
        "rules",
        "old.md",
        "---\nid: old\ncategory: rule\nlifecycle: deprecated\nsunset: 2027-01-01\nreplacement: new-hotness\nkeywords: old\n---\n# Old\n",
    );

    let err = Catalog::from_dir(tmp.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("old"), "{}", message);
    assert!(message.contains("new-hotness"), "{}", message);
}

#[test]
fn test_dangling_loaded_by_aborts_load() {
    let tmp = tempdir().unwrap();
    write_unit(
        tmp.path(),
        "skills",
        "orphan.md",
        "---\nid: orphan\ncategory: skill\nloaded_by: nobody\nkeywords: orphan\n---\n# Orphan\n",
    );

    let err = Catalog::from_dir(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("nobody"));
}

#[test]
fn test_group_referencing_unknown_unit_aborts_load() {
    let tmp = tempdir().unwrap();
    write_unit(
        tmp.path(),
        "rules",
        "solo.md",
        "---\nid: solo\ncategory: rule\nkeywords: solo\n---\n# Solo\n",
    );
    fs::write(
        tmp.path().join("groups.toml"),
        "[[group]]\nid = \"g\"\nmembers = [\"solo\", \"phantom\"]\n",
    )
    .unwrap();

    let err = Catalog::from_dir(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("phantom"));
}

#[test]
fn test_project_overlay_shadows_embedded_unit() {
    let tmp = tempdir().unwrap();
    let overlay = tmp.path().join(".carapace/catalog");
    write_unit(
        &overlay,
        "rules",
        "react-patterns.md",
        "---\nid: react-patterns\ncategory: rule\ndomain: frontend\npriority: 5\nextensions: .tsx\n---\n# React Patterns (house fork)\n",
    );
    write_unit(
        &overlay,
        "rules",
        "internal-style.md",
        "---\nid: internal-style\ncategory: rule\ndomain: general\nkeywords: internal\n---\n# Internal Style\n",
    );

    let embedded = Catalog::load(None).unwrap();
    let merged = Catalog::load(Some(tmp.path())).unwrap();

    assert_eq!(merged.units().len(), embedded.units().len() + 1);
    assert_eq!(merged.get("react-patterns").unwrap().priority, 5);
    assert!(merged.get("internal-style").is_some());
    assert_ne!(merged.snapshot_hash(), embedded.snapshot_hash());
    assert!(
        merged
            .warnings
            .iter()
            .any(|w| w.contains("react-patterns") && w.contains("shadows"))
    );
}

#[test]
fn test_missing_overlay_dir_is_not_an_error() {
    let tmp = tempdir().unwrap();
    let catalog = Catalog::load(Some(tmp.path())).unwrap();
    assert_eq!(catalog.units().len(), Catalog::load(None).unwrap().units().len());
}

#[test]
fn test_lifecycle_states_parse_from_frontmatter() {
    let catalog = Catalog::load(None).unwrap();
    assert_eq!(
        catalog.get("jquery-patterns").unwrap().lifecycle,
        LifecycleState::Deprecated
    );
    assert_eq!(
        catalog.get("grunt-tasks").unwrap().lifecycle,
        LifecycleState::Removed
    );
    assert_eq!(
        catalog.get("webpack-config").unwrap().replacement.as_deref(),
        Some("vite-config")
    );
}

#[test]
fn test_snapshot_hash_is_stable_across_loads() {
    let a = Catalog::load(None).unwrap();
    let b = Catalog::load(None).unwrap();
    assert_eq!(a.snapshot_hash(), b.snapshot_hash());
}
