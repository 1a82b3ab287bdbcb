//! Date-gated lifecycle filtering.
//!
//! The deprecation ladder (announce, warn, deprecate, remove) is computed
//! at query time as a pure function of the catalog state and the `as_of`
//! date. Nothing here mutates the catalog and nothing reads a clock; the
//! caller decides what "now" is, once per call.

use crate::core::catalog::{Catalog, LifecycleState};
use crate::core::selector::Candidate;
use crate::core::time::CivilDate;
use std::collections::BTreeSet;

/// Apply lifecycle rules to a candidate set.
///
/// - `removed` candidates are always dropped.
/// - `deprecated` candidates past their sunset date are dropped.
/// - `deprecated` candidates before sunset survive with score halved,
///   unless their declared replacement is itself a surviving candidate,
///   in which case the replacement wins regardless of score.
///
/// Returns the survivors and `(id, reason)` rejections.
pub fn filter(
    candidates: Vec<Candidate>,
    catalog: &Catalog,
    as_of: CivilDate,
) -> (Vec<Candidate>, Vec<(String, String)>) {
    let mut rejected = Vec::new();

    // First pass: drop units dead in their own right.
    let mut alive: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let unit = catalog.unit_at(candidate.unit);
        match unit.lifecycle {
            LifecycleState::Active => alive.push(candidate),
            LifecycleState::Removed => {
                rejected.push((candidate.id, "removed".to_string()));
            }
            LifecycleState::Deprecated => match unit.sunset {
                Some(sunset) if as_of > sunset => {
                    rejected.push((candidate.id, "deprecated".to_string()));
                }
                _ => alive.push(candidate),
            },
        }
    }

    // Second pass: replacement precedence over still-alive deprecated units.
    let alive_ids: BTreeSet<String> = alive.iter().map(|c| c.id.clone()).collect();
    let mut kept = Vec::with_capacity(alive.len());
    for mut candidate in alive {
        let unit = catalog.unit_at(candidate.unit);
        if unit.lifecycle != LifecycleState::Deprecated {
            kept.push(candidate);
            continue;
        }
        match &unit.replacement {
            Some(replacement) if alive_ids.contains(replacement) => {
                rejected.push((candidate.id, format!("replaced_by:{}", replacement)));
            }
            _ => {
                candidate.score /= 2.0;
                kept.push(candidate);
            }
        }
    }

    (kept, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::parse_unit;
    use crate::core::policy::ActivationPolicy;
    use crate::core::selector::collect_candidates;
    use crate::core::signal::WorkContext;

    fn catalog() -> Catalog {
        let units = vec![
            parse_unit(
                "a",
                "---\nid: fresh\ncategory: rule\npriority: 1\nkeywords: build\n---\n# Fresh\n",
            )
            .unwrap(),
            parse_unit(
                "b",
                "---\nid: fading\ncategory: rule\npriority: 2\nlifecycle: deprecated\nsunset: 2026-12-31\nreplacement: fresh\nkeywords: build\n---\n# Fading\n",
            )
            .unwrap(),
            parse_unit(
                "c",
                "---\nid: gone\ncategory: rule\nlifecycle: removed\nkeywords: build\n---\n# Gone\n",
            )
            .unwrap(),
        ];
        Catalog::from_units(units, vec![]).unwrap()
    }

    fn candidates(catalog: &Catalog) -> Vec<Candidate> {
        let mut ctx = WorkContext::default();
        ctx.request_text = "build it".to_string();
        collect_candidates(catalog, &ctx, &ActivationPolicy::default())
    }

    #[test]
    fn test_removed_always_dropped() {
        let catalog = catalog();
        let as_of = CivilDate::parse("2026-01-01").unwrap();
        let (kept, rejected) = filter(candidates(&catalog), &catalog, as_of);
        assert!(!kept.iter().any(|c| c.id == "gone"));
        assert!(rejected.contains(&("gone".to_string(), "removed".to_string())));
    }

    #[test]
    fn test_replacement_wins_over_higher_scored_deprecated() {
        let catalog = catalog();
        let as_of = CivilDate::parse("2026-01-01").unwrap();
        let (kept, rejected) = filter(candidates(&catalog), &catalog, as_of);
        assert!(kept.iter().any(|c| c.id == "fresh"));
        assert!(rejected.contains(&("fading".to_string(), "replaced_by:fresh".to_string())));
    }

    #[test]
    fn test_past_sunset_dropped_entirely() {
        let catalog = catalog();
        let as_of = CivilDate::parse("2027-01-01").unwrap();
        let (kept, rejected) = filter(candidates(&catalog), &catalog, as_of);
        assert!(!kept.iter().any(|c| c.id == "fading"));
        assert!(rejected.contains(&("fading".to_string(), "deprecated".to_string())));
    }

    #[test]
    fn test_pre_sunset_without_candidate_replacement_is_halved() {
        let units = vec![
            parse_unit(
                "a",
                "---\nid: fresh\ncategory: rule\npriority: 1\nkeywords: deploy\n---\n# Fresh\n",
            )
            .unwrap(),
            parse_unit(
                "b",
                "---\nid: fading\ncategory: rule\npriority: 2\nlifecycle: deprecated\nsunset: 2026-12-31\nreplacement: fresh\nkeywords: build\n---\n# Fading\n",
            )
            .unwrap(),
        ];
        let catalog = Catalog::from_units(units, vec![]).unwrap();
        let mut ctx = WorkContext::default();
        // Only the deprecated unit fires; its replacement is not a candidate.
        ctx.request_text = "build it".to_string();
        let cands = collect_candidates(&catalog, &ctx, &ActivationPolicy::default());
        let full_score = cands[0].score;

        let as_of = CivilDate::parse("2026-01-01").unwrap();
        let (kept, rejected) = filter(cands, &catalog, as_of);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "fading");
        assert_eq!(kept[0].score, full_score / 2.0);
        assert!(rejected.is_empty());
    }
}
