//! Candidate collection and scoring.
//!
//! Unions the three extractors' index hits into one candidate set, one
//! entry per unit id, and scores each candidate:
//!
//!   score = priority * 10 + trigger_kind_weight + keyword_hit_count
//!
//! where the kind weight is the strongest signal kind that fired for the
//! unit. Ranking ties break by catalog declaration order, which makes the
//! whole pipeline deterministic for identical inputs.

use crate::core::catalog::{Catalog, Category};
use crate::core::policy::ActivationPolicy;
use crate::core::signal::WorkContext;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A scored candidate unit. `matched` keeps the fired trigger descriptions
/// for explain-style output.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: String,
    pub category: Category,
    pub domain: String,
    pub score: f64,
    pub keyword_hits: usize,
    pub matched: Vec<String>,
    #[serde(skip)]
    pub unit: usize,
    #[serde(skip)]
    pub order: usize,
}

#[derive(Default)]
struct Accumulator {
    kind_weight: i64,
    keyword_hits: usize,
    matched: Vec<String>,
}

/// Collect and score every unit with at least one fired trigger.
/// An empty result is a valid outcome, not an error.
pub fn collect_candidates(
    catalog: &Catalog,
    ctx: &WorkContext,
    policy: &ActivationPolicy,
) -> Vec<Candidate> {
    let index = catalog.index();
    let mut hits: FxHashMap<usize, Accumulator> = FxHashMap::default();

    for ext in &ctx.touched_extensions {
        for &unit in index.lookup_extension(ext) {
            let acc = hits.entry(unit).or_default();
            acc.kind_weight = acc.kind_weight.max(policy.weights.file_extension);
            acc.matched.push(format!("extension:{}", ext));
        }
    }

    for marker in &ctx.project_markers {
        for (required_key, unit) in index.lookup_marker(&marker.file) {
            let fired = match required_key {
                // Bare file trigger: any observation of the file fires it.
                None => true,
                Some(key) => marker.key.as_deref() == Some(key.as_str()),
            };
            if !fired {
                continue;
            }
            let acc = hits.entry(*unit).or_default();
            acc.kind_weight = acc.kind_weight.max(policy.weights.project_marker);
            match &marker.key {
                Some(key) => acc.matched.push(format!("marker:{}#{}", marker.file, key)),
                None => acc.matched.push(format!("marker:{}", marker.file)),
            }
        }
    }

    if !ctx.request_text.is_empty() {
        let lowered = ctx.request_text.to_lowercase();
        for (pattern, case_sensitive, unit) in index.keyword_triggers() {
            if pattern.is_empty() {
                continue;
            }
            let found = if *case_sensitive {
                ctx.request_text.contains(pattern)
            } else {
                lowered.contains(pattern)
            };
            if found {
                let acc = hits.entry(*unit).or_default();
                acc.kind_weight = acc.kind_weight.max(policy.weights.keyword);
                acc.keyword_hits += 1;
                acc.matched.push(format!("keyword:{}", pattern));
            }
        }
    }

    let mut candidates: Vec<Candidate> = hits
        .into_iter()
        .map(|(unit_idx, mut acc)| {
            let unit = catalog.unit_at(unit_idx);
            acc.matched.sort();
            Candidate {
                id: unit.id.clone(),
                category: unit.category,
                domain: unit.domain.clone(),
                score: (unit.priority * 10 + acc.kind_weight) as f64 + acc.keyword_hits as f64,
                keyword_hits: acc.keyword_hits,
                matched: acc.matched,
                unit: unit_idx,
                order: unit.order,
            }
        })
        .collect();
    rank(&mut candidates);
    candidates
}

/// Sort descending by score, declaration order breaking ties.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.order.cmp(&b.order))
    });
}
