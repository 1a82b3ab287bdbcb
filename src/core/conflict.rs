//! Mutual-exclusion resolution.
//!
//! Exclusion groups are declared in the catalog; within a group, the
//! highest-scored surviving candidate wins and every other member is
//! rejected with `superseded_by:<winner>`. Ties fall back to declaration
//! order. This pass is total: it never errors.

use crate::core::catalog::Catalog;
use crate::core::selector::Candidate;
use rustc_hash::FxHashMap;

/// Keep at most one candidate per declared exclusion group.
/// Returns the survivors and `(id, reason)` rejections.
pub fn resolve(
    candidates: Vec<Candidate>,
    catalog: &Catalog,
) -> (Vec<Candidate>, Vec<(String, String)>) {
    // group id -> index of the best candidate seen so far
    let mut winners: FxHashMap<String, usize> = FxHashMap::default();
    for (idx, candidate) in candidates.iter().enumerate() {
        let Some(group) = catalog.group_of(&candidate.id) else {
            continue;
        };
        match winners.get(&group.id) {
            Some(&best) if !beats(candidate, &candidates[best]) => {}
            _ => {
                winners.insert(group.id.clone(), idx);
            }
        }
    }

    let mut kept = Vec::with_capacity(candidates.len());
    let mut rejected = Vec::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        match catalog.group_of(&candidate.id) {
            Some(group) if winners[&group.id] != idx => {
                let winner = &candidates[winners[&group.id]];
                rejected.push((
                    candidate.id.clone(),
                    format!("superseded_by:{}", winner.id),
                ));
            }
            _ => kept.push(candidate.clone()),
        }
    }
    (kept, rejected)
}

fn beats(a: &Candidate, b: &Candidate) -> bool {
    a.score > b.score || (a.score == b.score && a.order < b.order)
}
