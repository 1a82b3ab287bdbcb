//! The classification entry point and its output envelope.
//!
//! `classify` is a pure function of (catalog snapshot, work context,
//! policy, as-of date): no I/O, no clock reads, no catalog mutation.
//! Repeated calls with identical inputs produce byte-identical output,
//! and the catalog hash is stamped into the envelope so a host can prove
//! which snapshot produced a selection.

use crate::core::catalog::{Catalog, Category};
use crate::core::policy::ActivationPolicy;
use crate::core::router::{self, RouteDecision, RouteState};
use crate::core::selector::{self, Candidate};
use crate::core::signal::WorkContext;
use crate::core::time::CivilDate;
use crate::core::{conflict, lifecycle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The engine's result: ordered content units, the routed agent, and the
/// reason every dropped candidate was dropped. Rendering this into a
/// prompt is the host's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    /// Rule and skill ids, highest score first, bounded by the scope limit.
    pub ordered_units: Vec<String>,
    pub chosen_agent: Option<String>,
    pub ambiguous: bool,
    pub route_state: RouteState,
    /// Candidate id -> rejection reason.
    pub rejected: BTreeMap<String, String>,
    /// SHA-256 of the catalog snapshot that produced this selection.
    pub catalog_hash: String,
    pub as_of: CivilDate,
}

/// Classify one work context against a catalog snapshot.
///
/// Pipeline: collect and score candidates, apply lifecycle gating, resolve
/// exclusion groups, re-rank, then truncate to the scope limit. Truncation
/// runs last so that removing an excluded unit promotes the next-ranked
/// candidate into the limit window. Agents ride the same pipeline but are
/// routed, not loaded: they never occupy content slots.
pub fn classify(
    catalog: &Catalog,
    ctx: &WorkContext,
    policy: &ActivationPolicy,
    as_of: CivilDate,
) -> Selection {
    let candidates = selector::collect_candidates(catalog, ctx, policy);
    let (kept, rejected_lifecycle) = lifecycle::filter(candidates, catalog, as_of);
    let (mut kept, rejected_conflict) = conflict::resolve(kept, catalog);
    selector::rank(&mut kept);

    let (agents, content): (Vec<Candidate>, Vec<Candidate>) =
        kept.into_iter().partition(|c| c.category == Category::Agent);

    let mut rejected: BTreeMap<String, String> = BTreeMap::new();
    for (id, reason) in rejected_lifecycle.into_iter().chain(rejected_conflict) {
        rejected.insert(id, reason);
    }

    let limit = policy.limits.limit(ctx.task_scope);
    let cutoff = limit.unwrap_or(content.len()).min(content.len());
    let mut ordered_units = Vec::with_capacity(cutoff);
    for (idx, candidate) in content.into_iter().enumerate() {
        if idx < cutoff {
            ordered_units.push(candidate.id);
        } else {
            rejected.insert(candidate.id, "over_limit".to_string());
        }
    }

    let route = router::route_agents(&agents, policy);

    Selection {
        ordered_units,
        chosen_agent: route.agent,
        ambiguous: route.ambiguous,
        route_state: route.state,
        rejected,
        catalog_hash: catalog.snapshot_hash().to_string(),
        as_of,
    }
}

/// Routing only: the same pipeline, discarding the content selection.
pub fn route(
    catalog: &Catalog,
    ctx: &WorkContext,
    policy: &ActivationPolicy,
    as_of: CivilDate,
) -> RouteDecision {
    let candidates = selector::collect_candidates(catalog, ctx, policy);
    let (kept, _) = lifecycle::filter(candidates, catalog, as_of);
    let (mut kept, _) = conflict::resolve(kept, catalog);
    selector::rank(&mut kept);
    let agents: Vec<Candidate> = kept
        .into_iter()
        .filter(|c| c.category == Category::Agent)
        .collect();
    router::route_agents(&agents, policy)
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "classify",
        "version": "1.0.0",
        "description": "Deterministic selection of content units and agent for one work context",
        "pipeline": ["extract", "lookup", "score", "lifecycle", "conflict", "rank", "truncate", "route"],
        "limits": { "single_file": 3, "feature": 5, "multi_file": 7, "architecture": null },
        "rejection_reasons": ["removed", "deprecated", "replaced_by:<id>", "superseded_by:<id>", "over_limit"]
    })
}
