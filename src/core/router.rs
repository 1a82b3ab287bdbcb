//! Agent routing decision tree.
//!
//! One decision per call, no persistent state: the candidate pipeline
//! restricted to agents either produces a single dominant specialist
//! (`Clear`), signals spanning unrelated domains (`MultiDomain`, routed to
//! the designated coordinator), or nothing decisive (`Ambiguous`, a
//! first-class outcome the caller escalates as a clarification step).

use crate::core::policy::ActivationPolicy;
use crate::core::selector::Candidate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    Clear,
    MultiDomain,
    Ambiguous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub state: RouteState,
    pub agent: Option<String>,
    pub ambiguous: bool,
}

impl RouteDecision {
    fn ambiguous() -> Self {
        RouteDecision {
            state: RouteState::Ambiguous,
            agent: None,
            ambiguous: true,
        }
    }
}

/// Route over agent candidates, pre-sorted descending by the selector.
///
/// Deterministic and total: exactly one terminal state per call.
pub fn route_agents(agents: &[Candidate], policy: &ActivationPolicy) -> RouteDecision {
    let contenders: Vec<&Candidate> = agents
        .iter()
        .filter(|c| c.score >= policy.router.min_confidence)
        .collect();
    let Some(top) = contenders.first() else {
        return RouteDecision::ambiguous();
    };

    // Unrelated domains with comparable strength escalate to the
    // coordinator; a weak off-domain echo does not.
    let rival_domains: BTreeSet<&str> = contenders
        .iter()
        .filter(|c| c.score >= top.score - policy.router.tie_margin)
        .map(|c| c.domain.as_str())
        .collect();
    if rival_domains.len() >= 2 {
        return RouteDecision {
            state: RouteState::MultiDomain,
            agent: Some(policy.router.coordinator.clone()),
            ambiguous: false,
        };
    }

    match contenders.get(1) {
        Some(second) if top.score - second.score <= policy.router.tie_margin => {
            RouteDecision::ambiguous()
        }
        _ => RouteDecision {
            state: RouteState::Clear,
            agent: Some(top.id.clone()),
            ambiguous: false,
        },
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "router",
        "version": "1.0.0",
        "description": "Single-pass agent routing over scored agent candidates",
        "states": ["clear", "multi_domain", "ambiguous"],
        "outputs": {
            "clear": "dominant specialist id",
            "multi_domain": "designated coordinator id",
            "ambiguous": "null agent; caller escalates to clarification"
        }
    })
}
