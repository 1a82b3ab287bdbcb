//! Activation policy contract.
//!
//! Load limits, scoring weights, and router thresholds are policy data
//! passed explicitly into every call - never global state - so callers and
//! tests can vary them per invocation. A project may pin its own contract
//! at `.carapace/policy.json`; the defaults below apply otherwise.

use crate::core::catalog::{Catalog, Category, LifecycleState};
use crate::core::error::CarapaceError;
use crate::core::signal::TaskScope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const POLICY_REL_PATH: &str = ".carapace/policy.json";
pub const POLICY_SCHEMA_VERSION: &str = "1.0.0";

/// Per-scope load limits. `None` means unbounded (practically capped at
/// catalog size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeLimits {
    pub single_file: Option<usize>,
    pub feature: Option<usize>,
    pub multi_file: Option<usize>,
    pub architecture: Option<usize>,
}

impl ScopeLimits {
    pub fn limit(&self, scope: TaskScope) -> Option<usize> {
        match scope {
            TaskScope::SingleFile => self.single_file,
            TaskScope::Feature => self.feature,
            TaskScope::MultiFile => self.multi_file,
            TaskScope::Architecture => self.architecture,
        }
    }
}

/// Additive weight per trigger kind. Manifest-derived signals outrank file
/// extensions, which outrank free-text keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeights {
    pub project_marker: i64,
    pub file_extension: i64,
    pub keyword: i64,
}

/// Router thresholds and the designated multi-domain coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterPolicy {
    /// Minimum score an agent candidate needs to be considered at all.
    pub min_confidence: f64,
    /// Two candidates within this margin of each other are a tie.
    pub tie_margin: f64,
    /// Agent id returned for multi-domain work. Must exist in the catalog.
    pub coordinator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationPolicy {
    pub schema_version: String,
    pub limits: ScopeLimits,
    pub weights: SignalWeights,
    pub router: RouterPolicy,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        ActivationPolicy {
            schema_version: POLICY_SCHEMA_VERSION.to_string(),
            limits: ScopeLimits {
                single_file: Some(3),
                feature: Some(5),
                multi_file: Some(7),
                architecture: None,
            },
            weights: SignalWeights {
                project_marker: 5,
                file_extension: 3,
                keyword: 1,
            },
            router: RouterPolicy {
                min_confidence: 5.0,
                tie_margin: 2.0,
                coordinator: "project-coordinator".to_string(),
            },
        }
    }
}

impl ActivationPolicy {
    /// Load the project policy contract, falling back to the defaults when
    /// no contract file exists. A present-but-invalid contract is a
    /// configuration error, not a fallback.
    pub fn load(project_root: Option<&Path>) -> Result<(Self, Option<PathBuf>), CarapaceError> {
        let Some(root) = project_root else {
            return Ok((Self::default(), None));
        };
        let path = root.join(POLICY_REL_PATH);
        if !path.is_file() {
            return Ok((Self::default(), None));
        }
        let raw = std::fs::read_to_string(&path)?;
        let parsed: ActivationPolicy = serde_json::from_str(&raw)
            .map_err(|e| CarapaceError::PolicyError(format!("{}: {}", path.display(), e)))?;
        if parsed.schema_version != POLICY_SCHEMA_VERSION {
            return Err(CarapaceError::PolicyError(format!(
                "{}: schema version {} does not match expected {}",
                path.display(),
                parsed.schema_version,
                POLICY_SCHEMA_VERSION
            )));
        }
        Ok((parsed, Some(path)))
    }

    /// Validate policy references against a catalog snapshot. The
    /// coordinator must resolve to an active agent.
    pub fn validate_against(&self, catalog: &Catalog) -> Result<(), CarapaceError> {
        match catalog.get(&self.router.coordinator) {
            None => Err(CarapaceError::PolicyError(format!(
                "router coordinator '{}' is not defined in the catalog",
                self.router.coordinator
            ))),
            Some(unit) if unit.category != Category::Agent => Err(CarapaceError::PolicyError(
                format!("router coordinator '{}' is not an agent", unit.id),
            )),
            Some(unit) if unit.lifecycle == LifecycleState::Removed => {
                Err(CarapaceError::PolicyError(format!(
                    "router coordinator '{}' is removed from the catalog",
                    unit.id
                )))
            }
            Some(_) => Ok(()),
        }
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "policy",
        "version": POLICY_SCHEMA_VERSION,
        "description": "Activation policy contract: load limits, signal weights, router thresholds",
        "defaults": ActivationPolicy::default(),
        "storage": [POLICY_REL_PATH]
    })
}
