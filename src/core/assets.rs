//! Embedded default catalog assets.
//!
//! The default rules, skills, and agents are baked into the binary at
//! compile time for hermetic deployment - a host gets a working catalog with
//! no external files. A project catalog under `.carapace/catalog/` overlays
//! these defaults at load time.
//!
//! List order below is catalog declaration order, which is the final
//! ranking tie-break. Rules come first, then skills, then agents.

/// Macro to embed catalog unit files at compile time as text.
///
/// Generates:
/// - Public constants for each embedded unit file
/// - `embedded_unit_sources()` returning (path, source) pairs in declaration order
macro_rules! embedded_units {
    ($($path:expr => $const_name:ident),* $(,)?) => {
        $(
            pub const $const_name: &str =
                include_str!(concat!("../../catalog/embedded/", $path));
        )*

        pub fn embedded_unit_sources() -> Vec<(&'static str, &'static str)> {
            vec![ $( ($path, $const_name), )* ]
        }
    };
}

embedded_units! {
    // Rules: framework and language conventions
    "rules/react-patterns.md" => EMBEDDED_RULE_REACT_PATTERNS,
    "rules/vue-patterns.md" => EMBEDDED_RULE_VUE_PATTERNS,
    "rules/svelte-conventions.md" => EMBEDDED_RULE_SVELTE_CONVENTIONS,
    "rules/typescript-strict.md" => EMBEDDED_RULE_TYPESCRIPT_STRICT,
    "rules/vite-config.md" => EMBEDDED_RULE_VITE_CONFIG,
    "rules/webpack-config.md" => EMBEDDED_RULE_WEBPACK_CONFIG,
    "rules/jquery-patterns.md" => EMBEDDED_RULE_JQUERY_PATTERNS,
    "rules/grunt-tasks.md" => EMBEDDED_RULE_GRUNT_TASKS,
    "rules/php-general.md" => EMBEDDED_RULE_PHP_GENERAL,
    "rules/laravel-conventions.md" => EMBEDDED_RULE_LARAVEL_CONVENTIONS,
    "rules/symfony-conventions.md" => EMBEDDED_RULE_SYMFONY_CONVENTIONS,
    "rules/rust-idioms.md" => EMBEDDED_RULE_RUST_IDIOMS,
    "rules/python-style.md" => EMBEDDED_RULE_PYTHON_STYLE,
    "rules/api-design.md" => EMBEDDED_RULE_API_DESIGN,
    "rules/sql-query-review.md" => EMBEDDED_RULE_SQL_QUERY_REVIEW,
    "rules/security-baseline.md" => EMBEDDED_RULE_SECURITY_BASELINE,
    "rules/testing-discipline.md" => EMBEDDED_RULE_TESTING_DISCIPLINE,

    // Skills: focused procedures loaded by agents
    "skills/query-optimization.md" => EMBEDDED_SKILL_QUERY_OPTIMIZATION,
    "skills/api-contract-review.md" => EMBEDDED_SKILL_API_CONTRACT_REVIEW,
    "skills/component-accessibility.md" => EMBEDDED_SKILL_COMPONENT_ACCESSIBILITY,

    // Agents: routing targets
    "agents/frontend-specialist.md" => EMBEDDED_AGENT_FRONTEND_SPECIALIST,
    "agents/backend-specialist.md" => EMBEDDED_AGENT_BACKEND_SPECIALIST,
    "agents/laravel-specialist.md" => EMBEDDED_AGENT_LARAVEL_SPECIALIST,
    "agents/database-specialist.md" => EMBEDDED_AGENT_DATABASE_SPECIALIST,
    "agents/security-auditor.md" => EMBEDDED_AGENT_SECURITY_AUDITOR,
    "agents/project-coordinator.md" => EMBEDDED_AGENT_PROJECT_COORDINATOR,
}

/// Embedded exclusion-group declarations.
pub const EMBEDDED_GROUPS: &str = include_str!("../../catalog/embedded/groups.toml");
