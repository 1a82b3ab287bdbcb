//! Carapace: Context-Aware Activation for AI Coding Agents
//!
//! **Carapace is the deterministic activation engine that decides what an
//! AI coding assistant should load before it thinks.**
//!
//! A host hands Carapace a work context - touched file extensions, the
//! project root, a free-text request - and gets back a bounded, prioritized
//! selection of rules and skills plus a routed agent. Rendering that
//! selection into a prompt is the host's job; deciding it deterministically
//! is ours.
//!
//! # Core Principles
//!
//! - **Declarative**: triggers are catalog data (markdown frontmatter), not
//!   code branches; catalogs update without recompilation
//! - **Deterministic**: identical catalog + context always produce
//!   byte-identical selections, stamped with the catalog hash
//! - **Bounded**: every scope tier carries a load limit; truncation happens
//!   after filtering so exclusions promote the next candidate
//! - **Degrading**: unreadable or malformed project files are absent
//!   signals with a logged warning, never errors
//!
//! # Pipeline
//!
//! Signal extraction → index lookups → scoring → lifecycle gating →
//! conflict resolution → agent routing → assembly. See [`core::engine`].
//!
//! # Examples
//!
//! ```bash
//! # Classify a work context
//! carapace classify --file src/App.tsx --text "add a button" --scope single_file
//!
//! # Route only
//! carapace route --text "optimize the slow orders query"
//!
//! # Inspect the catalog
//! carapace catalog list
//! carapace catalog validate
//! ```

pub mod core;

use crate::core::catalog::{Catalog, Category, LifecycleState};
use crate::core::engine::{self, Selection};
use crate::core::error::CarapaceError;
use crate::core::policy::ActivationPolicy;
use crate::core::probe;
use crate::core::router::RouteState;
use crate::core::signal::{ProjectMarker, TaskScope, WorkContext};
use crate::core::time::CivilDate;
use crate::core::{catalog, output, policy, router};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "carapace",
    version = env!("CARGO_PKG_VERSION"),
    about = "Carapace is the deterministic context-activation engine that selects the rules, skills, and agent an AI coding assistant should load for a given work context. 🦀"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SignalArgs {
    /// Touched file extension (repeatable), e.g. `--ext .tsx`
    #[clap(long = "ext")]
    ext: Vec<String>,
    /// Touched file path (repeatable); its extension is extracted
    #[clap(long = "file")]
    file: Vec<PathBuf>,
    /// Project marker (repeatable): `file` or `file#dependency-key`
    #[clap(long = "marker")]
    marker: Vec<String>,
    /// Free-text request describing the task
    #[clap(long, default_value = "")]
    text: String,
    /// Project root for marker probing and catalog/policy overlays
    /// (defaults to the current working directory)
    #[clap(long)]
    root: Option<PathBuf>,
    /// Skip filesystem probing; use only explicit `--marker` values
    #[clap(long)]
    no_probe: bool,
    /// Classification date (YYYY-MM-DD, defaults to today UTC)
    #[clap(long)]
    as_of: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ClassifyCli {
    #[clap(flatten)]
    signals: SignalArgs,
    /// Load-limit tier: single_file | feature | multi_file | architecture
    #[clap(long, default_value = "feature")]
    scope: String,
    /// Output format: 'text' or 'json'
    #[clap(long, default_value = "text")]
    format: String,
}

#[derive(clap::Args, Debug)]
struct RouteCli {
    #[clap(flatten)]
    signals: SignalArgs,
    /// Output format: 'text' or 'json'
    #[clap(long, default_value = "text")]
    format: String,
}

#[derive(clap::Args, Debug)]
struct ProbeCli {
    /// Project root to probe (defaults to the current working directory)
    #[clap(long)]
    root: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct CatalogCli {
    #[clap(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// List catalog units with category, domain, priority, and lifecycle
    List {
        /// Filter by category: rule | skill | agent
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        root: Option<PathBuf>,
    },
    /// Show one unit's metadata, triggers, and body excerpt
    Show {
        id: String,
        #[clap(long)]
        root: Option<PathBuf>,
    },
    /// Validate a catalog; configuration errors abort with a description
    Validate {
        /// Validate a standalone catalog directory instead of the
        /// embedded + project overlay
        #[clap(long)]
        dir: Option<PathBuf>,
        #[clap(long)]
        root: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct SchemaCli {
    /// Optional: filter by subsystem name
    #[clap(long)]
    subsystem: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a work context into a bounded selection plus routed agent
    #[clap(name = "classify", visible_alias = "c")]
    Classify(ClassifyCli),

    /// Route a work context to a single primary agent
    #[clap(name = "route", visible_alias = "r")]
    Route(RouteCli),

    /// Probe a project root for manifest markers
    #[clap(name = "probe")]
    Probe(ProbeCli),

    /// Inspect and validate the content-unit catalog
    #[clap(name = "catalog", visible_alias = "cat")]
    Catalog(CatalogCli),

    /// Subsystem schemas and discovery
    #[clap(name = "schema")]
    Schema(SchemaCli),

    /// Show version information
    #[clap(name = "version")]
    Version,
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, CarapaceError> {
    match root {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

/// Build a WorkContext from CLI signal arguments. Filesystem probing runs
/// here, once, outside the pure classification path.
fn build_context(
    args: &SignalArgs,
    scope: TaskScope,
) -> Result<(WorkContext, Vec<String>), CarapaceError> {
    let mut ctx = WorkContext {
        request_text: args.text.clone(),
        task_scope: scope,
        ..WorkContext::default()
    };
    for ext in &args.ext {
        ctx.add_extension(ext);
    }
    for file in &args.file {
        ctx.add_file(file);
    }
    for marker in &args.marker {
        ctx.add_marker(ProjectMarker::parse(marker));
    }

    let mut warnings = Vec::new();
    if !args.no_probe {
        let root = resolve_root(args.root.clone())?;
        let report = probe::probe_project(&root);
        for marker in report.markers {
            ctx.add_marker(marker);
        }
        warnings = report.warnings;
    }
    Ok((ctx, warnings))
}

fn load_engine_inputs(
    root: Option<PathBuf>,
) -> Result<(Catalog, ActivationPolicy), CarapaceError> {
    let root = resolve_root(root)?;
    let catalog = Catalog::load(Some(&root))?;
    let (policy, _) = ActivationPolicy::load(Some(&root))?;
    policy.validate_against(&catalog)?;
    Ok((catalog, policy))
}

fn resolve_as_of(raw: &Option<String>) -> Result<CivilDate, CarapaceError> {
    match raw {
        Some(raw) => CivilDate::parse(raw),
        None => Ok(CivilDate::today_utc()),
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("  {} {}", "⚠".bright_yellow(), warning.bright_black());
    }
}

fn render_selection(selection: &Selection, catalog: &Catalog) {
    println!(
        "{} {} {}",
        "▸".bright_cyan(),
        "selection".bright_white().bold(),
        format!("(as of {}, catalog {})", selection.as_of, &selection.catalog_hash[..12])
            .bright_black()
    );
    if selection.ordered_units.is_empty() {
        println!("  {}", "no content units apply".bright_black());
    }
    for (rank, id) in selection.ordered_units.iter().enumerate() {
        let title = catalog
            .get(id)
            .map(|u| u.title.as_str())
            .unwrap_or_default();
        println!(
            "  {}. {} {}",
            rank + 1,
            id.bright_green(),
            output::compact_line(title, 60).bright_black()
        );
    }
    match (&selection.chosen_agent, selection.route_state) {
        (Some(agent), state) => {
            let state_label = match state {
                RouteState::Clear => "clear",
                RouteState::MultiDomain => "multi-domain",
                RouteState::Ambiguous => "ambiguous",
            };
            println!(
                "  {} agent: {} {}",
                "●".bright_green(),
                agent.bright_white().bold(),
                format!("({})", state_label).bright_black()
            );
        }
        (None, _) => {
            println!(
                "  {} agent: {} {}",
                "●".bright_yellow(),
                "none".bright_yellow(),
                "(ambiguous - ask a clarifying question)".bright_black()
            );
        }
    }
    if !selection.rejected.is_empty() {
        println!("  {}", "rejected:".bright_black());
        for (id, reason) in &selection.rejected {
            println!("    {} {}: {}", "✗".bright_black(), id, reason.bright_black());
        }
    }
}

fn lifecycle_label(state: LifecycleState) -> colored::ColoredString {
    match state {
        LifecycleState::Active => "active".bright_green(),
        LifecycleState::Deprecated => "deprecated".bright_yellow(),
        LifecycleState::Removed => "removed".bright_red(),
    }
}

pub fn run() -> Result<(), CarapaceError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
        }

        Command::Classify(classify_cli) => {
            let scope = TaskScope::parse(&classify_cli.scope)?;
            let (catalog, policy) = load_engine_inputs(classify_cli.signals.root.clone())?;
            let (ctx, warnings) = build_context(&classify_cli.signals, scope)?;
            let as_of = resolve_as_of(&classify_cli.signals.as_of)?;

            let selection = engine::classify(&catalog, &ctx, &policy, as_of);
            if classify_cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&selection).unwrap());
            } else {
                print_warnings(&warnings);
                render_selection(&selection, &catalog);
            }
        }

        Command::Route(route_cli) => {
            let (catalog, policy) = load_engine_inputs(route_cli.signals.root.clone())?;
            let (ctx, warnings) = build_context(&route_cli.signals, TaskScope::Feature)?;
            let as_of = resolve_as_of(&route_cli.signals.as_of)?;

            let decision = engine::route(&catalog, &ctx, &policy, as_of);
            if route_cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&decision).unwrap());
            } else {
                print_warnings(&warnings);
                match &decision.agent {
                    Some(agent) => println!(
                        "{} {} {}",
                        "●".bright_green(),
                        agent.bright_white().bold(),
                        match decision.state {
                            RouteState::Clear => "(clear)",
                            RouteState::MultiDomain => "(multi-domain coordinator)",
                            RouteState::Ambiguous => "(ambiguous)",
                        }
                        .bright_black()
                    ),
                    None => println!(
                        "{} {}",
                        "●".bright_yellow(),
                        "ambiguous - no dominant agent; escalate for clarification"
                            .bright_yellow()
                    ),
                }
            }
        }

        Command::Probe(probe_cli) => {
            let root = resolve_root(probe_cli.root)?;
            let report = probe::probe_project(&root);
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
        }

        Command::Catalog(catalog_cli) => match catalog_cli.command {
            CatalogCommand::List { category, root } => {
                let root = resolve_root(root)?;
                let catalog = Catalog::load(Some(&root))?;
                let filter = match category.as_deref() {
                    None => None,
                    Some("rule") => Some(Category::Rule),
                    Some("skill") => Some(Category::Skill),
                    Some("agent") => Some(Category::Agent),
                    Some(other) => {
                        return Err(CarapaceError::ValidationError(format!(
                            "unknown category '{}': expected rule|skill|agent",
                            other
                        )));
                    }
                };
                for unit in catalog.units() {
                    if let Some(wanted) = filter {
                        if unit.category != wanted {
                            continue;
                        }
                    }
                    println!(
                        "{:<28} {:<6} {:<10} {:>3}  {}",
                        unit.id.bright_white(),
                        unit.category.to_string().bright_black(),
                        unit.domain.bright_black(),
                        unit.priority,
                        lifecycle_label(unit.lifecycle)
                    );
                }
            }
            CatalogCommand::Show { id, root } => {
                let root = resolve_root(root)?;
                let catalog = Catalog::load(Some(&root))?;
                let unit = catalog
                    .get(&id)
                    .ok_or_else(|| CarapaceError::NotFound(format!("unit '{}'", id)))?;
                println!("{} {}", unit.id.bright_white().bold(), lifecycle_label(unit.lifecycle));
                println!(
                    "  {} {} / {} (priority {})",
                    "▸".bright_cyan(),
                    unit.category,
                    unit.domain,
                    unit.priority
                );
                if let Some(sunset) = unit.sunset {
                    println!("  {} sunset {}", "▸".bright_yellow(), sunset);
                }
                if let Some(replacement) = &unit.replacement {
                    println!("  {} replaced by {}", "▸".bright_yellow(), replacement);
                }
                if let Some(owner) = &unit.loaded_by {
                    println!("  {} loaded by {}", "▸".bright_cyan(), owner);
                }
                for trigger in &unit.triggers {
                    println!(
                        "  {} {:?} {}",
                        "●".bright_green(),
                        trigger.kind,
                        trigger.pattern
                    );
                }
                if let Some(group) = catalog.group_of(&unit.id) {
                    println!("  {} exclusion group {}", "▸".bright_cyan(), group.id);
                }
                println!();
                println!("{}", output::excerpt(&unit.body, 8, 100));
            }
            CatalogCommand::Validate { dir, root } => {
                let catalog = match dir {
                    Some(dir) => Catalog::from_dir(&dir)?,
                    None => {
                        let root = resolve_root(root)?;
                        Catalog::load(Some(&root))?
                    }
                };
                println!(
                    "{} catalog valid: {} units, {} groups",
                    "✓".bright_green(),
                    catalog.units().len(),
                    catalog.groups().len()
                );
                print_warnings(&catalog.warnings);
            }
        },

        Command::Schema(schema_cli) => {
            let mut schemas = std::collections::BTreeMap::new();
            schemas.insert("catalog", catalog::schema());
            schemas.insert("classify", engine::schema());
            schemas.insert("policy", policy::schema());
            schemas.insert("probe", probe::schema());
            schemas.insert("router", router::schema());

            let output = if let Some(sub) = schema_cli.subsystem {
                schemas
                    .get(sub.as_str())
                    .cloned()
                    .unwrap_or(serde_json::json!({ "error": "subsystem not found" }))
            } else {
                serde_json::json!({
                    "schema_version": "1.0.0",
                    "subsystems": schemas
                })
            };
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
    }
    Ok(())
}
