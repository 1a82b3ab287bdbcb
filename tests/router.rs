use carapace::core::catalog::Catalog;
use carapace::core::engine::route;
use carapace::core::policy::ActivationPolicy;
use carapace::core::router::RouteState;
use carapace::core::signal::{ProjectMarker, TaskScope, WorkContext};
use carapace::core::time::CivilDate;

fn embedded_catalog() -> Catalog {
    Catalog::load(None).unwrap()
}

fn as_of() -> CivilDate {
    CivilDate::parse("2026-08-06").unwrap()
}

fn text_ctx(text: &str) -> WorkContext {
    WorkContext {
        request_text: text.to_string(),
        task_scope: TaskScope::Feature,
        ..WorkContext::default()
    }
}

#[test]
fn test_frontend_extension_routes_clear() {
    let catalog = embedded_catalog();
    let policy = ActivationPolicy::default();
    let mut ctx = text_ctx("add a button");
    ctx.add_extension(".tsx");

    let decision = route(&catalog, &ctx, &policy, as_of());
    assert_eq!(decision.state, RouteState::Clear);
    assert_eq!(decision.agent.as_deref(), Some("frontend-specialist"));
    assert!(!decision.ambiguous);
}

#[test]
fn test_keyword_only_database_intent_routes_clear() {
    let catalog = embedded_catalog();
    let policy = ActivationPolicy::default();
    let ctx = text_ctx("write a migration for the new orders schema");

    let decision = route(&catalog, &ctx, &policy, as_of());
    assert_eq!(decision.state, RouteState::Clear);
    assert_eq!(decision.agent.as_deref(), Some("database-specialist"));
}

#[test]
fn test_no_signals_is_ambiguous() {
    let catalog = embedded_catalog();
    let policy = ActivationPolicy::default();

    let decision = route(&catalog, &WorkContext::default(), &policy, as_of());
    assert_eq!(decision.state, RouteState::Ambiguous);
    assert!(decision.agent.is_none());
    assert!(decision.ambiguous);
}

#[test]
fn test_unmatched_text_is_ambiguous() {
    let catalog = embedded_catalog();
    let policy = ActivationPolicy::default();
    let decision = route(
        &catalog,
        &text_ctx("zzz qqq completely unrelated prose"),
        &policy,
        as_of(),
    );
    assert_eq!(decision.state, RouteState::Ambiguous);
}

#[test]
fn test_spanning_domains_routes_to_coordinator() {
    let catalog = embedded_catalog();
    let policy = ActivationPolicy::default();
    let mut ctx = text_ctx("database schema plus a security audit");
    ctx.add_extension(".tsx");

    let decision = route(&catalog, &ctx, &policy, as_of());
    assert_eq!(decision.state, RouteState::MultiDomain);
    assert_eq!(decision.agent.as_deref(), Some("project-coordinator"));
}

#[test]
fn test_marker_specialist_beats_generic_backend() {
    let catalog = embedded_catalog();
    let policy = ActivationPolicy::default();
    let mut ctx = text_ctx("");
    ctx.add_extension(".php");
    ctx.add_marker(ProjectMarker::parse("composer.json#laravel/framework"));

    let decision = route(&catalog, &ctx, &policy, as_of());
    assert_eq!(decision.state, RouteState::Clear);
    assert_eq!(decision.agent.as_deref(), Some("laravel-specialist"));
}

#[test]
fn test_raised_confidence_floor_turns_weak_signal_ambiguous() {
    let catalog = embedded_catalog();
    let mut policy = ActivationPolicy::default();
    let ctx = text_ctx("look at the database");

    let decision = route(&catalog, &ctx, &policy, as_of());
    assert_eq!(decision.state, RouteState::Clear);

    // The same signal no longer clears a stricter policy.
    policy.router.min_confidence = 20.0;
    let decision = route(&catalog, &ctx, &policy, as_of());
    assert_eq!(decision.state, RouteState::Ambiguous);
}

#[test]
fn test_routing_ignores_sunset_agents() {
    // An agent past its sunset date must not be routable.
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    std::fs::create_dir_all(dir.join("agents")).unwrap();
    std::fs::write(
        dir.join("agents/old-guard.md"),
        "---\nid: old-guard\ncategory: agent\ndomain: backend\npriority: 2\nlifecycle: deprecated\nsunset: 2025-01-01\nkeywords: server\n---\n# Old Guard\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("agents/new-guard.md"),
        "---\nid: new-guard\ncategory: agent\ndomain: backend\npriority: 1\nkeywords: server\n---\n# New Guard\n",
    )
    .unwrap();
    let catalog = Catalog::from_dir(dir).unwrap();
    let mut policy = ActivationPolicy::default();
    policy.router.coordinator = "new-guard".to_string();
    policy.validate_against(&catalog).unwrap();

    let decision = route(&catalog, &text_ctx("restart the server"), &policy, as_of());
    assert_eq!(decision.state, RouteState::Clear);
    assert_eq!(decision.agent.as_deref(), Some("new-guard"));
}
