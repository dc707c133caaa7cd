//! Integration tests for the client-side navigator
//!
//! # Test Strategy
//!
//! Navigations run on a `futures` `LocalPool`. Handlers that must stay suspended
//! park on a oneshot "gate" that the test releases explicitly, which makes
//! overlapping navigations deterministic:
//!
//! - `LastResolvedWins`: whichever navigation resolves last becomes current
//! - `LatestStartedWins`: results of superseded navigations are discarded

use futures::channel::oneshot;
use futures::executor::LocalPool;
use http::Method;
use routewise::dispatcher::{DispatchRequest, DispatchResponse};
use routewise::middleware::{Next, SessionGuard};
use routewise::navigation::{
    guard_fn, ClickEvent, History, MemoryHistory, NavigateOptions, NavigationOutcome, Navigator,
    NavigatorBuilder, OverlapPolicy, View, MAX_REDIRECTS,
};
use routewise::pattern::Params;
use routewise::router::RouteOptions;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use url::Url;

type Gates = Rc<RefCell<HashMap<String, oneshot::Sender<()>>>>;

fn origin() -> Url {
    Url::parse("https://shop.example").unwrap()
}

fn push() -> NavigateOptions {
    NavigateOptions::default()
}

/// Customers app: a literal list route, a detail route and a login page
fn customers_app() -> NavigatorBuilder {
    Navigator::builder()
        .route_with(
            "/customers",
            RouteOptions::named("customers-list"),
            |_req: DispatchRequest, _params: Params| async move { anyhow::Ok("customers") },
        )
        .unwrap()
        .route_with(
            "/customers/:id",
            RouteOptions::named("customers-detail"),
            |req: DispatchRequest, params: Params| async move {
                anyhow::Ok(json!({
                    "id": params.get("id"),
                    "tab": req.query("tab"),
                }))
            },
        )
        .unwrap()
        .route_with(
            "/login",
            RouteOptions::named("login").skip("session").skip("auth"),
            |_req: DispatchRequest, _params: Params| async move { anyhow::Ok("login") },
        )
        .unwrap()
}

/// Route whose handler waits until the test opens its gate
fn gated_app(gates: &Gates, policy: OverlapPolicy) -> NavigatorBuilder {
    let gates = Rc::clone(gates);
    Navigator::builder()
        .route("/slow/:id", move |_req: DispatchRequest, params: Params| {
            let id = params.get("id").unwrap_or_default().to_string();
            let (tx, rx) = oneshot::channel();
            gates.borrow_mut().insert(id.clone(), tx);
            async move {
                let _ = rx.await;
                anyhow::Ok(id)
            }
        })
        .unwrap()
        .overlap_policy(policy)
}

fn open_gate(gates: &Gates, id: &str) {
    let tx = gates.borrow_mut().remove(id).unwrap();
    tx.send(()).unwrap();
}

fn current_id(navigator: &Navigator) -> Option<String> {
    navigator
        .current_route()
        .and_then(|r| r.params.get("id").map(str::to_string))
}

#[test]
fn test_navigate_replace_sets_current_route() {
    let mut pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers"));
    let navigator = customers_app().build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    let outcome = pool.run_until(navigator.navigate("/customers/7", NavigateOptions { replace: true }));
    assert!(matches!(outcome, NavigationOutcome::Committed(View::Route(_))));

    assert_eq!(history.current_path(), "/customers/7");
    assert_eq!(history.len(), 1);
    assert!(!history.can_go_back());

    let route = navigator.current_route().unwrap();
    assert_eq!(route.name.as_deref(), Some("customers-detail"));
    assert_eq!(route.template, "/customers/:id");
    assert_eq!(route.params.get("id"), Some("7"));
    assert_eq!(route.params.len(), 1);
}

#[test]
fn test_navigate_push_adds_history_entry() {
    let mut pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers"));
    let navigator = customers_app().build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    pool.run_until(navigator.navigate("/customers/7?tab=notes", push()));
    assert_eq!(history.len(), 2);
    assert!(history.can_go_back());

    let route = navigator.current_route().unwrap();
    assert_eq!(route.path, "/customers/7?tab=notes");
    assert_eq!(route.response.body, json!({ "id": "7", "tab": "notes" }));
}

#[test]
fn test_start_dispatches_initial_entry() {
    let mut pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers/3"));
    let navigator = customers_app().build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    assert!(navigator.current().is_none());
    pool.run_until(navigator.start());
    assert_eq!(current_id(&navigator).as_deref(), Some("3"));
    assert_eq!(history.len(), 1);
}

#[test]
fn test_back_and_forward_redispatch_without_touching_history() {
    let mut pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers"));
    let navigator = customers_app().build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    pool.run_until(navigator.navigate("/customers/1", push()));
    pool.run_until(navigator.navigate("/customers/2", push()));
    assert_eq!(history.len(), 3);

    history.go_back();
    pool.run_until_stalled();
    assert_eq!(current_id(&navigator).as_deref(), Some("1"));
    assert_eq!(history.len(), 3);
    assert_eq!(history.current_path(), "/customers/1");

    history.go_back();
    pool.run_until_stalled();
    let route = navigator.current_route().unwrap();
    assert_eq!(route.name.as_deref(), Some("customers-list"));

    history.go_forward();
    pool.run_until_stalled();
    assert_eq!(current_id(&navigator).as_deref(), Some("1"));
    assert_eq!(history.len(), 3);
}

#[test]
fn test_in_app_link_click_is_intercepted() {
    let mut pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers"));
    let navigator = customers_app().build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    let mut click = ClickEvent::link("/customers/9");
    let nav = navigator.handle_click(&mut click).unwrap();
    assert!(click.default_prevented);
    assert_eq!(history.current_path(), "/customers/9");

    pool.run_until(nav);
    assert_eq!(current_id(&navigator).as_deref(), Some("9"));

    // relative to the current path, absolute same-origin URL
    let mut relative = ClickEvent::link("12");
    pool.run_until(navigator.handle_click(&mut relative).unwrap());
    assert_eq!(current_id(&navigator).as_deref(), Some("12"));

    let mut absolute = ClickEvent::link("https://shop.example/customers/13?tab=x");
    pool.run_until(navigator.handle_click(&mut absolute).unwrap());
    assert_eq!(
        navigator.current_route().unwrap().path,
        "/customers/13?tab=x"
    );
}

#[test]
fn test_links_left_to_the_browser() {
    let pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers"));
    let navigator = customers_app().build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    let cases = [
        ClickEvent::link("https://elsewhere.example/customers/1"),
        ClickEvent::link("mailto:help@shop.example"),
        ClickEvent::link("tel:+15550100"),
        ClickEvent::link("#details"),
        ClickEvent::link("/customers#details"),
        ClickEvent::link("/customers/1").with_target("_blank"),
        ClickEvent::link("/customers/1").with_rel("external"),
        ClickEvent::link("/customers/1").with_download(),
        ClickEvent::link("/customers/1").with_ctrl(),
        ClickEvent::link("/customers/1").with_button(1),
        // same origin, but no client route claims it
        ClickEvent::link("/invoices/1"),
    ];
    for mut click in cases {
        let href = click.href.clone();
        assert!(navigator.handle_click(&mut click).is_none(), "{href:?}");
        assert!(!click.default_prevented, "{href:?}");
    }
    assert_eq!(history.len(), 1);
}

#[test]
fn test_unmatched_path_commits_not_found_view() {
    let mut pool = LocalPool::new();
    let navigator = customers_app().build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    pool.run_until(navigator.navigate("/customers/1", push()));
    let outcome = pool.run_until(navigator.navigate("/nowhere", push()));
    match outcome {
        NavigationOutcome::Committed(View::NotFound { path, response }) => {
            assert_eq!(path, "/nowhere");
            assert_eq!(response.status, 404);
        }
        other => panic!("expected not-found view, got {other:?}"),
    }
    assert!(navigator.current_route().is_none());
}

#[test]
fn test_not_found_hook_renders_client_fallback() {
    let mut pool = LocalPool::new();
    let navigator = customers_app()
        .not_found(|req| DispatchResponse::text(404, format!("no page at {}", req.path())))
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    pool.run_until(navigator.navigate("/nowhere?x=1", push()));
    let view = navigator.current().unwrap();
    assert_eq!(view.response().body, json!("no page at /nowhere"));
}

#[test]
fn test_handler_fault_commits_error_view() {
    let mut pool = LocalPool::new();
    let navigator = Navigator::builder()
        .route("/broken", |_req: DispatchRequest, _params: Params| async move {
            Err::<&str, _>(anyhow::anyhow!("api returned 502"))
        })
        .unwrap()
        .route("/panics", |_req: DispatchRequest, _params: Params| async move {
            if true {
                panic!("render failed");
            }
            anyhow::Ok("never")
        })
        .unwrap()
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    for path in ["/broken", "/panics"] {
        let outcome = pool.run_until(navigator.navigate(path, push()));
        match outcome {
            NavigationOutcome::Committed(View::Error { response, .. }) => {
                assert_eq!(response, DispatchResponse::internal_error());
            }
            other => panic!("expected error view for {path}, got {other:?}"),
        }
    }
}

#[test]
fn test_server_middleware_guards_client_routes() {
    let mut pool = LocalPool::new();
    let handler_runs = Rc::new(Cell::new(0));
    let runs = Rc::clone(&handler_runs);
    let navigator = Navigator::builder()
        .route("/orders/:id", move |_req: DispatchRequest, _params: Params| {
            runs.set(runs.get() + 1);
            async move { anyhow::Ok("order") }
        })
        .unwrap()
        .guard(SessionGuard::with_tokens(HashMap::new()))
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    let outcome = pool.run_until(navigator.navigate("/orders/1", push()));
    match outcome {
        NavigationOutcome::Halted { step, response } => {
            assert_eq!(step, "session");
            assert_eq!(response.status, 401);
        }
        other => panic!("expected halt, got {other:?}"),
    }
    assert_eq!(handler_runs.get(), 0);
    assert!(navigator.current().is_none());
}

#[test]
fn test_guard_halt_keeps_current_view() {
    let mut pool = LocalPool::new();
    let navigator = customers_app()
        .guard(guard_fn("lock", |req: DispatchRequest| async move {
            if req.path() == "/customers/666" {
                anyhow::Ok(Next::Halt(DispatchResponse::error(403, "Forbidden")))
            } else {
                anyhow::Ok(Next::Continue(req))
            }
        }))
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    pool.run_until(navigator.navigate("/customers/1", push()));
    let outcome = pool.run_until(navigator.navigate("/customers/666", push()));
    assert!(matches!(outcome, NavigationOutcome::Halted { ref step, .. } if step == "lock"));
    assert_eq!(current_id(&navigator).as_deref(), Some("1"));
}

#[test]
fn test_guard_redirect_replaces_history_entry() {
    let mut pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers"));
    let navigator = customers_app()
        .guard(guard_fn("auth", |req: DispatchRequest| async move {
            if req.header("authorization").is_none() {
                anyhow::Ok(Next::Halt(DispatchResponse::redirect("/login")))
            } else {
                anyhow::Ok(Next::Continue(req))
            }
        }))
        .build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    let outcome = pool.run_until(navigator.navigate("/customers/5", push()));
    match outcome {
        NavigationOutcome::Committed(View::Route(route)) => {
            assert_eq!(route.name.as_deref(), Some("login"));
        }
        other => panic!("expected login route, got {other:?}"),
    }
    assert_eq!(history.current_path(), "/login");
    assert_eq!(history.len(), 2);
}

#[test]
fn test_redirect_loop_is_cut_off() {
    let mut pool = LocalPool::new();
    let checks = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&checks);
    let navigator = customers_app()
        .guard(guard_fn("bounce", move |req: DispatchRequest| {
            counter.set(counter.get() + 1);
            let next = if req.path() == "/customers/1" { "/customers/2" } else { "/customers/1" };
            async move { anyhow::Ok(Next::Halt(DispatchResponse::redirect(next))) }
        }))
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    let outcome = pool.run_until(navigator.navigate("/customers/1", push()));
    assert!(matches!(outcome, NavigationOutcome::Halted { ref step, .. } if step == "redirect"));
    assert_eq!(checks.get(), MAX_REDIRECTS + 1);
    assert!(navigator.current().is_none());
}

#[test]
fn test_last_resolved_wins_by_default() {
    let mut pool = LocalPool::new();
    let gates: Gates = Rc::new(RefCell::new(HashMap::new()));
    let navigator = gated_app(&gates, OverlapPolicy::default())
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    let first = navigator.navigate("/slow/a", push());
    let second = navigator.navigate("/slow/b", push());
    pool.run_until_stalled();
    assert_eq!(gates.borrow().len(), 2);

    open_gate(&gates, "b");
    assert!(matches!(pool.run_until(second), NavigationOutcome::Committed(_)));
    assert_eq!(current_id(&navigator).as_deref(), Some("b"));

    // the earlier navigation resolves last and overwrites the current route
    open_gate(&gates, "a");
    assert!(matches!(pool.run_until(first), NavigationOutcome::Committed(_)));
    assert_eq!(current_id(&navigator).as_deref(), Some("a"));
}

#[test]
fn test_latest_started_wins_discards_stale_results() {
    let mut pool = LocalPool::new();
    let gates: Gates = Rc::new(RefCell::new(HashMap::new()));
    let navigator = gated_app(&gates, OverlapPolicy::LatestStartedWins)
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    let first = navigator.navigate("/slow/a", push());
    let second = navigator.navigate("/slow/b", push());
    pool.run_until_stalled();

    open_gate(&gates, "b");
    pool.run_until(second);
    assert_eq!(current_id(&navigator).as_deref(), Some("b"));

    open_gate(&gates, "a");
    assert_eq!(pool.run_until(first), NavigationOutcome::Superseded);
    assert_eq!(current_id(&navigator).as_deref(), Some("b"));
}

#[test]
fn test_dropped_handle_does_not_cancel_navigation() {
    let mut pool = LocalPool::new();
    let gates: Gates = Rc::new(RefCell::new(HashMap::new()));
    let navigator = gated_app(&gates, OverlapPolicy::default())
        .build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    drop(navigator.navigate("/slow/x", push()));
    pool.run_until_stalled();
    assert!(navigator.current().is_none());

    open_gate(&gates, "x");
    pool.run_until_stalled();
    assert_eq!(current_id(&navigator).as_deref(), Some("x"));
}

#[test]
fn test_teardown_stops_listening() {
    let mut pool = LocalPool::new();
    let history = Rc::new(MemoryHistory::with_initial_path("/customers"));
    let gates: Gates = Rc::new(RefCell::new(HashMap::new()));
    let navigator = gated_app(&gates, OverlapPolicy::default())
        .build(Rc::clone(&history) as Rc<dyn History>, pool.spawner(), origin());

    let in_flight = navigator.navigate("/slow/late", push());
    pool.run_until_stalled();
    navigator.teardown();

    // an in-flight result is not committed after teardown
    open_gate(&gates, "late");
    assert_eq!(pool.run_until(in_flight), NavigationOutcome::Ignored);
    assert!(navigator.current().is_none());

    assert_eq!(
        pool.run_until(navigator.navigate("/slow/after", push())),
        NavigationOutcome::Ignored
    );
    history.go_back();
    pool.run_until_stalled();
    assert!(gates.borrow().is_empty());
    assert!(navigator.handle_click(&mut ClickEvent::link("/slow/1")).is_none());
}

#[test]
fn test_client_and_server_tables_agree() {
    use routewise::dispatcher::{handler_fn, Dispatcher};

    let templates = ["/orders/new", "/orders/:id", "/orders/{id}/items/:item"];
    let mut dispatcher = Dispatcher::new();
    let mut builder = Navigator::builder();
    for template in templates {
        dispatcher
            .get(template, handler_fn(move |_req, _params| Ok(template)))
            .unwrap();
        builder = builder
            .route(template, move |_req: DispatchRequest, _params: Params| async move {
                anyhow::Ok(template)
            })
            .unwrap();
    }
    let mut pool = LocalPool::new();
    let navigator = builder.build(Rc::new(MemoryHistory::default()), pool.spawner(), origin());

    for path in ["/orders/new", "/orders/7", "/orders/7/items/a%20b", "/orders"] {
        let server = dispatcher.dispatch(DispatchRequest::new(Method::GET, path));
        pool.run_until(navigator.navigate(path, push()));
        let client = navigator.current().unwrap();
        assert_eq!(client.response().status, server.status, "{path}");
        assert_eq!(client.response().body, server.body, "{path}");
    }
}
