use super::{RouteError, RouteOptions, RouteTable};
use crate::pattern::PatternError;
use http::Method;

fn table(entries: &[(Method, &str, &'static str)]) -> RouteTable<&'static str> {
    let mut table = RouteTable::new();
    for (method, template, handler) in entries {
        table.register(method.clone(), template, *handler).unwrap();
    }
    table
}

#[test]
fn test_registration_order_breaks_ties() {
    let param_first = table(&[
        (Method::GET, "/orders/:id", "show"),
        (Method::GET, "/orders/new", "new"),
    ]);
    let m = param_first.route(&Method::GET, "/orders/new").unwrap();
    assert_eq!(*m.route.handler(), "show");
    assert_eq!(m.params.get("id"), Some("new"));

    let literal_first = table(&[
        (Method::GET, "/orders/new", "new"),
        (Method::GET, "/orders/:id", "show"),
    ]);
    let m = literal_first.route(&Method::GET, "/orders/new").unwrap();
    assert_eq!(*m.route.handler(), "new");
    assert!(m.params.is_empty());
}

#[test]
fn test_shadowed_literal_is_not_indexed() {
    let t = table(&[
        (Method::GET, "/orders/:id", "show"),
        (Method::GET, "/orders/new", "new"),
    ]);
    assert_eq!(t.exact_index(&Method::GET, "/orders/new"), None);

    let t = table(&[
        (Method::GET, "/orders/new", "new"),
        (Method::GET, "/orders/:id", "show"),
    ]);
    assert_eq!(t.exact_index(&Method::GET, "/orders/new"), Some(0));
}

#[test]
fn test_duplicate_literal_first_wins() {
    let t = table(&[
        (Method::GET, "/health", "first"),
        (Method::GET, "/health", "second"),
    ]);
    assert_eq!(*t.route(&Method::GET, "/health").unwrap().route.handler(), "first");
}

#[test]
fn test_method_filtering() {
    let t = table(&[
        (Method::GET, "/orders/:id", "show"),
        (Method::PUT, "/orders/:id", "update"),
    ]);
    assert_eq!(*t.route(&Method::PUT, "/orders/1").unwrap().route.handler(), "update");
    assert!(t.route(&Method::DELETE, "/orders/1").is_none());
    assert!(t.route(&Method::POST, "/orders/1").is_none());
}

#[test]
fn test_segment_count_mismatch_is_not_found() {
    let t = table(&[
        (Method::GET, "/orders", "list"),
        (Method::GET, "/orders/:id", "show"),
    ]);
    assert!(t.route(&Method::GET, "/orders/1/lines").is_none());
    assert!(t.route(&Method::GET, "/").is_none());
}

#[test]
fn test_root_route() {
    let t = table(&[(Method::GET, "/", "home")]);
    let m = t.route(&Method::GET, "/").unwrap();
    assert_eq!(*m.route.handler(), "home");
    assert!(m.params.is_empty());
}

#[test]
fn test_unsupported_method_is_rejected() {
    let mut t: RouteTable<()> = RouteTable::new();
    let err = t.register(Method::PATCH, "/orders/:id", ()).unwrap_err();
    assert_eq!(
        err,
        RouteError::UnsupportedMethod {
            method: "PATCH".into()
        }
    );
    assert!(t.is_empty());
}

#[test]
fn test_malformed_template_is_rejected() {
    let mut t: RouteTable<()> = RouteTable::new();
    let err = t.register(Method::GET, "/orders/{id", ()).unwrap_err();
    assert!(matches!(
        err,
        RouteError::Pattern(PatternError::UnbalancedBrace { .. })
    ));
    assert!(err.to_string().contains("/orders/{id"));
}

#[test]
fn test_route_options() {
    let mut t = RouteTable::new();
    t.register_with(
        Method::GET,
        "/login",
        RouteOptions::named("login").skip("session"),
        "login",
    )
    .unwrap();
    t.register(Method::GET, "/customers/:id", "customer").unwrap();

    let login = t.by_name("login").unwrap();
    assert!(login.skips("session"));
    assert!(!login.skips("csrf"));
    assert_eq!(login.label(), "login");

    let customer = t.route(&Method::GET, "/customers/7").unwrap().route;
    assert_eq!(customer.name(), None);
    assert_eq!(customer.label(), "/customers/:id");
    assert_eq!(
        t.describe(),
        vec!["GET /login [login]".to_string(), "GET /customers/:id".to_string()]
    );
}
