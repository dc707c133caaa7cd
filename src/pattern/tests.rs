use super::{compile, split_segments, PatternError, RoutePattern, Segment};

#[test]
fn test_root_path() {
    let pattern = compile("/").unwrap();
    assert_eq!(pattern.segment_count(), 0);
    assert!(pattern.is_literal());
    assert!(pattern.match_path("/").unwrap().is_empty());
    assert!(pattern.match_path("/orders").is_none());
}

#[test]
fn test_colon_and_brace_syntax_are_equivalent() {
    let colon = compile("/orders/:id").unwrap();
    let brace = compile("/orders/{id}").unwrap();
    assert_eq!(colon.segments(), brace.segments());
    assert_eq!(colon.param_names().len(), 1);
    assert_eq!(brace.match_path("/orders/42").unwrap().get("id"), Some("42"));
    assert_eq!(colon.match_path("/orders/42").unwrap().get("id"), Some("42"));
}

#[test]
fn test_nested_params() {
    let pattern = compile("/customers/{id}/orders/:order_id").unwrap();
    let params = pattern.match_path("/customers/7/orders/99").unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("id"), Some("7"));
    assert_eq!(params.get("order_id"), Some("99"));
    assert_eq!(params.get("missing"), None);
}

#[test]
fn test_segment_count_must_match() {
    let pattern = compile("/orders/:id").unwrap();
    assert!(pattern.match_path("/orders").is_none());
    assert!(pattern.match_path("/orders/1/items").is_none());
}

#[test]
fn test_literals_are_case_sensitive() {
    let pattern = compile("/Orders").unwrap();
    assert!(pattern.match_path("/Orders").is_some());
    assert!(pattern.match_path("/orders").is_none());
}

#[test]
fn test_trailing_slash_is_significant() {
    let bare = compile("/orders").unwrap();
    let slashed = compile("/orders/").unwrap();
    assert_eq!(bare.segment_count(), 1);
    assert_eq!(slashed.segment_count(), 2);
    assert!(bare.match_path("/orders/").is_none());
    assert!(slashed.match_path("/orders").is_none());
    assert!(slashed.match_path("/orders/").is_some());
}

#[test]
fn test_params_never_match_empty_segments() {
    let pattern = compile("/orders/:id").unwrap();
    assert!(pattern.match_path("/orders/").is_none());
    let double = compile("/a/:b/c").unwrap();
    assert!(double.match_path("/a//c").is_none());
}

#[test]
fn test_captured_values_are_percent_decoded() {
    let pattern = compile("/customers/:name").unwrap();
    let params = pattern.match_path("/customers/J%C3%BCrgen%20M").unwrap();
    assert_eq!(params.get("name"), Some("Jürgen M"));
    // plus is literal in paths
    let params = pattern.match_path("/customers/a+b").unwrap();
    assert_eq!(params.get("name"), Some("a+b"));
    // undecodable bytes are kept as sent
    let params = pattern.match_path("/customers/%FF").unwrap();
    assert_eq!(params.get("name"), Some("%FF"));
}

#[test]
fn test_relative_path_never_matches() {
    let pattern = compile("/orders").unwrap();
    assert!(pattern.match_path("orders").is_none());
}

#[test]
fn test_split_segments() {
    assert_eq!(split_segments("/").count(), 0);
    assert_eq!(split_segments("/a/b").collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(split_segments("/a/").collect::<Vec<_>>(), vec!["a", ""]);
    assert_eq!(split_segments("/a//b").collect::<Vec<_>>(), vec!["a", "", "b"]);
}

#[test]
fn test_malformed_templates_are_rejected() {
    assert!(matches!(
        compile("orders"),
        Err(PatternError::MissingLeadingSlash { .. })
    ));
    assert!(matches!(
        compile("/orders/{id"),
        Err(PatternError::UnbalancedBrace { .. })
    ));
    assert!(matches!(
        compile("/orders/id}"),
        Err(PatternError::UnbalancedBrace { .. })
    ));
    assert!(matches!(
        compile("/orders/}id{"),
        Err(PatternError::UnbalancedBrace { .. })
    ));
    assert!(matches!(
        compile("/orders/{}"),
        Err(PatternError::EmptyParameterName { .. })
    ));
    assert!(matches!(
        compile("/orders/:"),
        Err(PatternError::EmptyParameterName { .. })
    ));
    assert!(matches!(
        compile("/orders/v{id}"),
        Err(PatternError::MixedSegment { .. })
    ));
    assert!(matches!(
        compile("/orders/:i-d"),
        Err(PatternError::InvalidParameterName { .. })
    ));
    assert!(matches!(
        compile("/a/:id/b/{id}"),
        Err(PatternError::DuplicateParameter { .. })
    ));
}

#[test]
fn test_error_messages_name_the_template() {
    let err = compile("/orders/{id").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("/orders/{id"));
    assert!(msg.contains("unbalanced"));
}

#[test]
fn test_compile_is_idempotent() {
    let first = compile("/orders/:id/lines/{line}").unwrap();
    let second = compile("/orders/:id/lines/{line}").unwrap();
    assert_eq!(first, second);
    for path in [
        "/orders/1/lines/2",
        "/orders/1/lines",
        "/orders//lines/2",
        "/orders/x/lines/y/",
        "/",
    ] {
        assert_eq!(first.match_path(path), second.match_path(path), "{path}");
    }
}

#[test]
fn test_from_str_and_display() {
    let pattern: RoutePattern = "/customers/{id}".parse().unwrap();
    assert_eq!(pattern.to_string(), "/customers/{id}");
    assert_eq!(
        pattern.segments(),
        &[
            Segment::Literal("customers".into()),
            Segment::Param("id".into())
        ]
    );
}

#[test]
fn test_params_serialize_as_map() {
    let pattern = compile("/a/:x/:y").unwrap();
    let params = pattern.match_path("/a/1/2").unwrap();
    let value = serde_json::to_value(&params).unwrap();
    assert_eq!(value, serde_json::json!({"x": "1", "y": "2"}));
    assert_eq!(params.to_map().len(), 2);
}
