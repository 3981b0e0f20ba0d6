use troika_rs::utils::pattern::{PatternError, RoutePattern, Segment};

#[test]
fn test_static_pattern_compilation() {
    let pattern = RoutePattern::compile("/api/users").unwrap();
    assert_eq!(pattern.raw(), "/api/users");
    assert!(!pattern.has_params());
    assert_eq!(
        pattern.segments(),
        &[
            Segment::Literal("api".to_string()),
            Segment::Literal("users".to_string())
        ]
    );
}

#[test]
fn test_single_parameter_extraction() {
    let pattern = RoutePattern::compile("/users/{id}").unwrap();
    assert_eq!(pattern.param_names(), &["id"]);

    let params = pattern.capture("/users/123").unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params.get("id"), Some("123"));
}

#[test]
fn test_multiple_parameters_preserve_pattern_order() {
    let pattern = RoutePattern::compile("/api/orders/{order_id}/items/{item_id}").unwrap();
    assert_eq!(pattern.param_names(), &["order_id", "item_id"]);

    let params = pattern.capture("/api/orders/55/items/7").unwrap();
    let pairs: Vec<(&str, &str)> = params.iter().collect();
    assert_eq!(pairs, vec![("order_id", "55"), ("item_id", "7")]);
}

#[test]
fn test_adjacent_parameters() {
    let pattern = RoutePattern::compile("/{a}/{b}").unwrap();
    let params = pattern.capture("/x/y").unwrap();
    let pairs: Vec<(&str, &str)> = params.iter().collect();
    assert_eq!(pairs, vec![("a", "x"), ("b", "y")]);
}

#[test]
fn test_match_is_anchored_at_both_ends() {
    let pattern = RoutePattern::compile("/users/{id}").unwrap();
    assert!(pattern.capture("/users/1/extra").is_none());
    assert!(pattern.capture("/prefix/users/1").is_none());
    assert!(pattern.capture("/users").is_none());
}

#[test]
fn test_parameter_never_matches_empty_segment() {
    let pattern = RoutePattern::compile("/users/{id}").unwrap();
    assert!(pattern.capture("/users/").is_none());
}

#[test]
fn test_parameter_values_are_not_decoded() {
    let pattern = RoutePattern::compile("/files/{name}").unwrap();
    let params = pattern.capture("/files/report%202024.txt").unwrap();
    assert_eq!(params.get("name"), Some("report%202024.txt"));
}

#[test]
fn test_literal_segments_escape_regex_metacharacters() {
    let pattern = RoutePattern::compile("/v1.2/status").unwrap();
    assert!(pattern.capture("/v1.2/status").is_some());
    assert!(pattern.capture("/v1x2/status").is_none());

    let pattern = RoutePattern::compile("/a+b/{id}").unwrap();
    assert!(pattern.capture("/a+b/1").is_some());
    assert!(pattern.capture("/aab/1").is_none());
}

#[test]
fn test_trailing_slash_patterns_are_distinct() {
    let bare = RoutePattern::compile("/a").unwrap();
    let slashed = RoutePattern::compile("/a/").unwrap();

    assert!(bare.capture("/a").is_some());
    assert!(bare.capture("/a/").is_none());
    assert!(slashed.capture("/a/").is_some());
    assert!(slashed.capture("/a").is_none());
}

#[test]
fn test_underscore_and_digits_in_parameter_names() {
    let pattern = RoutePattern::compile("/posts/{post_id_2}").unwrap();
    let params = pattern.capture("/posts/9").unwrap();
    assert_eq!(params.get("post_id_2"), Some("9"));
}

#[test]
fn test_empty_segment_rejected() {
    let err = RoutePattern::compile("/a//b").unwrap_err();
    assert!(matches!(err, PatternError::EmptySegment { .. }));
}

#[test]
fn test_missing_leading_slash_rejected() {
    let err = RoutePattern::compile("users/{id}").unwrap_err();
    assert!(matches!(err, PatternError::MissingLeadingSlash { .. }));
}

#[test]
fn test_unbalanced_braces_rejected() {
    for bad in ["/users/{id", "/users/id}", "/users/{id}x", "/x{y}z/w"] {
        let err = RoutePattern::compile(bad).unwrap_err();
        assert!(
            matches!(err, PatternError::UnbalancedBraces { .. }),
            "pattern {:?} produced {:?}",
            bad,
            err
        );
    }
}

#[test]
fn test_empty_parameter_name_rejected() {
    let err = RoutePattern::compile("/users/{}").unwrap_err();
    assert!(matches!(err, PatternError::InvalidParameterName { .. }));
}

#[test]
fn test_invalid_parameter_characters_rejected() {
    let err = RoutePattern::compile("/users/{user-id}").unwrap_err();
    assert!(matches!(err, PatternError::InvalidParameterName { .. }));
}

#[test]
fn test_duplicate_parameter_names_rejected() {
    let err = RoutePattern::compile("/pair/{x}/{x}").unwrap_err();
    assert_eq!(
        err,
        PatternError::DuplicateParameterName {
            name: "x".to_string(),
            pattern: "/pair/{x}/{x}".to_string()
        }
    );
}
