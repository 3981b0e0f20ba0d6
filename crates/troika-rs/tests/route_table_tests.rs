use troika_rs::models::method::Method;
use troika_rs::models::response::RenderedResponse;
use troika_rs::services::route_table::{RegistrationError, RouteTable};

fn plain(body: &str) -> RenderedResponse {
    RenderedResponse::new(200, "text/plain", body.as_bytes().to_vec())
}

#[test]
fn test_static_lookup_is_exact_match() {
    let table = RouteTable::new();
    table.register_static(Method::Get, "/ping", plain("pong")).unwrap();

    assert!(table.lookup_static(Method::Get, "/ping").is_some());
    assert!(table.lookup_static(Method::Get, "/ping/").is_none());
    assert!(table.lookup_static(Method::Post, "/ping").is_none());
    assert!(table.lookup_static(Method::Get, "/PING").is_none());
}

#[test]
fn test_duplicate_static_registration_is_rejected_and_original_kept() {
    let table = RouteTable::new();
    table.register_static(Method::Get, "/ping", plain("pong")).unwrap();

    let err = table
        .register_static(Method::Get, "/ping", plain("other"))
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateStatic { .. }));

    let entry = table.lookup_static(Method::Get, "/ping").unwrap();
    assert_eq!(entry.body, b"pong");
}

#[test]
fn test_same_path_under_different_methods_is_allowed() {
    let table = RouteTable::new();
    table.register_static(Method::Get, "/thing", plain("get")).unwrap();
    table.register_static(Method::Post, "/thing", plain("post")).unwrap();

    assert_eq!(
        table.lookup_static(Method::Get, "/thing").unwrap().body,
        b"get"
    );
    assert_eq!(
        table.lookup_static(Method::Post, "/thing").unwrap().body,
        b"post"
    );
}

#[test]
fn test_dynamic_match_extracts_parameters() {
    let table = RouteTable::new();
    table
        .register_dynamic(Method::Get, "/users/{id}", "get_user", 60)
        .unwrap();

    let (route, params) = table.match_dynamic(Method::Get, "/users/42").unwrap();
    assert_eq!(route.handler_name, "get_user");
    assert_eq!(route.ttl_seconds, 60);
    assert!(route.cacheable());
    assert_eq!(params.get("id"), Some("42"));
}

#[test]
fn test_dynamic_match_is_scoped_by_method() {
    let table = RouteTable::new();
    table
        .register_dynamic(Method::Post, "/users/{id}", "update_user", 0)
        .unwrap();

    assert!(table.match_dynamic(Method::Get, "/users/42").is_none());
    assert!(table.match_dynamic(Method::Post, "/users/42").is_some());
}

#[test]
fn test_registration_order_is_the_tiebreaker() {
    let table = RouteTable::new();
    table
        .register_dynamic(Method::Get, "/files/{name}", "by_name", 0)
        .unwrap();
    table
        .register_dynamic(Method::Get, "/{section}/{name}", "by_section", 0)
        .unwrap();

    // Both patterns accept "/files/report"; the first registered wins.
    let (route, _) = table.match_dynamic(Method::Get, "/files/report").unwrap();
    assert_eq!(route.handler_name, "by_name");

    // Paths only the second pattern accepts still reach it.
    let (route, _) = table.match_dynamic(Method::Get, "/docs/intro").unwrap();
    assert_eq!(route.handler_name, "by_section");
}

#[test]
fn test_more_specific_pattern_registered_later_does_not_win() {
    let table = RouteTable::new();
    table
        .register_dynamic(Method::Get, "/{a}/{b}", "generic", 0)
        .unwrap();
    table
        .register_dynamic(Method::Get, "/users/{id}", "specific", 0)
        .unwrap();

    let (route, _) = table.match_dynamic(Method::Get, "/users/42").unwrap();
    assert_eq!(route.handler_name, "generic");
}

#[test]
fn test_malformed_pattern_is_rejected_up_front() {
    let table = RouteTable::new();
    let err = table
        .register_dynamic(Method::Get, "/a//b", "broken", 0)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Pattern(_)));
    assert_eq!(table.dynamic_len(), 0);
}

#[test]
fn test_duplicate_dynamic_pattern_is_rejected() {
    let table = RouteTable::new();
    table
        .register_dynamic(Method::Get, "/users/{id}", "first", 30)
        .unwrap();
    let err = table
        .register_dynamic(Method::Get, "/users/{id}", "second", 99)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicatePattern { .. }));

    // Policy of the original registration is unchanged.
    let (route, _) = table.match_dynamic(Method::Get, "/users/1").unwrap();
    assert_eq!(route.handler_name, "first");
    assert_eq!(route.ttl_seconds, 30);
}

#[test]
fn test_registration_after_lookups_becomes_visible() {
    let table = RouteTable::new();
    assert!(table.match_dynamic(Method::Get, "/late/1").is_none());

    table
        .register_dynamic(Method::Get, "/late/{id}", "late", 0)
        .unwrap();
    assert!(table.match_dynamic(Method::Get, "/late/1").is_some());
}

#[test]
fn test_population_counts() {
    let table = RouteTable::new();
    table.register_static(Method::Get, "/a", plain("a")).unwrap();
    table.register_static(Method::Get, "/b", plain("b")).unwrap();
    table
        .register_dynamic(Method::Get, "/c/{id}", "c", 0)
        .unwrap();
    table
        .register_dynamic(Method::Post, "/d/{id}", "d", 0)
        .unwrap();

    assert_eq!(table.static_len(), 2);
    assert_eq!(table.dynamic_len(), 2);
}

#[test]
fn test_concurrent_reads_during_registration() {
    use std::sync::Arc;
    use std::thread;

    let table = Arc::new(RouteTable::new());
    table
        .register_dynamic(Method::Get, "/seed/{id}", "seed", 0)
        .unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let table = table.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    // The seeded route must stay visible through every swap.
                    assert!(table.match_dynamic(Method::Get, "/seed/1").is_some());
                }
            })
        })
        .collect();

    for i in 0..50 {
        let pattern = format!("/gen{}/{{id}}", i);
        table
            .register_dynamic(Method::Get, &pattern, "gen", 0)
            .unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(table.dynamic_len(), 51);
}
