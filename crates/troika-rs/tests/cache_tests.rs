use std::sync::Arc;
use std::time::Duration;

use troika_rs::models::method::Method;
use troika_rs::models::response::RenderedResponse;
use troika_rs::services::cache::{cache_key, ResponseCache};
use troika_rs::services::route_table::DynamicRoute;
use troika_rs::utils::pattern::RoutePattern;

fn route(pattern: &str, ttl_seconds: u64) -> Arc<DynamicRoute> {
    Arc::new(DynamicRoute {
        pattern: RoutePattern::compile(pattern).unwrap(),
        handler_name: "handler".to_string(),
        ttl_seconds,
    })
}

fn response(body: &str) -> Arc<RenderedResponse> {
    Arc::new(RenderedResponse::json(200, body.as_bytes().to_vec()))
}

#[test]
fn test_lookup_returns_inserted_response() {
    let cache = ResponseCache::new();
    let key = cache_key(Method::Get, "/users/1");
    cache.insert(key.clone(), response("{\"id\":1}"), route("/users/{id}", 60));

    let got = cache.lookup(&key).unwrap();
    assert_eq!(got.body, b"{\"id\":1}");
}

#[test]
fn test_absent_key_is_a_miss() {
    let cache = ResponseCache::new();
    assert!(cache.lookup(&cache_key(Method::Get, "/missing")).is_none());
}

#[test]
fn test_method_is_part_of_the_key() {
    let cache = ResponseCache::new();
    cache.insert(
        cache_key(Method::Get, "/thing"),
        response("get"),
        route("/thing", 60),
    );
    assert!(cache.lookup(&cache_key(Method::Post, "/thing")).is_none());
}

#[test]
fn test_trailing_slash_is_a_different_key() {
    let cache = ResponseCache::new();
    cache.insert(
        cache_key(Method::Get, "/a"),
        response("bare"),
        route("/a", 60),
    );
    assert!(cache.lookup(&cache_key(Method::Get, "/a/")).is_none());
}

#[test]
fn test_entry_expires_after_ttl() {
    let cache = ResponseCache::new();
    let key = cache_key(Method::Get, "/short/1");
    cache.insert(key.clone(), response("x"), route("/short/{id}", 1));

    assert!(cache.lookup(&key).is_some());
    std::thread::sleep(Duration::from_millis(1200));
    assert!(cache.lookup(&key).is_none());
    // The stale entry was removed, not just hidden.
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_clear_empties_and_lookup_misses_afterwards() {
    let cache = ResponseCache::new();
    let key = cache_key(Method::Get, "/users/1");
    cache.insert(key.clone(), response("{}"), route("/users/{id}", 60));

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.lookup(&key).is_none());
}

#[test]
fn test_last_writer_wins() {
    let cache = ResponseCache::new();
    let key = cache_key(Method::Get, "/users/1");
    let users = route("/users/{id}", 60);
    cache.insert(key.clone(), response("first"), users.clone());
    cache.insert(key.clone(), response("second"), users);

    assert_eq!(cache.lookup(&key).unwrap().body, b"second");
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_capacity_bound_evicts_oldest_entry() {
    let cache = ResponseCache::with_capacity(2);
    let r = route("/n/{id}", 60);

    cache.insert(cache_key(Method::Get, "/n/1"), response("1"), r.clone());
    std::thread::sleep(Duration::from_millis(5));
    cache.insert(cache_key(Method::Get, "/n/2"), response("2"), r.clone());
    std::thread::sleep(Duration::from_millis(5));
    cache.insert(cache_key(Method::Get, "/n/3"), response("3"), r);

    assert_eq!(cache.len(), 2);
    assert!(cache.lookup(&cache_key(Method::Get, "/n/1")).is_none());
    assert!(cache.lookup(&cache_key(Method::Get, "/n/2")).is_some());
    assert!(cache.lookup(&cache_key(Method::Get, "/n/3")).is_some());
}

#[test]
fn test_concurrent_inserts_and_lookups() {
    use std::thread;

    let cache = Arc::new(ResponseCache::new());
    let r = route("/c/{id}", 60);

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let cache = cache.clone();
            let r = r.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    let key = cache_key(Method::Get, &format!("/c/{}-{}", w, i));
                    cache.insert(key, response("{}"), r.clone());
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    // May hit or miss depending on interleaving; must not tear.
                    let _ = cache.lookup(&cache_key(Method::Get, &format!("/c/0-{}", i)));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
    assert_eq!(cache.len(), 1000);
}
