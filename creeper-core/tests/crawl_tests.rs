// Tests for crawl functionality

use creeper_core::crawl::{
    CrawlOptions, CrawlResultCallback, DEFAULT_USER_AGENT, ensure_user_agent, execute_crawl,
    extract_url_path, parse_headers,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("http://example.com/"), "/");
}

#[test]
fn test_extract_url_path_empty_path() {
    assert_eq!(extract_url_path("http://example.com"), "/");
}

#[test]
fn test_extract_url_path_nested() {
    assert_eq!(
        extract_url_path("http://example.com/api/v1/users"),
        "/api/v1/users"
    );
}

#[test]
fn test_extract_url_path_with_query_and_fragment() {
    assert_eq!(extract_url_path("http://example.com/api?key=value#top"), "/api");
}

#[test]
fn test_extract_url_path_invalid_url() {
    let url = "not a valid url";
    // Should return original string for invalid URLs
    assert_eq!(extract_url_path(url), url);
}

// ============================================================================
// Header Parsing Tests
// ============================================================================

#[test]
fn test_parse_headers_pairs() {
    let headers = parse_headers("Authorization=Bearer abc,X-Trace=1");
    assert_eq!(headers.len(), 2);
    assert_eq!(headers["Authorization"], "Bearer abc");
    assert_eq!(headers["X-Trace"], "1");
}

#[test]
fn test_parse_headers_splits_on_first_equals() {
    let headers = parse_headers("Cookie=session=abc");
    assert_eq!(headers["Cookie"], "session=abc");
}

#[test]
fn test_parse_headers_ignores_malformed_entries() {
    let headers = parse_headers("novalue, =empty-key ,Accept = text/html,");
    assert_eq!(headers.len(), 1);
    assert_eq!(headers["Accept"], "text/html");
}

#[test]
fn test_parse_headers_empty() {
    assert!(parse_headers("").is_empty());
}

#[test]
fn test_user_agent_injected_when_missing() {
    let mut headers = HashMap::new();
    ensure_user_agent(&mut headers);
    assert_eq!(headers["User-Agent"], DEFAULT_USER_AGENT);
}

#[test]
fn test_user_agent_kept_when_present() {
    let mut headers = parse_headers("user-agent=custom/1.0");
    ensure_user_agent(&mut headers);
    assert_eq!(headers.len(), 1);
    assert_eq!(headers["user-agent"], "custom/1.0");
}

// ============================================================================
// Crawl Execution Tests
// ============================================================================

#[tokio::test]
async fn test_execute_crawl_collects_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<a href="/docs">docs</a><img src="/logo.png">"#,
                    "text/html",
                ),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>docs</p>", "text/html"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = seen.clone();
    let callback: CrawlResultCallback = Arc::new(move |_result| {
        seen_clone.fetch_add(1, Ordering::SeqCst);
    });

    let options = CrawlOptions {
        url: mock_server.uri(),
        workers: 2,
        requests_per_second: 100.0,
        timeout: Duration::from_secs(10),
        ..CrawlOptions::default()
    };

    let results = execute_crawl(options, Some(callback)).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert!(results.iter().any(|r| r.url.ends_with("/logo.png") && r.status == 404));
    assert!(results.iter().all(|r| r.depth <= 1));
}

#[tokio::test]
async fn test_execute_crawl_sends_custom_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        url: mock_server.uri(),
        headers: parse_headers("X-Api-Key=secret"),
        requests_per_second: 100.0,
        ..CrawlOptions::default()
    };

    let results = execute_crawl(options, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, 200);
}

#[tokio::test]
async fn test_execute_crawl_invalid_url() {
    let options = CrawlOptions {
        url: "not a url".to_string(),
        ..CrawlOptions::default()
    };

    let result = execute_crawl(options, None).await;
    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("not a url"));
}
