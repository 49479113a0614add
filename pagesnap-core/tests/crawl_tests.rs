// Tests for multi-seed crawl orchestration

use pagesnap_core::crawl::{CrawlOptions, execute_crawl, extract_url_path};
use pagesnap_crawler::config::{CaptureOptions, FilterOptions};
use pagesnap_crawler::testing::{MockRenderer, MockSite};
use pagesnap_crawler::{CrawlConfig, CrawlError, PageResult};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn options(seeds: &[&str], config: CrawlConfig) -> CrawlOptions {
    CrawlOptions {
        seeds: seeds.iter().map(|s| s.to_string()).collect(),
        config,
        show_progress: false,
    }
}

fn two_sites() -> MockSite {
    MockSite::new()
        .page(
            "https://one.test/start",
            &["https://one.test/a", "https://one.test/b"],
        )
        .page("https://one.test/a", &["https://one.test/start"])
        .page(
            "https://two.test/start",
            &["https://two.test/a", "https://one.test/a"],
        )
}

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
    assert_eq!(extract_url_path("http://example.com/api/v1/users"), "/api/v1/users");
}

#[test]
fn test_extract_url_path_with_query_and_fragment() {
    assert_eq!(extract_url_path("http://example.com/api?key=value#top"), "/api");
}

// ============================================================================
// Orchestration Tests
// ============================================================================

#[tokio::test]
async fn test_each_seed_gets_its_own_session() {
    let out = TempDir::new().unwrap();
    let renderer = MockRenderer::new(two_sites());
    let config = CrawlConfig::new().with_output_dir(out.path());

    let reports = execute_crawl(
        &renderer,
        options(&["https://one.test/start", "https://two.test/start"], config),
        None,
        None,
    )
    .await
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_success()));

    let log = renderer.log();
    assert_eq!(log.sessions_launched.load(Ordering::SeqCst), 2);
    assert_eq!(log.sessions_closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_seeds_keep_independent_visited_sets() {
    let out = TempDir::new().unwrap();
    let renderer = MockRenderer::new(two_sites());
    // One tab per seed finishes a tier before starting the next, so counts are exact
    let config = CrawlConfig::new()
        .with_tabs(1)
        .with_recursion(2)
        .with_output_dir(out.path());

    let reports = execute_crawl(
        &renderer,
        options(&["https://one.test/start", "https://two.test/start"], config),
        None,
        None,
    )
    .await
    .unwrap();

    // one.test/a is reachable from both seeds and is captured once per seed
    let navigations = renderer.log().navigations();
    let shared = navigations
        .iter()
        .filter(|u| u.as_str() == "https://one.test/a")
        .count();
    assert_eq!(shared, 2);

    let first: HashSet<&str> = reports[0].pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        first,
        HashSet::from([
            "https://one.test/start",
            "https://one.test/a",
            "https://one.test/b"
        ])
    );
    assert_eq!(reports[0].visited, 3);
    assert_eq!(reports[1].visited, 3);
}

#[tokio::test]
async fn test_shared_url_visited_once_per_seed_with_many_tabs() {
    let out = TempDir::new().unwrap();
    let renderer = MockRenderer::new(two_sites());
    let config = CrawlConfig::new()
        .with_tabs(4)
        .with_recursion(2)
        .with_output_dir(out.path());

    let reports = execute_crawl(
        &renderer,
        options(&["https://one.test/start", "https://two.test/start"], config),
        None,
        None,
    )
    .await
    .unwrap();

    assert!(reports.iter().all(|r| r.error.is_none()));
    for report in &reports {
        let shared = report
            .pages
            .iter()
            .filter(|p| p.url == "https://one.test/a")
            .count();
        assert_eq!(shared, 1, "{} captured one.test/a {} times", report.seed, shared);
    }
}

#[tokio::test]
async fn test_invalid_seed_does_not_stop_other_seeds() {
    let out = TempDir::new().unwrap();
    let renderer = MockRenderer::new(two_sites());
    let config = CrawlConfig::new()
        .with_capture(CaptureOptions {
            screenshot: true,
            ..CaptureOptions::default()
        })
        .with_output_dir(out.path());

    let reports = execute_crawl(
        &renderer,
        options(&["::not a url::", "https://one.test/start"], config),
        None,
        None,
    )
    .await
    .unwrap();

    assert!(reports[0].error.as_deref().unwrap().contains("Invalid URL"));
    assert!(reports[0].pages.is_empty());
    assert!(reports[1].is_success());
    assert_eq!(reports[1].artifact_count(), 1);
    assert!(out.path().join("one-test").join("start.png").is_file());
    // No browser is started for a seed that cannot be parsed
    assert_eq!(renderer.log().sessions_launched.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_pattern_fails_whole_run() {
    let renderer = MockRenderer::new(MockSite::new());
    let config = CrawlConfig::new().with_filter(FilterOptions {
        pattern: Some("(unclosed".to_string()),
        ..FilterOptions::default()
    });

    let result = execute_crawl(
        &renderer,
        options(&["https://one.test/start"], config),
        None,
        None,
    )
    .await;

    assert!(matches!(result, Err(CrawlError::InvalidPattern(_))));
    assert_eq!(renderer.log().sessions_launched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zero_tabs_rejected() {
    let renderer = MockRenderer::new(MockSite::new());
    let config = CrawlConfig::new().with_tabs(0);

    let result = execute_crawl(
        &renderer,
        options(&["https://one.test/start"], config),
        None,
        None,
    )
    .await;

    assert!(matches!(result, Err(CrawlError::Config(_))));
}

#[tokio::test]
async fn test_page_failures_recorded_in_seed_report() {
    let out = TempDir::new().unwrap();
    let renderer = MockRenderer::new(two_sites().failing("https://one.test/b"));
    let config = CrawlConfig::new()
        .with_tabs(1)
        .with_recursion(2)
        .with_failure_policy(pagesnap_crawler::FailurePolicy::Continue)
        .with_output_dir(out.path());

    let reports = execute_crawl(
        &renderer,
        options(&["https://one.test/start"], config),
        None,
        None,
    )
    .await
    .unwrap();

    let report = &reports[0];
    assert!(report.error.is_none());
    assert_eq!(report.failure_count(), 1);
    assert!(!report.is_success());
    assert_eq!(report.pages.len(), 3);
}

#[tokio::test]
async fn test_callbacks_see_every_dispatch() {
    let out = TempDir::new().unwrap();
    let renderer = MockRenderer::new(two_sites());
    let config = CrawlConfig::new()
        .with_tabs(2)
        .with_recursion(2)
        .with_output_dir(out.path());

    let urls = Arc::new(Mutex::new(Vec::new()));
    let pages = Arc::new(Mutex::new(Vec::new()));
    let urls_clone = urls.clone();
    let pages_clone = pages.clone();

    let reports = execute_crawl(
        &renderer,
        options(&["https://one.test/start", "https://two.test/start"], config),
        Some(Arc::new(move |url: String| {
            urls_clone.lock().unwrap().push(url);
        })),
        Some(Arc::new(move |page: PageResult| {
            pages_clone.lock().unwrap().push(page.url);
        })),
    )
    .await
    .unwrap();

    let total: usize = reports.iter().map(|r| r.pages.len()).sum();
    assert_eq!(urls.lock().unwrap().len(), total);
    assert_eq!(pages.lock().unwrap().len(), total);
}
