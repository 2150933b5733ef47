//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full sweeps
//! through the HTTP backend end-to-end.

use class_sweep::config::{Config, UserAgentConfig};
use class_sweep::crawler::{CrawlSettings, Coordinator};
use class_sweep::output::write_unused_file;
use class_sweep::render::HttpRenderer;
use class_sweep::{find_unused, run_sweep, CrawlOutcome, SweepError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn renderer() -> Arc<HttpRenderer> {
    Arc::new(
        HttpRenderer::new(&UserAgentConfig::default(), Duration::ZERO)
            .expect("Failed to build HTTP renderer"),
    )
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

fn classes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn settings(page_limit: usize) -> CrawlSettings {
    CrawlSettings {
        page_limit,
        workers: 2,
        idle_timeout: Duration::from_secs(5),
        ..CrawlSettings::default()
    }
}

/// Mounts `/` linking to `/about`, with `btn` on the root and
/// `btn btn-primary` on the about page
async fn mount_two_page_site(mock_server: &MockServer, about_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<div class="btn">Home</div>
               <a href="/about">About</a>"#,
        ))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<button class="btn btn-primary">Go</button>
               <a href="/">Home</a>"#,
        ))
        .expect(about_hits)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_two_page_site_reports_unused_class() {
    let mock_server = MockServer::start().await;
    mount_two_page_site(&mock_server, 1).await;

    let unused = find_unused(
        renderer(),
        &mock_server.uri(),
        10,
        &classes(&["btn", "btn-primary", "unused-one"]),
        &CancellationToken::new(),
    )
    .await
    .expect("Sweep failed");

    assert_eq!(unused, classes(&["unused-one"]));
}

#[tokio::test]
async fn test_limit_one_visits_only_root() {
    let mock_server = MockServer::start().await;
    mount_two_page_site(&mock_server, 0).await;

    let unused = find_unused(
        renderer(),
        &mock_server.uri(),
        1,
        &classes(&["btn", "btn-primary", "unused-one"]),
        &CancellationToken::new(),
    )
    .await
    .expect("Sweep failed");

    assert_eq!(unused, classes(&["btn-primary", "unused-one"]));
}

#[tokio::test]
async fn test_failed_page_hides_its_children() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<nav class="home"><a href="/broken">Broken</a> <a href="/ok">Ok</a></nav>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(
            r#"<a href="/child" class="shared">child</a>"#,
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/child"))
        .respond_with(html(r#"<p class="child">never seen</p>"#))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html(r#"<p class="ok shared">fine</p>"#))
        .mount(&mock_server)
        .await;

    let mut coordinator =
        Coordinator::new(renderer(), &mock_server.uri(), settings(0)).expect("Bad root URL");
    let report = coordinator
        .run(&CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.statistics.pages_visited, 2);
    assert_eq!(report.statistics.pages_failed, 1);
    assert!(report.usage.is_used("home"));
    assert!(report.usage.is_used("ok"));
    assert!(report.usage.is_used("shared"));
    assert!(!report.usage.is_used("child"));
}

#[tokio::test]
async fn test_non_html_page_is_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a class="home" href="/data.json">data</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"class": "json"}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut coordinator =
        Coordinator::new(renderer(), &mock_server.uri(), settings(0)).expect("Bad root URL");
    let report = coordinator
        .run(&CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.statistics.pages_visited, 1);
    assert_eq!(report.statistics.pages_failed, 1);
    assert_eq!(report.usage.len(), 1);
}

#[tokio::test]
async fn test_offsite_links_are_ignored() {
    let mock_server = MockServer::start().await;
    let port = url::Url::parse(&mock_server.uri())
        .expect("Failed to parse base URL")
        .port()
        .expect("Mock server has a port");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(
            r##"<main class="root">
               <a href="https://other.invalid/page">elsewhere</a>
               <a href="http://localhost:{}/same-port-other-host">other host</a>
               <a href="mailto:team@example.com">mail</a>
               <a href="javascript:void(0)">js</a>
               <a href="#top">top</a>
               </main>"##,
            port
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut coordinator =
        Coordinator::new(renderer(), &mock_server.uri(), settings(0)).expect("Bad root URL");
    let report = coordinator
        .run(&CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.statistics.pages_visited, 1);
    assert_eq!(report.statistics.offsite_ignored, 2);
    assert_eq!(report.statistics.links_admitted, 0);
}

#[tokio::test]
async fn test_redirect_to_other_host_is_not_counted() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<div class="home"><a href="/go">Go</a></div>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/foreign", other_server.uri()).as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/foreign"))
        .respond_with(html(r#"<p class="foreign"><a href="/deeper">deeper</a></p>"#))
        .mount(&other_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(html(r#"<p class="deeper">deeper</p>"#))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut coordinator =
        Coordinator::new(renderer(), &mock_server.uri(), settings(0)).expect("Bad root URL");
    let report = coordinator
        .run(&CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.usage.get("home"), 1);
    assert_eq!(report.usage.get("foreign"), 0);
    assert_eq!(report.statistics.pages_visited, 1);
    assert_eq!(report.statistics.offsite_ignored, 1);
}

#[tokio::test]
async fn test_bad_root_url_fails_setup() {
    let result = find_unused(
        renderer(),
        "ftp://example.com/",
        0,
        &classes(&["btn"]),
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(SweepError::Setup(_))));
}

#[tokio::test]
async fn test_configured_sweep_writes_unused_file() {
    let mock_server = MockServer::start().await;
    mount_two_page_site(&mock_server, 1).await;

    let mut config = Config::default();
    config.crawler.root_url = Some(mock_server.uri());
    config.crawler.max_workers = 3;
    config.backend.request_delay = 0;

    let result = run_sweep(
        &config,
        renderer(),
        &classes(&["btn", "card", "btn-primary", "unused-one"]),
        &CancellationToken::new(),
    )
    .await
    .expect("Sweep failed");

    assert_eq!(result.reference_count, 4);
    assert_eq!(result.unused, classes(&["card", "unused-one"]));
    assert_eq!(result.report.statistics.pages_visited, 2);
    assert_eq!(result.report.usage.get("btn"), 2);

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let written = write_unused_file(&dir.path().join("unused.txt"), &result.unused)
        .expect("Failed to write unused file");
    assert_eq!(
        std::fs::read_to_string(written).expect("Failed to read unused file"),
        ".card\n.unused-one\n"
    );
}
