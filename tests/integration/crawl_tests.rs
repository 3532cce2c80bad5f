//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use sumi_scrape::config::{load_field_rules, Config, CrawlRequest};
use sumi_scrape::crawler::{crawl, Coordinator, CrawlOutcome, FieldValue, Fetcher};
use sumi_scrape::output::write_output;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server, with every
/// pause disabled
fn create_test_config(seed: &str) -> Config {
    let mut config = Config::default();
    config.crawl.seed = Some(seed.to_string());
    config.crawl.delay = 0.0;
    config.crawl.politeness_jitter = 0.0;
    config.fetch.timeout = 5;
    config.fetch.backoff_base = 0.0;
    config.fetch.backoff_jitter = 0.0;
    config
}

async fn run(config: &Config) -> CrawlOutcome {
    let request = CrawlRequest::from_config(config).expect("Invalid test config");
    let fetcher =
        Fetcher::with_rng(&config.fetch, StdRng::seed_from_u64(42)).expect("Client build failed");
    let mut coordinator = Coordinator::with_fetcher(request, fetcher, StdRng::seed_from_u64(42));
    coordinator.run().await
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn urls(outcome: &CrawlOutcome) -> Vec<String> {
    outcome.records.iter().map(|r| r.url.clone()).collect()
}

#[tokio::test]
async fn test_single_page_default_fields() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title> Home </title></head><body>
            <h1>Welcome</h1>
            <a href="/a">A</a>
            <a href="/b">B</a>
            <a>No link</a>
        </body></html>"#,
    )
    .await;

    let config = create_test_config(&format!("{}/", base_url));
    let outcome = run(&config).await;

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.url, format!("{}/", base_url));
    assert_eq!(record.get("title").and_then(FieldValue::as_text), Some("Home"));
    assert_eq!(record.get("h1").and_then(FieldValue::as_text), Some("Welcome"));
    assert_eq!(
        record.get("links_on_page").and_then(FieldValue::as_list),
        Some(&["/a".to_string(), "/b".to_string()][..])
    );

    assert_eq!(outcome.stats.pages_attempted, 1);
    assert_eq!(outcome.stats.pages_scraped, 1);
    assert!(!outcome.stats.interrupted);
}

#[tokio::test]
async fn test_pagination_respects_max_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<title>Home</title><h1>Hi</h1><a href="/next">Next</a>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/next",
        r#"<title>Second</title><a href="/third">Next</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/third"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Third</title>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawl.pagination_css = Some("a".to_string());
    config.crawl.max_pages = 2;

    let outcome = run(&config).await;

    assert_eq!(
        urls(&outcome),
        vec![format!("{}/", base_url), format!("{}/next", base_url)]
    );
    assert_eq!(
        outcome.records[0].get("h1").and_then(FieldValue::as_text),
        Some("Hi")
    );
    assert!(outcome.records[1].get("h1").unwrap().is_missing());
}

#[tokio::test]
async fn test_pagination_follows_chain_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/list",
        r#"<title>Page 1</title><a class="next" href="?page=2">Next</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<title>Page 2</title><a class="next" href="?page=3">Next</a>"#),
        )
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Page 3</title>"))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/list", base_url));
    config.crawl.pagination_css = Some("a.next".to_string());

    let outcome = run(&config).await;

    let titles: Vec<&str> = outcome
        .records
        .iter()
        .filter_map(|r| r.get("title").and_then(FieldValue::as_text))
        .collect();
    assert_eq!(titles, vec!["Page 1", "Page 2", "Page 3"]);
}

#[tokio::test]
async fn test_crawl_mode_stays_on_origin_and_matches_pattern() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<title>Index</title>
           <a href="/product/1">One</a>
           <a href="/blog/post">Blog</a>
           <a href="https://example.org/product/9">Elsewhere</a>
           <a href="mailto:shop@example.com">Mail</a>
           <a href="/product/2#reviews">Two</a>"#,
    )
    .await;
    mount_page(&mock_server, "/product/1", "<title>Product 1</title>").await;
    mount_page(&mock_server, "/product/2", "<title>Product 2</title>").await;
    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawl.crawl = true;
    config.crawl.link_pattern = Some("/product/".to_string());

    let outcome = run(&config).await;

    assert_eq!(
        urls(&outcome),
        vec![
            format!("{}/", base_url),
            format!("{}/product/1", base_url),
            format!("{}/product/2#reviews", base_url),
        ]
    );
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/a">A</a><a href="/b">B</a><a href="/a">A again</a><a href="/">Home</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/b">B</a><a href="/">Home</a>"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/a">A</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawl.crawl = true;

    let outcome = run(&config).await;

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.stats.pages_attempted, 3);
    assert!(outcome.stats.duplicates_skipped > 0);
}

#[tokio::test]
async fn test_failed_page_is_skipped_and_counts_against_budget() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/broken">Broken</a><a href="/ok">Ok</a><a href="/later">Later</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/ok", "<title>Ok</title>").await;
    Mock::given(method("GET"))
        .and(path("/later"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawl.crawl = true;
    config.crawl.max_pages = 3;
    config.fetch.max_retries = 2;

    let outcome = run(&config).await;

    assert_eq!(
        urls(&outcome),
        vec![format!("{}/", base_url), format!("{}/ok", base_url)]
    );
    assert_eq!(outcome.stats.pages_attempted, 3);
    assert_eq!(outcome.stats.pages_failed, 1);
    assert_eq!(outcome.stats.pages_scraped, 2);
}

#[tokio::test]
async fn test_rate_limited_page_recovers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", "<title>Finally</title>").await;

    let config = create_test_config(&format!("{}/", base_url));
    let outcome = run(&config).await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(
        outcome.records[0].get("title").and_then(FieldValue::as_text),
        Some("Finally")
    );
}

#[tokio::test]
async fn test_seed_failure_yields_no_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/missing", base_url));
    config.fetch.max_retries = 1;

    let outcome = run(&config).await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_custom_fields_keep_declared_order() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<div class="price">€ 12</div>
           <span class="tag">new</span><span class="tag">sale</span>
           <img src="/hero.png" alt="Hero">"#,
    )
    .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.fields = load_field_rules(
        r#"{
            "price": {"css": ".price"},
            "tags": {"css": ".tag", "all": true},
            "image": {"css": "img", "attr": "src"},
            "subtitle": {"css": "h2"}
        }"#,
    )
    .unwrap();

    let outcome = run(&config).await;
    let json = serde_json::to_string(&outcome.records[0]).unwrap();
    assert_eq!(
        json,
        format!(
            r#"{{"url":"{}/","price":"€ 12","tags":["new","sale"],"image":"/hero.png","subtitle":null}}"#,
            base_url
        )
    );
}

#[tokio::test]
async fn test_cancelled_crawl_keeps_nothing_queued() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url));
    let request = CrawlRequest::from_config(&config).unwrap();
    let mut coordinator = Coordinator::new(request, &config.fetch).unwrap();
    coordinator.cancellation_token().cancel();

    let outcome = coordinator.run().await;
    assert!(outcome.records.is_empty());
    assert!(outcome.stats.interrupted);
}

#[tokio::test]
async fn test_interrupt_mid_crawl_returns_collected_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<title>First</title><a class="next" href="/2">Next</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Second</title>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawl.pagination_css = Some("a.next".to_string());
    config.crawl.delay = 30.0;

    let request = CrawlRequest::from_config(&config).unwrap();
    let fetcher = Fetcher::with_rng(&config.fetch, StdRng::seed_from_u64(7)).unwrap();
    let mut coordinator = Coordinator::with_fetcher(request, fetcher, StdRng::seed_from_u64(7));
    let cancel = coordinator.cancellation_token();

    // Interrupt once the seed page has been requested; the crawl is then
    // either finishing that page or sleeping before the next one
    let interrupt = async {
        loop {
            let seen = mock_server
                .received_requests()
                .await
                .map_or(0, |requests| requests.len());
            if seen >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
    };

    let (outcome, ()) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(coordinator.run(), interrupt)
    })
    .await
    .expect("Interrupted crawl did not stop");

    assert_eq!(urls(&outcome), vec![format!("{}/", base_url)]);
    assert_eq!(
        outcome.records[0].get("title").and_then(FieldValue::as_text),
        Some("First")
    );
    assert!(outcome.stats.interrupted);
    assert_eq!(outcome.stats.urls_discarded, 1);
    assert_eq!(outcome.stats.pages_attempted, 1);
}

#[tokio::test]
async fn test_crawl_and_write_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<title>Home</title><a class="next" href="/2">Next</a>"#,
    )
    .await;
    mount_page(&mock_server, "/2", "<title>Two</title><h1>Second</h1>").await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawl.pagination_css = Some("a.next".to_string());
    config.fields = load_field_rules(r#"{"title": {"css": "title"}, "h1": {"css": "h1"}}"#).unwrap();

    let request = CrawlRequest::from_config(&config).unwrap();
    let outcome = crawl(request, &config.fetch).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site/results.csv");
    write_output(&out, &outcome.records).unwrap();

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        content,
        format!(
            "h1,title,url\n,Home,{base}/\nSecond,Two,{base}/2\n",
            base = base_url
        )
    );
}
