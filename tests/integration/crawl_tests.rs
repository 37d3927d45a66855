//! Integration tests for the crawler
//!
//! Traversal properties run against an in-memory wiki; the HTTP source is
//! exercised end-to-end with wiremock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;
use wiki_outline::config::{Config, Traversal};
use wiki_outline::crawler::{
    build_http_client, Coordinator, DocumentSource, FetchError, FetchErrorKind, FetchedDocument,
    HeadingEvent, Resolution, WikiSource,
};
use wiki_outline::output::{RunStatus, SUMMARY_FILE};
use wiki_outline::url::{DocumentId, Link};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "https://en.wikipedia.org";

/// In-memory wiki keyed by article title
#[derive(Default)]
struct MockWiki {
    pages: HashMap<String, FetchedDocument>,
    /// Redirects: referenced title -> served title
    aliases: HashMap<String, String>,
    /// Titles that always fail; `None` fails every resolution mode
    failures: HashMap<String, (FetchErrorKind, Option<Resolution>)>,
    calls: Arc<Mutex<Vec<(String, Resolution)>>>,
}

impl MockWiki {
    fn page(mut self, title: &str, body: &str, links: &[&str]) -> Self {
        let document = FetchedDocument {
            resolved_url: Url::parse(&format!("{}/wiki/{}", BASE, title.replace(' ', "_")))
                .unwrap(),
            title: title.to_string(),
            body_text: body.to_string(),
            headings: vec![
                HeadingEvent::text(body),
                HeadingEvent::heading(2, "Overview"),
                HeadingEvent::text(format!("{} overview", title)),
            ],
            links: links
                .iter()
                .map(|l| Link::new(format!("/wiki/{}", l.replace(' ', "_")), *l))
                .collect(),
        };
        self.pages.insert(title.to_string(), document);
        self
    }

    fn alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.insert(from.to_string(), to.to_string());
        self
    }

    fn failing(mut self, title: &str, kind: FetchErrorKind, only: Option<Resolution>) -> Self {
        self.failures.insert(title.to_string(), (kind, only));
        self
    }

    fn call_log(&self) -> Arc<Mutex<Vec<(String, Resolution)>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl DocumentSource for MockWiki {
    async fn fetch(
        &self,
        id: &DocumentId,
        resolution: Resolution,
    ) -> Result<FetchedDocument, FetchError> {
        let title = id.title_hint("/wiki/").unwrap_or_default();
        self.calls.lock().unwrap().push((title.clone(), resolution));

        if let Some((kind, only)) = self.failures.get(&title) {
            if only.map_or(true, |r| r == resolution) {
                return Err(FetchError::new(*kind, format!("{} failed", title)));
            }
        }

        let served = self.aliases.get(&title).unwrap_or(&title);
        self.pages
            .get(served)
            .cloned()
            .ok_or_else(|| FetchError::new(FetchErrorKind::NotFound, title.clone()))
    }
}

const RELEVANT: &str = "decided by a court of law";

fn test_config(dir: &TempDir, traversal: Traversal) -> Config {
    let mut config: Config = toml::from_str(
        r#"
        [user-agent]
        crawler-name = "TestBot"
        crawler-version = "1.0.0"
        contact-url = "https://example.com/contact"
        contact-email = "test@example.com"
        "#,
    )
    .unwrap();
    config.crawler.traversal = traversal;
    config.crawler.backoff_ms = 1;
    config.site.seeds = vec!["Law".to_string()];
    config.output.directory = dir.path().to_path_buf();
    config
}

fn fetched_titles(calls: &Arc<Mutex<Vec<(String, Resolution)>>>) -> Vec<String> {
    calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
}

fn calls_for(calls: &Arc<Mutex<Vec<(String, Resolution)>>>, title: &str) -> usize {
    calls.lock().unwrap().iter().filter(|(t, _)| t == title).count()
}

fn article_count(dir: &TempDir) -> usize {
    fs::read_dir(dir.path().join("articles"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_document_reached_twice_is_processed_once() {
    let dir = TempDir::new().unwrap();
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &["Tort", "Contract"])
        .page("Tort", RELEVANT, &["Damages"])
        .page("Contract", RELEVANT, &["Damages"])
        .page("Damages", RELEVANT, &[]);
    let calls = wiki.call_log();

    let mut coordinator =
        Coordinator::new(test_config(&dir, Traversal::BreadthFirst), wiki).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(calls_for(&calls, "Damages"), 1);
    assert_eq!(summary.stats.written, 4);
    assert_eq!(article_count(&dir), 4);
}

#[tokio::test]
async fn test_redirects_to_same_document_are_deduplicated() {
    let dir = TempDir::new().unwrap();
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &["Tort", "Torts"])
        .page("Tort", RELEVANT, &[])
        .alias("Torts", "Tort");
    let calls = wiki.call_log();

    let mut coordinator =
        Coordinator::new(test_config(&dir, Traversal::BreadthFirst), wiki).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(calls_for(&calls, "Torts"), 1);
    assert_eq!(summary.stats.written, 2);
    assert_eq!(summary.stats.duplicates, 1);
    assert!(!dir.path().join("articles").join("Tort_2.txt").exists());
}

#[tokio::test]
async fn test_irrelevant_document_neither_written_nor_expanded() {
    let dir = TempDir::new().unwrap();
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &["Cooking"])
        .page("Cooking", "recipes and kitchens", &["Tort"])
        .page("Tort", RELEVANT, &[]);
    let calls = wiki.call_log();

    let mut coordinator =
        Coordinator::new(test_config(&dir, Traversal::DepthFirst), wiki).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(fetched_titles(&calls), vec!["Law", "Cooking"]);
    assert_eq!(summary.stats.rejected, 1);
    assert!(!dir.path().join("articles").join("Cooking.txt").exists());
}

#[tokio::test]
async fn test_transient_failure_exhausts_attempts_once() {
    let dir = TempDir::new().unwrap();
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &["Flaky", "Tort"])
        .page("Tort", RELEVANT, &["Flaky"])
        .failing("Flaky", FetchErrorKind::Transient, None);
    let calls = wiki.call_log();

    let mut config = test_config(&dir, Traversal::BreadthFirst);
    config.crawler.max_attempts = 3;
    let mut coordinator = Coordinator::new(config, wiki).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(calls_for(&calls, "Flaky"), 3);
    assert_eq!(summary.failures, 1);
    assert_eq!(coordinator.failures().get(), 1);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_connection_reset_aborts_but_writes_summary_and_snapshots() {
    let dir = TempDir::new().unwrap();
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &["Tort", "Contract"])
        .page("Contract", RELEVANT, &[])
        .failing("Tort", FetchErrorKind::ConnectionReset, None);
    let calls = wiki.call_log();

    let mut coordinator =
        Coordinator::new(test_config(&dir, Traversal::BreadthFirst), wiki).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert!(matches!(summary.status, RunStatus::Aborted(_)));
    assert_eq!(calls_for(&calls, "Contract"), 0);
    assert_eq!(calls_for(&calls, "Tort"), 1);

    let report = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
    assert!(report.contains("aborted"));

    let urls: Vec<String> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("visited_urls.json")).unwrap())
            .unwrap();
    assert!(urls.contains(&format!("{}/wiki/Law", BASE)));
    assert!(dir.path().join("visited_titles.json").exists());
}

fn tree() -> MockWiki {
    MockWiki::default()
        .page("Law", RELEVANT, &["A", "B"])
        .page("A", RELEVANT, &["A1"])
        .page("B", RELEVANT, &["B1"])
        .page("A1", RELEVANT, &[])
        .page("B1", RELEVANT, &[])
}

#[tokio::test]
async fn test_depth_first_completes_subtree_before_sibling() {
    let dir = TempDir::new().unwrap();
    let wiki = tree();
    let calls = wiki.call_log();

    Coordinator::new(test_config(&dir, Traversal::DepthFirst), wiki)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(fetched_titles(&calls), vec!["Law", "A", "A1", "B", "B1"]);
}

#[tokio::test]
async fn test_breadth_first_completes_level_before_next() {
    let dir = TempDir::new().unwrap();
    let wiki = tree();
    let calls = wiki.call_log();

    Coordinator::new(test_config(&dir, Traversal::BreadthFirst), wiki)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(fetched_titles(&calls), vec!["Law", "A", "B", "A1", "B1"]);
}

#[tokio::test]
async fn test_level_cap_stops_admission_but_drains_queue() {
    let dir = TempDir::new().unwrap();
    let wiki = tree();
    let calls = wiki.call_log();

    let mut config = test_config(&dir, Traversal::BreadthFirst);
    config.crawler.max_levels = Some(1);
    Coordinator::new(config, wiki).unwrap().run().await.unwrap();

    assert_eq!(fetched_titles(&calls), vec!["Law", "A", "B"]);
}

#[tokio::test]
async fn test_recursion_limit_unwinds_branch() {
    let dir = TempDir::new().unwrap();
    let wiki = tree();
    let calls = wiki.call_log();

    let mut config = test_config(&dir, Traversal::DepthFirst);
    config.crawler.max_recursion_depth = 1;
    let summary = Coordinator::new(config, wiki)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(fetched_titles(&calls), vec!["Law", "A", "B"]);
    assert_eq!(summary.stats.unwound, 2);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_not_found_falls_back_to_exact_title() {
    let dir = TempDir::new().unwrap();
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &["Equity"])
        .page("Equity", RELEVANT, &[])
        .failing("Equity", FetchErrorKind::NotFound, Some(Resolution::Fuzzy));
    let calls = wiki.call_log();

    let summary = Coordinator::new(test_config(&dir, Traversal::DepthFirst), wiki)
        .unwrap()
        .run()
        .await
        .unwrap();

    let equity: Vec<Resolution> = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|(t, _)| t == "Equity")
        .map(|(_, r)| *r)
        .collect();
    assert_eq!(equity, vec![Resolution::Fuzzy, Resolution::Exact]);
    assert_eq!(summary.stats.written, 2);
    assert_eq!(summary.failures, 0);
}

#[tokio::test]
async fn test_article_lines_are_breadcrumb_tab_body() {
    let dir = TempDir::new().unwrap();
    let wiki = MockWiki::default().page("Law", RELEVANT, &[]);

    Coordinator::new(test_config(&dir, Traversal::DepthFirst), wiki)
        .unwrap()
        .run()
        .await
        .unwrap();

    let content = fs::read_to_string(dir.path().join("articles").join("Law.txt")).unwrap();
    assert_eq!(
        content,
        format!("Law\t{}\nOverview\tLaw overview\n", RELEVANT)
    );
}

#[tokio::test]
async fn test_overlong_title_is_written_without_stopping_run() {
    let dir = TempDir::new().unwrap();
    let long_title = format!("Law of {}", "x".repeat(250));
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &[long_title.as_str(), "Tort"])
        .page(&long_title, RELEVANT, &[])
        .page("Tort", RELEVANT, &[]);
    let calls = wiki.call_log();

    let mut coordinator =
        Coordinator::new(test_config(&dir, Traversal::BreadthFirst), wiki).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(calls_for(&calls, "Tort"), 1);
    assert_eq!(summary.stats.written, 3);
    assert!(dir.path().join("articles").join("Tort.txt").exists());
    assert_eq!(article_count(&dir), 3);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_unwritable_article_does_not_stop_siblings() {
    let dir = TempDir::new().unwrap();
    // Deep enough that a full-length file name exceeds PATH_MAX but short ones fit
    let mut output = dir.path().to_path_buf();
    for _ in 0..16 {
        output.push("d".repeat(240));
    }
    fs::create_dir_all(&output).unwrap();

    let long_title = format!("Law of {}", "x".repeat(250));
    let wiki = MockWiki::default()
        .page("Law", RELEVANT, &[long_title.as_str(), "Tort"])
        .page(&long_title, RELEVANT, &["Contract"])
        .page("Tort", RELEVANT, &[])
        .page("Contract", RELEVANT, &[]);
    let calls = wiki.call_log();

    let mut config = test_config(&dir, Traversal::BreadthFirst);
    config.output.directory = output.clone();
    let mut coordinator = Coordinator::new(config, wiki).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.stats.write_failed, 1);
    assert_eq!(summary.stats.written, 2);
    assert_eq!(calls_for(&calls, "Tort"), 1);
    // Unwritten documents are not expanded
    assert_eq!(calls_for(&calls, "Contract"), 0);
    assert!(output.join("articles").join("Tort.txt").exists());
    assert!(output.join(SUMMARY_FILE).exists());
}

fn user_agent_config(dir: &TempDir, base_url: &str) -> Config {
    let mut config = test_config(dir, Traversal::BreadthFirst);
    config.site.base_url = base_url.to_string();
    config.crawler.max_attempts = 2;
    config
}

fn article_html(title: &str, content: &str) -> String {
    format!(
        r#"<html><head><title>{title} - Wikipedia</title></head><body>
        <h1 id="firstHeading"><span class="mw-page-title-main">{title}</span></h1>
        <div id="mw-content-text"><div class="mw-content-ltr mw-parser-output">{content}</div></div>
        </body></html>"#
    )
}

#[tokio::test]
async fn test_http_crawl_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Fuzzy title lookup redirects to the article
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("search", "Law"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/wiki/Law"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Law"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html(
                    "Law",
                    r#"<p>Law is enforced by a court and by legislation.</p>
                    <h2>History</h2>
                    <p>See <a href="/wiki/Tort">tort</a> and <a href="/wiki/File:Scales.png">scales</a>.</p>
                    <p><a href="/w/index.php?title=Law&amp;action=edit">edit</a>
                       <a href="https://example.org/">elsewhere</a></p>
                    <h2>References</h2>
                    <p>Cited works.</p>"#,
                ))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Tort"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html(
                    "Tort",
                    r#"<p>A tort is a civil wrong heard by a court under law.</p>
                    <p>Back to <a href="/wiki/Law">law</a>.</p>"#,
                ))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = user_agent_config(&dir, &base_url);
    let client = build_http_client(&config.user_agent).unwrap();
    let source = WikiSource::new(client, &config.site).unwrap();

    let summary = Coordinator::new(config, source)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.stats.written, 2);
    assert_eq!(summary.failures, 0);

    let law = fs::read_to_string(dir.path().join("articles").join("Law.txt")).unwrap();
    assert!(law.starts_with("Law\tLaw is enforced by a court and by legislation.\n"));
    assert!(law.contains("History\tSee tort and scales."));
    assert!(!law.contains("Cited works"));

    let tort = fs::read_to_string(dir.path().join("articles").join("Tort.txt")).unwrap();
    assert!(tort.starts_with("Tort\tA tort is a civil wrong"));
}

#[tokio::test]
async fn test_http_server_errors_are_retried_then_counted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wiki/Flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = user_agent_config(&dir, &mock_server.uri());
    config.site.seeds = vec!["/wiki/Flaky".to_string()];
    let client = build_http_client(&config.user_agent).unwrap();
    let source = WikiSource::new(client, &config.site).unwrap();

    let summary = Coordinator::new(config, source)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.failures, 1);
    assert_eq!(summary.stats.written, 0);
}

#[tokio::test]
async fn test_http_missing_article_counts_one_failure() {
    let mock_server = MockServer::start().await;

    // Search lands on the results page: no article matches
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html(
            "Search results",
            "<p>There were no results matching the query.</p>",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Nonexistent_doctrine"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = user_agent_config(&dir, &mock_server.uri());
    config.site.seeds = vec!["Nonexistent doctrine".to_string()];
    let client = build_http_client(&config.user_agent).unwrap();
    let source = WikiSource::new(client, &config.site).unwrap();

    let summary = Coordinator::new(config, source)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.failures, 1);
    assert_eq!(summary.status, RunStatus::Completed);
}
