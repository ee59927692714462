//! End-to-end crawl behaviour: extraction, budgets, link handling, logs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_spider::config::LogTarget;
use sumi_spider::export::{sink_fn, Match};
use sumi_spider::{SpiderBuilder, StopReason};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Collects exported matches and writes logs into a temp directory
struct Fixture {
    dir: TempDir,
    records: Arc<Mutex<Vec<Match>>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn info_log(&self) -> PathBuf {
        self.dir.path().join("info.log")
    }

    fn error_log(&self) -> PathBuf {
        self.dir.path().join("error.log")
    }

    fn builder(&self, seed: &str) -> SpiderBuilder {
        let records = Arc::clone(&self.records);
        SpiderBuilder::new(seed)
            .info_log(LogTarget::File(self.info_log()))
            .error_log(LogTarget::File(self.error_log()))
            .export(sink_fn(move |record: Match| {
                let records = Arc::clone(&records);
                async move {
                    records.lock().unwrap().push(record);
                    Ok(())
                }
            }))
    }

    fn texts(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

async fn page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body.to_string()),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sanitized_text_is_exported() {
    let server = MockServer::start().await;
    page(
        &server,
        "/a",
        "<html><body><div class=\"title\">  Hello   World\n\n</div></body></html>",
    )
    .await;

    let fixture = Fixture::new();
    let seed = format!("{}/a", server.uri());
    let spider = fixture
        .builder(&seed)
        .content_selector(".title")
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::QueueEmpty);
    assert_eq!(report.matches_exported, 1);
    let records = fixture.records.lock().unwrap();
    assert_eq!(records.as_slice(), &[Match::new(seed, ".title", "Hello World")]);
}

#[tokio::test]
async fn test_page_budget_leaves_second_page_unvisited() {
    let server = MockServer::start().await;
    page(&server, "/", r#"<h1>Home</h1><a href="/second">next</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Second</h1>"))
        .expect(0)
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&format!("{}/", server.uri()))
        .content_selector("h1")
        .link_selector("a")
        .page_limit(1)
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::PageLimit);
    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.pending, 1);
    assert_eq!(fixture.texts(), vec!["Home"]);
    assert!(read(&fixture.info_log()).contains("scrape limit reached, stopping"));
}

#[tokio::test]
async fn test_slow_sink_does_not_let_extra_page_through() {
    let server = MockServer::start().await;
    page(&server, "/", r#"<h1>Home</h1><a href="/second">next</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Second</h1>"))
        .expect(0)
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let records = Arc::clone(&fixture.records);
    let spider = fixture
        .builder(&format!("{}/", server.uri()))
        .content_selector("h1")
        .link_selector("a")
        .page_limit(1)
        .concurrency(4)
        .export(sink_fn(move |record: Match| {
            let records = Arc::clone(&records);
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                records.lock().unwrap().push(record);
                Ok(())
            }
        }))
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::PageLimit);
    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.pending, 1);
    assert_eq!(report.seen, 1);
    assert_eq!(fixture.texts(), vec!["Home"]);
}

#[tokio::test]
async fn test_seed_without_path_is_normalized() {
    let server = MockServer::start().await;
    page(&server, "/", r#"<h1>Home</h1><a href="/">self</a>"#).await;

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&server.uri())
        .content_selector("h1")
        .link_selector("a")
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::QueueEmpty);
    assert_eq!(report.pages_visited, 1);
    let records = fixture.records.lock().unwrap();
    assert_eq!(records[0].address, format!("{}/", server.uri()));
    assert!(read(&fixture.info_log()).contains(&format!("root URL: {}/", server.uri())));
}

#[tokio::test]
async fn test_result_budget_stops_crawl() {
    let server = MockServer::start().await;
    page(
        &server,
        "/",
        r#"<li>one</li><li>two</li><a href="/more">more</a>"#,
    )
    .await;

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&format!("{}/", server.uri()))
        .content_selector("li")
        .link_selector("a")
        .result_limit(1)
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    // Every match on the page in flight is still exported
    assert_eq!(report.reason, StopReason::ResultLimit);
    assert_eq!(report.matches_exported, 2);
    assert_eq!(report.pending, 1);
}

#[tokio::test]
async fn test_mailto_link_is_rejected_and_logged() {
    let server = MockServer::start().await;
    page(
        &server,
        "/",
        r#"<a class="contact" href="mailto:a@b.com">email us</a>"#,
    )
    .await;

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&format!("{}/", server.uri()))
        .link_selector("a.contact")
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::QueueEmpty);
    assert_eq!(report.pending, 0);
    assert_eq!(report.seen, 1);

    let info = read(&fixture.info_log());
    assert!(info.contains("rejected link: mailto:a@b.com"));
    assert!(!info.contains("new url: mailto"));
    assert!(read(&fixture.error_log()).is_empty());
}

#[tokio::test]
async fn test_failed_seed_fetch_is_logged_and_counted() {
    let fixture = Fixture::new();
    let seed = "http://127.0.0.1:1/";
    let spider = fixture
        .builder(seed)
        .content_selector("h1")
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::QueueEmpty);
    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.matches_exported, 0);

    let errors = read(&fixture.error_log());
    assert!(errors.contains("ERROR"));
    assert!(errors.contains(seed));
    assert!(read(&fixture.info_log()).contains("queue is empty, stopping"));
}

#[tokio::test]
async fn test_each_address_fetched_once_under_concurrency() {
    let server = MockServer::start().await;
    let links = r#"<a href="/">home</a><a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#;
    for route in ["/", "/a", "/b", "/c"] {
        page(&server, route, &format!("<h2>{}</h2>{}", route, links)).await;
    }

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&format!("{}/", server.uri()))
        .content_selector("h2")
        .link_selector("a")
        .concurrency(4)
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::QueueEmpty);
    assert_eq!(report.pages_visited, 4);
    assert_eq!(report.seen, 4);

    let mut texts = fixture.texts();
    texts.sort();
    assert_eq!(texts, vec!["/", "/a", "/b", "/c"]);
    // Mock expectations (.expect(1)) are verified when the server drops
}

#[tokio::test]
async fn test_filter_limits_exported_matches() {
    let server = MockServer::start().await;
    page(
        &server,
        "/jobs",
        r#"<ul>
             <li class="job">Graduate Engineer, Leeds</li>
             <li class="job">Graduate Analyst, London</li>
             <li class="job">Senior Engineer, Leeds</li>
           </ul>"#,
    )
    .await;

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&format!("{}/jobs", server.uri()))
        .content_selector(".job")
        .filter(|text| text.contains("raduate") && !text.contains("London"))
        .result_limit(10)
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.matches_exported, 1);
    assert_eq!(fixture.texts(), vec!["Graduate Engineer, Leeds"]);
    assert!(read(&fixture.info_log()).contains("filtered match"));
}

/// Every page links to one deeper page, after a short delay
struct EndlessPages;

impl Respond for EndlessPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let next = format!("{}/deeper", request.url.path().trim_end_matches('/'));
        ResponseTemplate::new(200)
            .set_body_string(format!(r#"<p>page</p><a href="{}">next</a>"#, next))
            .set_delay(Duration::from_millis(100))
    }
}

#[tokio::test]
async fn test_time_limit_stops_endless_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(EndlessPages)
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&format!("{}/", server.uri()))
        .content_selector("p")
        .link_selector("a")
        .page_limit(10_000)
        .result_limit(10_000)
        .time_limit(Duration::from_millis(500))
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();

    assert_eq!(report.reason, StopReason::TimeLimit);
    assert!(report.pages_visited >= 1);
    assert!(report.elapsed < Duration::from_secs(5));
    assert!(read(&fixture.info_log()).contains("time limit reached, stopping"));
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    page(&server, "/new", "<h1>Moved</h1>").await;

    let fixture = Fixture::new();
    let seed = format!("{}/old", server.uri());
    let spider = fixture
        .builder(&seed)
        .content_selector("h1")
        .build()
        .unwrap();

    spider.run().await.unwrap();

    // Matches are attributed to the address that was dispatched
    let records = fixture.records.lock().unwrap();
    assert_eq!(records.as_slice(), &[Match::new(seed, "h1", "Moved")]);
}

#[tokio::test]
async fn test_user_agent_and_accept_headers_sent() {
    use wiremock::matchers::header;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "sumi-test/1.0"))
        .and(header("accept", "text/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>ok</h1>"))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let spider = fixture
        .builder(&format!("{}/", server.uri()))
        .content_selector("h1")
        .user_agent("sumi-test/1.0")
        .build()
        .unwrap();

    spider.run().await.unwrap();
    assert_eq!(fixture.texts(), vec!["ok"]);
}
