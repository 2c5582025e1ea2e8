use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use crawl_core::FinishReason;
use crawl_engine::{
    CrawlConfig, Crawler, EngineHandle, FailureKind, FetchError, FetchResponse, Fetcher, RecordSink,
    ScrapedRecord, SinkError,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(crawl_logging::initialize_for_tests);
}

/// In-memory site: unknown URLs answer 404.
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, FetchResponse>,
    failing: HashSet<String>,
    delay: Duration,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    fn page(mut self, url: &str, content_type: &str, body: &str) -> Self {
        let response = FetchResponse::new(200, url, body.as_bytes().to_vec())
            .with_header("Content-Type", content_type);
        self.pages.insert(url.to_string(), response);
        self
    }

    fn html(self, url: &str, body: &str) -> Self {
        self.page(url, "text/html; charset=utf-8", body)
    }

    fn redirect(mut self, url: &str, final_url: &str, body: &str) -> Self {
        let mut response = FetchResponse::new(200, final_url, body.as_bytes().to_vec())
            .with_header("Content-Type", "text/html");
        response.redirect_count = 1;
        self.pages.insert(url.to_string(), response);
        self
    }

    fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|requested| *requested == url).count()
    }
}

#[async_trait]
impl Fetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(url) {
            return Err(FetchError::new(
                FailureKind::Network,
                format!("connection reset for {url}"),
            ));
        }
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(404, url, Vec::new())))
    }
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<ScrapedRecord>>>);

impl RecordSink for SharedSink {
    fn accept(&mut self, record: &ScrapedRecord) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn config(seeds: &[&str]) -> CrawlConfig {
    CrawlConfig::for_domain("thws.de", seeds.iter().map(|s| s.to_string()).collect())
}

fn urls(records: &[ScrapedRecord]) -> Vec<String> {
    let mut urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn crawl_follows_links_and_counts_outcomes() {
    init_logging();
    let site = Arc::new(
        FakeSite::default()
            .html(
                "https://www.thws.de",
                concat!(
                    "<title>Start</title><main>",
                    "<a href=\"/studium\">Studium</a>",
                    "<a href=\"/studium/\">Studium</a>",
                    "<a href=\"/termine.ics\">Termine</a>",
                    "<a href=\"/files/broken.pdf\">PDF</a>",
                    "<a href=\"/gone\">Weg</a>",
                    "<a href=\"https://other.org/\">Extern</a>",
                    "</main>"
                ),
            )
            .html(
                "https://www.thws.de/studium",
                "<h1>Studium</h1><main><a href=\"/\">Home</a><a href=\"/studium?tab=2\">Tab</a></main>",
            )
            .page(
                "https://www.thws.de/termine.ics",
                "text/calendar",
                "BEGIN:VEVENT\nSUMMARY:Semesterstart\nEND:VEVENT\n",
            )
            .page(
                "https://www.thws.de/files/broken.pdf",
                "application/pdf",
                "%PDF-1.4 garbage",
            ),
    );
    let crawler = Crawler::new(config(&["https://www.thws.de/"]), site.clone());
    let mut records: Vec<ScrapedRecord> = Vec::new();

    let report = crawler.run(&mut records, CancellationToken::new()).await;

    assert_eq!(report.reason, FinishReason::Finished);
    assert_eq!(
        urls(&records),
        vec![
            "https://www.thws.de".to_string(),
            "https://www.thws.de/studium".to_string(),
            "https://www.thws.de/termine.ics".to_string(),
        ]
    );
    assert_eq!(report.stats.html(), 2);
    assert_eq!(report.stats.pdf(), 0);
    assert_eq!(report.stats.ical(), 1);
    assert_eq!(report.stats.errors(), 1);
    assert_eq!(report.stats.total(), 3);
    assert_eq!(report.records_written, 3);
    for url in [
        "https://www.thws.de",
        "https://www.thws.de/studium",
        "https://www.thws.de/gone",
    ] {
        assert_eq!(site.request_count(url), 1, "{url} fetched more than once");
    }
    assert!(!site.requests().iter().any(|url| url.contains("other.org")));
}

#[tokio::test]
async fn duplicate_links_across_pages_are_fetched_once() {
    init_logging();
    let hub = (0..10)
        .map(|i| format!("<a href=\"/seite{i}\">{i}</a>"))
        .collect::<String>();
    let mut site = FakeSite::default().html("https://www.thws.de", &hub);
    for i in 0..10 {
        let body = (0..10)
            .map(|j| format!("<a href=\"/seite{j}/\">{j}</a><a href=\"/shared\">s</a>"))
            .collect::<String>();
        site = site.html(&format!("https://www.thws.de/seite{i}"), &body);
    }
    let site = Arc::new(site.html("https://www.thws.de/shared", "<p>geteilt</p>"));
    let mut settings = config(&["https://www.thws.de"]);
    settings.max_concurrency = 8;
    let crawler = Crawler::new(settings, site.clone());
    let mut records: Vec<ScrapedRecord> = Vec::new();

    let report = crawler.run(&mut records, CancellationToken::new()).await;

    assert_eq!(report.reason, FinishReason::Finished);
    assert_eq!(records.len(), 12);
    let unique: HashSet<String> = records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(unique.len(), records.len());
    let requests = site.requests();
    let unique_requests: HashSet<&String> = requests.iter().collect();
    assert_eq!(unique_requests.len(), requests.len());
}

#[tokio::test]
async fn redirect_onto_visited_url_is_discarded() {
    init_logging();
    let site = Arc::new(
        FakeSite::default()
            .html(
                "https://www.thws.de",
                "<a href=\"/alt\">alt</a><a href=\"/neu\">neu</a>",
            )
            .redirect(
                "https://www.thws.de/alt",
                "https://www.thws.de/neu/",
                "<p>Neue Seite</p>",
            )
            .html("https://www.thws.de/neu", "<p>Neue Seite</p>"),
    );
    let crawler = Crawler::new(config(&["https://www.thws.de"]), site);
    let mut records: Vec<ScrapedRecord> = Vec::new();

    let report = crawler.run(&mut records, CancellationToken::new()).await;

    assert_eq!(report.reason, FinishReason::Finished);
    assert_eq!(
        urls(&records),
        vec![
            "https://www.thws.de".to_string(),
            "https://www.thws.de/neu".to_string(),
        ]
    );
    assert_eq!(report.stats.total(), 2);
}

#[tokio::test]
async fn fetch_failures_are_counted_and_crawl_continues() {
    init_logging();
    let site = Arc::new(
        FakeSite::default()
            .html(
                "https://www.thws.de",
                "<a href=\"/down\">down</a><a href=\"/up\">up</a>",
            )
            .html("https://www.thws.de/up", "<p>erreichbar</p>")
            .failing("https://www.thws.de/down"),
    );
    let crawler = Crawler::new(config(&["https://www.thws.de"]), site);
    let mut records: Vec<ScrapedRecord> = Vec::new();

    let report = crawler.run(&mut records, CancellationToken::new()).await;

    assert_eq!(report.reason, FinishReason::Finished);
    assert_eq!(report.stats.fetch_errors(), 1);
    assert_eq!(report.stats.errors(), 0);
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn invalid_and_offsite_seeds_are_ignored() {
    init_logging();
    let site = Arc::new(FakeSite::default().html("https://fiw.thws.de", "<p>FIW</p>"));
    let crawler = Crawler::new(
        config(&["not a url", "https://example.org/", "https://fiw.thws.de/"]),
        site.clone(),
    );
    let mut records: Vec<ScrapedRecord> = Vec::new();

    let report = crawler.run(&mut records, CancellationToken::new()).await;

    assert_eq!(report.reason, FinishReason::Finished);
    assert_eq!(urls(&records), vec!["https://fiw.thws.de".to_string()]);
    assert_eq!(site.requests(), vec!["https://fiw.thws.de".to_string()]);
}

#[tokio::test]
async fn stop_before_start_abandons_queued_seeds() {
    init_logging();
    let site = Arc::new(
        FakeSite::default()
            .html("https://www.thws.de", "<a href=\"/weiter\">weiter</a>")
            .html("https://fiw.thws.de", "<p>FIW</p>"),
    );
    let mut settings = config(&["https://www.thws.de", "https://fiw.thws.de"]);
    settings.max_concurrency = 1;
    let crawler = Crawler::new(settings, site.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut records: Vec<ScrapedRecord> = Vec::new();

    let report = crawler.run(&mut records, cancel).await;

    assert_eq!(report.reason, FinishReason::Shutdown);
    assert_eq!(site.requests(), vec!["https://www.thws.de".to_string()]);
    assert!(records.len() <= 1);
    assert_eq!(site.request_count("https://www.thws.de/weiter"), 0);
}

#[test]
fn engine_handle_stop_drains_and_reports_shutdown() {
    init_logging();
    let hub = (0..50)
        .map(|i| format!("<a href=\"/seite{i}\">{i}</a>"))
        .collect::<String>();
    let site = Arc::new(FakeSite {
        delay: Duration::from_millis(50),
        ..FakeSite::default().html("https://www.thws.de", &hub)
    });
    let mut settings = config(&["https://www.thws.de"]);
    settings.max_concurrency = 2;
    let sink = SharedSink::default();
    let handle = EngineHandle::start(Crawler::new(settings, site.clone()), Box::new(sink.clone()));

    std::thread::sleep(Duration::from_millis(200));
    handle.stop();
    let report = handle.wait().expect("engine thread");

    assert_eq!(report.reason, FinishReason::Shutdown);
    assert!(site.requests().len() < 51);
    assert_eq!(sink.0.lock().unwrap().len(), report.records_written);
}

#[tokio::test]
async fn empty_seed_list_finishes_immediately() {
    init_logging();
    let crawler = Crawler::new(config(&[]), Arc::new(FakeSite::default()));
    let mut records: Vec<ScrapedRecord> = Vec::new();

    let report = crawler.run(&mut records, CancellationToken::new()).await;

    assert_eq!(report.reason, FinishReason::Finished);
    assert_eq!(report.stats.total(), 0);
    assert!(records.is_empty());
}
