use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crawl_core::{SoftFailureDetector, UrlNormalizer};

use crate::{FetchSettings, DEFAULT_MAX_LINKS};

/// Source of `date_scraped` timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub const DEFAULT_DOMAIN: &str = "thws.de";
pub const DEFAULT_SEEDS: [&str; 2] = ["https://www.thws.de/", "https://fiw.thws.de/"];
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

#[derive(Clone)]
pub struct CrawlConfig {
    pub domain: String,
    pub seeds: Vec<String>,
    /// Upper bound on fetches in flight.
    pub max_concurrency: usize,
    pub max_links_per_page: usize,
    pub normalizer: UrlNormalizer,
    pub detector: SoftFailureDetector,
    pub fetch: FetchSettings,
    pub clock: Clock,
}

impl CrawlConfig {
    /// Crawl `domain` starting at `seeds`; the fetcher is restricted to the same domain.
    pub fn for_domain(domain: impl Into<String>, seeds: Vec<String>) -> Self {
        let domain = domain.into();
        let fetch = FetchSettings {
            allowed_domains: vec![domain.clone()],
            ..FetchSettings::default()
        };
        Self {
            domain,
            seeds,
            fetch,
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            seeds: DEFAULT_SEEDS.iter().map(|seed| seed.to_string()).collect(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_links_per_page: DEFAULT_MAX_LINKS,
            normalizer: UrlNormalizer::default(),
            detector: SoftFailureDetector::default(),
            fetch: FetchSettings::default(),
            clock: Arc::new(Utc::now),
        }
    }
}

impl fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("domain", &self.domain)
            .field("seeds", &self.seeds)
            .field("max_concurrency", &self.max_concurrency)
            .field("max_links_per_page", &self.max_links_per_page)
            .field("normalizer", &self.normalizer)
            .field("detector", &self.detector)
            .field("fetch", &self.fetch)
            .finish_non_exhaustive()
    }
}
