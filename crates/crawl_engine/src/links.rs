use std::collections::HashSet;

use crawl_core::{is_in_domain, CrawlTarget, UrlNormalizer};
use scraper::{Html, Selector};
use url::Url;

pub const DEFAULT_MAX_LINKS: usize = 5_000;

/// Collects the in-domain crawl targets referenced by `<a href>` elements.
///
/// Output keeps document order, holds no duplicates and is capped at
/// `max_links` entries.
#[derive(Debug, Clone)]
pub struct LinkDiscovery {
    domain: String,
    normalizer: UrlNormalizer,
    max_links: usize,
    anchors: Option<Selector>,
}

impl LinkDiscovery {
    pub fn new(domain: impl Into<String>, normalizer: UrlNormalizer) -> Self {
        Self::with_max_links(domain, normalizer, DEFAULT_MAX_LINKS)
    }

    pub fn with_max_links(
        domain: impl Into<String>,
        normalizer: UrlNormalizer,
        max_links: usize,
    ) -> Self {
        Self {
            domain: domain.into(),
            normalizer,
            max_links,
            anchors: Selector::parse("a[href]").ok(),
        }
    }

    pub fn discover(&self, document: &Html, base_url: &str) -> Vec<CrawlTarget> {
        let Some(anchors) = self.anchors.as_ref() else {
            return Vec::new();
        };
        let base = Url::parse(base_url).ok();
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(anchors) {
            if links.len() >= self.max_links {
                break;
            }
            let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_url(href, base.as_ref()))
            else {
                continue;
            };
            if !is_in_domain(&url, &self.domain) {
                continue;
            }
            let target = self.normalizer.normalize_parsed(url);
            if seen.insert(target.clone()) {
                links.push(target);
            }
        }

        links
    }

    /// Convenience wrapper that parses `html` first.
    pub fn discover_in(&self, html: &str, base_url: &str) -> Vec<CrawlTarget> {
        self.discover(&Html::parse_document(html), base_url)
    }
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    let resolved = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => base?.join(trimmed).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}
