use std::fmt;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("invalid url {url:?}: {message}")]
    Invalid { url: String, message: String },
}

/// Canonicalizes URLs into the identity key used for visited tracking.
///
/// The query is always removed and trailing slashes are stripped. Fragments are
/// kept unless `strip_fragment` is set, so `/a` and `/a#top` are distinct
/// targets by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlNormalizer {
    pub strip_fragment: bool,
}

impl UrlNormalizer {
    pub fn new(strip_fragment: bool) -> Self {
        Self { strip_fragment }
    }

    pub fn normalize(&self, raw: &str) -> Result<CrawlTarget, UrlError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|err| UrlError::Invalid {
            url: trimmed.to_string(),
            message: err.to_string(),
        })?;
        Ok(self.normalize_parsed(url))
    }

    pub fn normalize_parsed(&self, mut url: Url) -> CrawlTarget {
        url.set_query(None);
        if self.strip_fragment {
            url.set_fragment(None);
        }
        let serialized: String = url.into();
        CrawlTarget(serialized.trim_end_matches('/').to_string())
    }
}

/// Normalizes `raw` with the default (fragment-preserving) rules.
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    UrlNormalizer::default()
        .normalize(raw)
        .map(CrawlTarget::into_string)
}

/// True when `url` is http(s) and its host is `domain` or a subdomain of it.
pub fn is_in_domain(url: &Url, domain: &str) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    match url.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => false,
    }
}

/// A normalized URL. Only [`UrlNormalizer`] creates these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrawlTarget(String);

impl CrawlTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }
}

impl AsRef<str> for CrawlTarget {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
