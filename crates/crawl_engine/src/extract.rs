use crawl_core::CrawlTarget;

use crate::ResourceError;

/// Raw input handed to an extractor.
#[derive(Debug, Clone, Copy)]
pub struct Resource<'a> {
    pub target: &'a CrawlTarget,
    /// URL that relative links resolve against (the response URL).
    pub base_url: &'a str,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// What an extractor produces before the record is stamped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extracted {
    pub title: String,
    /// Already cleaned.
    pub text: String,
    pub date_updated: Option<String>,
    pub links: Vec<CrawlTarget>,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, resource: &Resource<'_>) -> Result<Extracted, ResourceError>;
}
