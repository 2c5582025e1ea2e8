use crawl_core::{clean_text, ContentKind};
use regex::Regex;

use crate::{decode_utf8, Extracted, Extractor, Resource, ResourceError};

/// Calendar files: the whole text is kept, the title is the first `SUMMARY`.
#[derive(Debug, Clone)]
pub struct IcalExtractor {
    summary: Option<Regex>,
}

impl IcalExtractor {
    pub fn new() -> Self {
        Self {
            summary: Regex::new(r"SUMMARY:(.+)").ok(),
        }
    }

    fn summary(&self, text: &str) -> String {
        self.summary
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }
}

impl Default for IcalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for IcalExtractor {
    fn extract(&self, resource: &Resource<'_>) -> Result<Extracted, ResourceError> {
        let text = decode_utf8(resource.body).map_err(|source| ResourceError::DecodeFailure {
            kind: ContentKind::Ical,
            source,
        })?;
        Ok(Extracted {
            title: self.summary(&text),
            text: clean_text(&text),
            ..Extracted::default()
        })
    }
}
