use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static DOTTED_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d{2}\.\d{2}\.\d{4}").ok());

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

#[derive(Debug, Clone, Copy)]
enum DateSource {
    Attr(&'static str),
    Text,
}

/// Finds the "last updated" date of an HTML page.
///
/// A `div.meta` block with text is authoritative: its `DD.MM.YYYY` date is
/// used or the page has no date. Without such a block, publish-time metadata,
/// `meta[name=date]`, `<time>` and `.date` are tried in that order.
#[derive(Debug)]
pub struct DateExtractor {
    meta_block: Option<Selector>,
    fallbacks: Vec<(Selector, DateSource)>,
}

impl DateExtractor {
    pub fn new() -> Self {
        let fallbacks = [
            (
                r#"meta[property="article:published_time"]"#,
                DateSource::Attr("content"),
            ),
            (r#"meta[name="date"]"#, DateSource::Attr("content")),
            ("time", DateSource::Text),
            (".date", DateSource::Text),
        ]
        .into_iter()
        .filter_map(|(css, source)| Selector::parse(css).ok().map(|sel| (sel, source)))
        .collect();

        Self {
            meta_block: Selector::parse("div.meta").ok(),
            fallbacks,
        }
    }

    pub fn extract(&self, doc: &Html) -> Option<String> {
        if let Some(meta_text) = self
            .meta_block
            .as_ref()
            .and_then(|sel| doc.select(sel).find_map(first_direct_text))
        {
            return parse_dotted_date(&meta_text);
        }

        self.fallbacks.iter().find_map(|(sel, source)| {
            doc.select(sel)
                .find_map(|element| match source {
                    DateSource::Attr(name) => element
                        .value()
                        .attr(name)
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .map(str::to_string),
                    DateSource::Text => first_direct_text(element),
                })
                .map(|raw| normalize_iso_date(&raw))
        })
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the first `DD.MM.YYYY` in `text` and renders it as `YYYY-MM-DDT00:00:00`.
pub fn parse_dotted_date(text: &str) -> Option<String> {
    let found = DOTTED_DATE.as_ref()?.find(text)?;
    NaiveDate::parse_from_str(found.as_str(), "%d.%m.%Y")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Re-renders an ISO-8601 date or datetime; returns `raw` trimmed when it does not parse.
pub fn normalize_iso_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.to_rfc3339_opts(SecondsFormat::AutoSi, false);
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return parsed.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

// First non-blank text node that is a direct child of `element`, trimmed.
fn first_direct_text(element: ElementRef<'_>) -> Option<String> {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
