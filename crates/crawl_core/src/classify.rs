use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Pdf,
    Ical,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Pdf => "pdf",
            ContentKind::Ical => "ical",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides how a resource is extracted from its URL suffix and declared content type.
///
/// PDF wins over iCal, and anything unrecognized is treated as HTML.
pub fn classify(url: &str, content_type: Option<&str>) -> ContentKind {
    let path = url_path(url).to_ascii_lowercase();
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if path.ends_with(".pdf") || content_type.contains("application/pdf") {
        ContentKind::Pdf
    } else if path.ends_with(".ics") || content_type.contains("text/calendar") {
        ContentKind::Ical
    } else {
        ContentKind::Html
    }
}

fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
