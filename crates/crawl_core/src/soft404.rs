use std::fmt;

/// Why a resource was skipped without emitting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    HardNotFound,
    SoftNotFoundTitle,
    SoftNotFoundBody,
    UnexpectedStatus(u16),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::HardNotFound => write!(f, "404 (status)"),
            SkipReason::SoftNotFoundTitle => write!(f, "soft-404 (title)"),
            SkipReason::SoftNotFoundBody => write!(f, "soft-404 (body)"),
            SkipReason::UnexpectedStatus(code) => write!(f, "http status {code}"),
        }
    }
}

/// Detects hard and soft "not found" responses.
///
/// Checks run in three stages so the caller can stop before paying for body
/// extraction: [`check_status`](Self::check_status), then
/// [`check_title`](Self::check_title), then [`check_body`](Self::check_body).
/// Markers are matched against lower-cased input and must be lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFailureDetector {
    pub title_markers: Vec<String>,
    pub body_markers: Vec<String>,
}

impl Default for SoftFailureDetector {
    fn default() -> Self {
        Self {
            title_markers: vec!["404".to_string(), "not found".to_string()],
            body_markers: vec![
                "diese seite existiert nicht".to_string(),
                "this page does not exist".to_string(),
            ],
        }
    }
}

impl SoftFailureDetector {
    pub fn check_status(&self, status: u16) -> Option<SkipReason> {
        match status {
            404 => Some(SkipReason::HardNotFound),
            200..=299 => None,
            other => Some(SkipReason::UnexpectedStatus(other)),
        }
    }

    pub fn check_title(&self, title: &str) -> Option<SkipReason> {
        contains_any(title, &self.title_markers).then_some(SkipReason::SoftNotFoundTitle)
    }

    pub fn check_body(&self, cleaned_text: &str) -> Option<SkipReason> {
        contains_any(cleaned_text, &self.body_markers).then_some(SkipReason::SoftNotFoundBody)
    }

    /// All three stages in order; the first match wins.
    pub fn evaluate(&self, status: u16, title: &str, body: Option<&str>) -> Option<SkipReason> {
        self.check_status(status)
            .or_else(|| self.check_title(title))
            .or_else(|| body.and_then(|text| self.check_body(text)))
    }
}

fn contains_any(haystack: &str, markers: &[String]) -> bool {
    let lowered = haystack.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker.as_str()))
}
