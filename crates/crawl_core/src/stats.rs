use crate::ContentKind;

/// Run counters. They only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    html: u64,
    pdf: u64,
    ical: u64,
    errors: u64,
    total: u64,
    fetch_errors: u64,
}

impl CrawlStats {
    pub fn html(&self) -> u64 {
        self.html
    }

    pub fn pdf(&self) -> u64 {
        self.pdf
    }

    pub fn ical(&self) -> u64 {
        self.ical
    }

    /// Extraction and decode failures.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Emitted records of any kind.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Transport failures reported by the fetcher.
    pub fn fetch_errors(&self) -> u64 {
        self.fetch_errors
    }

    pub(crate) fn record_emitted(&mut self, kind: ContentKind) {
        match kind {
            ContentKind::Html => self.html += 1,
            ContentKind::Pdf => self.pdf += 1,
            ContentKind::Ical => self.ical += 1,
        }
        self.total += 1;
    }

    pub(crate) fn record_error(&mut self) {
        self.errors += 1;
    }

    pub(crate) fn record_fetch_error(&mut self) {
        self.fetch_errors += 1;
    }

    /// Counter names and values in summary order.
    pub fn counters(&self) -> [(&'static str, u64); 6] {
        [
            ("html", self.html),
            ("pdf", self.pdf),
            ("ical", self.ical),
            ("errors", self.errors),
            ("total", self.total),
            ("fetch_errors", self.fetch_errors),
        ]
    }
}
