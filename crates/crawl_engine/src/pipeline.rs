use crawl_core::{classify, ContentKind, CrawlTarget, Outcome, SkipReason, SoftFailureDetector};

use crate::{
    Clock, CrawlConfig, DecodeError, Extracted, Extractor, FetchResponse, HtmlExtractor,
    IcalExtractor, LinkDiscovery, PdfExtractor, Resource, ScrapedRecord,
};

/// Why a fetched resource produced no record.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("hard 404")]
    HardNotFound,
    #[error("{0}")]
    SoftNotFound(SkipReason),
    #[error("unexpected http status {0}")]
    UnexpectedStatus(u16),
    #[error("{kind} extraction failed: {message}")]
    ExtractionFailure { kind: ContentKind, message: String },
    #[error("{kind} decoding failed")]
    DecodeFailure {
        kind: ContentKind,
        #[source]
        source: DecodeError,
    },
}

impl ResourceError {
    /// Skips are expected and never counted as errors.
    pub fn is_silent(&self) -> bool {
        self.skip_reason().is_some()
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            ResourceError::HardNotFound => Some(SkipReason::HardNotFound),
            ResourceError::SoftNotFound(reason) => Some(*reason),
            ResourceError::UnexpectedStatus(code) => Some(SkipReason::UnexpectedStatus(*code)),
            ResourceError::ExtractionFailure { .. } | ResourceError::DecodeFailure { .. } => None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self.skip_reason() {
            Some(reason) => Outcome::Skipped(reason),
            None => Outcome::Failed,
        }
    }
}

impl From<SkipReason> for ResourceError {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::HardNotFound => ResourceError::HardNotFound,
            SkipReason::UnexpectedStatus(code) => ResourceError::UnexpectedStatus(code),
            soft => ResourceError::SoftNotFound(soft),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub record: ScrapedRecord,
    /// In-domain targets discovered in the resource; empty for PDF and iCal.
    pub links: Vec<CrawlTarget>,
}

impl Processed {
    pub fn outcome(&self) -> Outcome {
        Outcome::Emitted {
            kind: self.record.kind,
            links: self.links.clone(),
        }
    }
}

/// Status check, classification and extraction for one fetched response.
///
/// Pure with respect to crawl state: the same response always yields the same
/// result apart from the `date_scraped` stamp.
pub struct Pipeline {
    detector: SoftFailureDetector,
    html: HtmlExtractor,
    pdf: PdfExtractor,
    ical: IcalExtractor,
    clock: Clock,
}

impl Pipeline {
    pub fn new(config: &CrawlConfig) -> Self {
        let links = LinkDiscovery::with_max_links(
            config.domain.clone(),
            config.normalizer,
            config.max_links_per_page,
        );
        Self {
            detector: config.detector.clone(),
            html: HtmlExtractor::new(config.detector.clone(), links),
            pdf: PdfExtractor,
            ical: IcalExtractor::new(),
            clock: config.clock.clone(),
        }
    }

    pub fn process(
        &self,
        target: &CrawlTarget,
        response: &FetchResponse,
    ) -> Result<Processed, ResourceError> {
        if let Some(reason) = self.detector.check_status(response.status) {
            return Err(reason.into());
        }

        let content_type = response.content_type();
        let kind = classify(target.as_str(), content_type);
        let resource = Resource {
            target,
            base_url: &response.final_url,
            content_type,
            body: &response.body,
        };
        let Extracted {
            title,
            text,
            date_updated,
            links,
        } = self.extractor(kind).extract(&resource)?;

        let record = ScrapedRecord {
            url: target.as_str().to_string(),
            kind,
            title,
            text,
            date_scraped: (self.clock)(),
            date_updated,
        };
        Ok(Processed { record, links })
    }

    fn extractor(&self, kind: ContentKind) -> &dyn Extractor {
        match kind {
            ContentKind::Html => &self.html,
            ContentKind::Pdf => &self.pdf,
            ContentKind::Ical => &self.ical,
        }
    }
}
