//! Crawl engine: fetching, extraction pipeline and the async crawl runtime.
mod config;
mod dates;
mod decode;
mod engine;
mod extract;
mod fetch;
mod html;
mod ical;
mod links;
mod pdf;
mod pipeline;
mod sink;
mod types;

pub use config::{Clock, CrawlConfig};
pub use dates::{normalize_iso_date, parse_dotted_date, DateExtractor};
pub use decode::{decode_html, decode_utf8, DecodeError, DecodedText};
pub use engine::{CrawlReport, Crawler, EngineError, EngineHandle};
pub use extract::{Extracted, Extractor, Resource};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use html::HtmlExtractor;
pub use ical::IcalExtractor;
pub use links::{LinkDiscovery, DEFAULT_MAX_LINKS};
pub use pdf::{extract_pdf_text, PdfExtractor};
pub use pipeline::{Pipeline, Processed, ResourceError};
pub use sink::{JsonLinesSink, RecordSink, SinkError};
pub use types::{FailureKind, FetchError, FetchResponse, ScrapedRecord};
