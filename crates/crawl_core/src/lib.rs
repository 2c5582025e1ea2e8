//! Crawl core: pure crawl-controller state machine and the text/URL policies it relies on.
mod classify;
mod effect;
mod msg;
mod soft404;
mod state;
mod stats;
mod target;
mod text;
mod update;

pub use classify::{classify, ContentKind};
pub use effect::{Effect, FinishReason};
pub use msg::{Msg, Outcome};
pub use soft404::{SkipReason, SoftFailureDetector};
pub use state::{CrawlState, JobId, ResourceState, SessionState};
pub use stats::CrawlStats;
pub use target::{is_in_domain, normalize_url, CrawlTarget, UrlError, UrlNormalizer};
pub use text::{clean_text, deduplicate_lines};
pub use update::update;
