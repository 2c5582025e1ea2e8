use crate::{ContentKind, CrawlTarget, JobId, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Start URLs, already normalized.
    SeedsSubmitted(Vec<CrawlTarget>),
    /// The fetcher returned a response; `final_target` is the normalized final URL.
    FetchCompleted {
        job_id: JobId,
        final_target: CrawlTarget,
    },
    /// The fetcher could not produce a response.
    FetchFailed { job_id: JobId },
    /// Extraction of a claimed response finished.
    ResourceProcessed { job_id: JobId, outcome: Outcome },
    /// External stop signal.
    StopRequested,
    /// Jobs that were queued but never started because dispatch halted.
    DispatchAbandoned(Vec<JobId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A record is ready; `links` are the in-domain targets found in it.
    Emitted {
        kind: ContentKind,
        links: Vec<CrawlTarget>,
    },
    Skipped(SkipReason),
    /// Extraction or decoding failed.
    Failed,
}
