use std::fmt;

use crate::{CrawlTarget, JobId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a newly admitted target.
    Fetch { job_id: JobId, target: CrawlTarget },
    /// The response was claimed; run extraction against `target`.
    Process { job_id: JobId, target: CrawlTarget },
    /// The response belongs to an already visited URL; drop it.
    Discard { job_id: JobId },
    /// Hand the extracted record of this job to the sink.
    Emit { job_id: JobId },
    /// Stop starting fetches and abandon the queued ones.
    HaltDispatch,
    Finish { reason: FinishReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every admitted target reached a terminal state.
    Finished,
    /// A stop was requested and in-flight work drained.
    Shutdown,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Finished => write!(f, "finished"),
            FinishReason::Shutdown => write!(f, "shutdown"),
        }
    }
}
