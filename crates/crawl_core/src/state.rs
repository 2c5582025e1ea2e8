use std::collections::{BTreeMap, HashSet};

use crate::{ContentKind, CrawlStats, CrawlTarget, FinishReason, SkipReason};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopping,
    Finished,
}

/// Lifecycle of a single admitted target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Dispatched,
    Processing,
    Emitted(ContentKind),
    Skipped(SkipReason),
    Failed,
    FetchFailed,
    Discarded,
    Abandoned,
}

impl ResourceState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResourceState::Dispatched | ResourceState::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    target: CrawlTarget,
    state: ResourceState,
}

/// Controller state: visited set, per-job lifecycle and run counters.
///
/// Only [`update`](crate::update) mutates it, which keeps every
/// "is it visited / mark visited" pair in a single step.
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    session: SessionState,
    next_job_id: JobId,
    jobs: BTreeMap<JobId, Job>,
    visited: HashSet<CrawlTarget>,
    in_flight: usize,
    stats: CrawlStats,
    finish_reason: Option<FinishReason>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn is_visited(&self, target: &CrawlTarget) -> bool {
        self.visited.contains(target)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Jobs that are dispatched or processing.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn job_state(&self, job_id: JobId) -> Option<ResourceState> {
        self.jobs.get(&job_id).map(|job| job.state)
    }

    pub fn job_target(&self, job_id: JobId) -> Option<&CrawlTarget> {
        self.jobs.get(&job_id).map(|job| &job.target)
    }

    pub(crate) fn start_session(&mut self) {
        self.session = SessionState::Running;
    }

    pub(crate) fn request_stop(&mut self) {
        self.session = SessionState::Stopping;
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CrawlStats {
        &mut self.stats
    }

    /// Marks `target` visited and opens a job for it, unless it was seen before.
    pub(crate) fn admit(&mut self, target: CrawlTarget) -> Option<JobId> {
        if !self.visited.insert(target.clone()) {
            return None;
        }
        self.next_job_id += 1;
        let job_id = self.next_job_id;
        self.jobs.insert(
            job_id,
            Job {
                target,
                state: ResourceState::Dispatched,
            },
        );
        self.in_flight += 1;
        Some(job_id)
    }

    /// Claims `final_target` for a job whose response was redirected.
    /// Returns false when another job already owns that URL.
    pub(crate) fn claim_redirect(&mut self, job_id: JobId, final_target: CrawlTarget) -> bool {
        if !self.visited.insert(final_target.clone()) {
            return false;
        }
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.target = final_target;
        }
        true
    }

    pub(crate) fn transition(&mut self, job_id: JobId, next: ResourceState) {
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };
        if !job.state.is_terminal() && next.is_terminal() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        job.state = next;
    }

    /// Moves a running or stopping session to finished once nothing is in flight.
    pub(crate) fn try_finish(&mut self) -> Option<FinishReason> {
        if self.in_flight > 0 {
            return None;
        }
        let reason = match self.session {
            SessionState::Running => FinishReason::Finished,
            SessionState::Stopping => FinishReason::Shutdown,
            SessionState::Idle | SessionState::Finished => return None,
        };
        self.session = SessionState::Finished;
        self.finish_reason = Some(reason);
        Some(reason)
    }
}
