use crate::{CrawlState, CrawlTarget, Effect, JobId, Msg, Outcome, ResourceState, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: CrawlState, msg: Msg) -> (CrawlState, Vec<Effect>) {
    let mut effects = match msg {
        Msg::SeedsSubmitted(targets) => match state.session() {
            SessionState::Stopping | SessionState::Finished => return (state, Vec::new()),
            SessionState::Idle => {
                state.start_session();
                admit_all(&mut state, targets)
            }
            SessionState::Running => admit_all(&mut state, targets),
        },
        Msg::FetchCompleted {
            job_id,
            final_target,
        } => claim_response(&mut state, job_id, final_target),
        Msg::FetchFailed { job_id } => {
            if state.job_state(job_id) == Some(ResourceState::Dispatched) {
                state.transition(job_id, ResourceState::FetchFailed);
                state.stats_mut().record_fetch_error();
            }
            Vec::new()
        }
        Msg::ResourceProcessed { job_id, outcome } => apply_outcome(&mut state, job_id, outcome),
        Msg::StopRequested => match state.session() {
            SessionState::Idle | SessionState::Running => {
                state.request_stop();
                vec![Effect::HaltDispatch]
            }
            SessionState::Stopping | SessionState::Finished => Vec::new(),
        },
        Msg::DispatchAbandoned(job_ids) => {
            for job_id in job_ids {
                if state.job_state(job_id) == Some(ResourceState::Dispatched) {
                    state.transition(job_id, ResourceState::Abandoned);
                }
            }
            Vec::new()
        }
    };

    if let Some(reason) = state.try_finish() {
        effects.push(Effect::Finish { reason });
    }

    (state, effects)
}

fn admit_all(state: &mut CrawlState, targets: Vec<CrawlTarget>) -> Vec<Effect> {
    targets
        .into_iter()
        .filter_map(|target| {
            state
                .admit(target.clone())
                .map(|job_id| Effect::Fetch { job_id, target })
        })
        .collect()
}

fn claim_response(state: &mut CrawlState, job_id: JobId, final_target: CrawlTarget) -> Vec<Effect> {
    if state.job_state(job_id) != Some(ResourceState::Dispatched) {
        return Vec::new();
    }
    let same_target = state.job_target(job_id) == Some(&final_target);
    if same_target || state.claim_redirect(job_id, final_target.clone()) {
        state.transition(job_id, ResourceState::Processing);
        vec![Effect::Process {
            job_id,
            target: final_target,
        }]
    } else {
        state.transition(job_id, ResourceState::Discarded);
        vec![Effect::Discard { job_id }]
    }
}

fn apply_outcome(state: &mut CrawlState, job_id: JobId, outcome: Outcome) -> Vec<Effect> {
    if state.job_state(job_id) != Some(ResourceState::Processing) {
        return Vec::new();
    }
    match outcome {
        Outcome::Emitted { kind, links } => {
            state.transition(job_id, ResourceState::Emitted(kind));
            state.stats_mut().record_emitted(kind);
            let mut effects = vec![Effect::Emit { job_id }];
            // No new fetches once a stop was requested.
            if state.session() == SessionState::Running {
                effects.extend(admit_all(state, links));
            }
            effects
        }
        Outcome::Skipped(reason) => {
            state.transition(job_id, ResourceState::Skipped(reason));
            Vec::new()
        }
        Outcome::Failed => {
            state.transition(job_id, ResourceState::Failed);
            state.stats_mut().record_error();
            Vec::new()
        }
    }
}
