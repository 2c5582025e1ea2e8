use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::{io, mem, thread};

use crawl_core::{
    classify, is_in_domain, update, CrawlState, CrawlStats, CrawlTarget, Effect, FinishReason,
    JobId, Msg, UrlNormalizer,
};
use crawl_logging::{crawl_debug, crawl_error, crawl_info, crawl_warn};
use futures_util::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    CrawlConfig, FailureKind, FetchError, FetchResponse, Fetcher, Pipeline, Processed,
    RecordSink, ReqwestFetcher, ResourceError, ScrapedRecord,
};

/// Final state of a crawl run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub stats: CrawlStats,
    pub reason: FinishReason,
    pub records_written: usize,
    pub sink_errors: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("crawl thread panicked")]
    Panicked,
}

/// Runs a crawl: seeds the state machine, executes its effects and feeds
/// fetch and extraction results back until the crawl finishes.
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    pipeline: Arc<Pipeline>,
}

impl Crawler {
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let pipeline = Arc::new(Pipeline::new(&config));
        Self {
            config,
            fetcher,
            pipeline,
        }
    }

    pub fn with_reqwest(config: CrawlConfig) -> Self {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        Self::new(config, fetcher)
    }

    pub async fn run(&self, sink: &mut dyn RecordSink, cancel: CancellationToken) -> CrawlReport {
        crawl_info!(
            "Starting crawl of {} with {} seed(s)",
            self.config.domain,
            self.config.seeds.len()
        );
        let mut controller = Controller::new(self, sink);
        controller.handle(Msg::SeedsSubmitted(self.seed_targets()));

        loop {
            controller.dispatch();
            if controller.finished() {
                break;
            }
            if controller.tasks.is_empty() {
                crawl_error!("Crawl stalled with no work in flight");
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled(), if !controller.halted => {
                    crawl_info!("Stop requested; draining in-flight work");
                    controller.handle(Msg::StopRequested);
                }
                Some(joined) = controller.tasks.join_next() => match joined {
                    Ok(output) => controller.complete(output),
                    Err(err) => crawl_error!("Crawl task did not complete: {}", err),
                },
            }
        }

        controller.into_report()
    }

    fn seed_targets(&self) -> Vec<CrawlTarget> {
        self.config
            .seeds
            .iter()
            .filter_map(|seed| match self.config.normalizer.normalize(seed) {
                Ok(target) => Some(target),
                Err(err) => {
                    crawl_warn!("Ignoring seed: {}", err);
                    None
                }
            })
            .filter(|target| {
                let in_domain = target
                    .to_url()
                    .is_some_and(|url| is_in_domain(&url, &self.config.domain));
                if !in_domain {
                    crawl_warn!("Ignoring seed outside {}: {}", self.config.domain, target);
                }
                in_domain
            })
            .collect()
    }
}

enum TaskOutput {
    Fetched {
        job_id: JobId,
        target: CrawlTarget,
        result: Result<FetchResponse, FetchError>,
    },
    Processed {
        job_id: JobId,
        target: CrawlTarget,
        result: Result<Processed, ResourceError>,
    },
}

// Sole owner of the crawl state. Tasks only report back through `complete`.
struct Controller<'a> {
    state: CrawlState,
    fetcher: Arc<dyn Fetcher>,
    pipeline: Arc<Pipeline>,
    normalizer: UrlNormalizer,
    sink: &'a mut dyn RecordSink,
    max_concurrency: usize,
    queue: VecDeque<(JobId, CrawlTarget)>,
    responses: HashMap<JobId, FetchResponse>,
    records: HashMap<JobId, ScrapedRecord>,
    tasks: JoinSet<TaskOutput>,
    fetching: usize,
    halted: bool,
    records_written: usize,
    sink_errors: usize,
}

impl<'a> Controller<'a> {
    fn new(crawler: &Crawler, sink: &'a mut dyn RecordSink) -> Self {
        Self {
            state: CrawlState::new(),
            fetcher: crawler.fetcher.clone(),
            pipeline: crawler.pipeline.clone(),
            normalizer: crawler.config.normalizer,
            sink,
            max_concurrency: crawler.config.max_concurrency.max(1),
            queue: VecDeque::new(),
            responses: HashMap::new(),
            records: HashMap::new(),
            tasks: JoinSet::new(),
            fetching: 0,
            halted: false,
            records_written: 0,
            sink_errors: 0,
        }
    }

    fn finished(&self) -> bool {
        self.state.finish_reason().is_some()
    }

    fn handle(&mut self, msg: Msg) {
        let mut pending = VecDeque::from([msg]);
        while let Some(msg) = pending.pop_front() {
            let (state, effects) = update(mem::take(&mut self.state), msg);
            self.state = state;
            for effect in effects {
                if let Some(follow_up) = self.apply(effect) {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    fn apply(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::Fetch { job_id, target } => {
                self.queue.push_back((job_id, target));
            }
            Effect::Process { job_id, target } => {
                if let Some(response) = self.responses.remove(&job_id) {
                    self.spawn_process(job_id, target, response);
                }
            }
            Effect::Discard { job_id } => {
                if let Some(response) = self.responses.remove(&job_id) {
                    crawl_debug!("Already visited, discarding {}", response.final_url);
                }
            }
            Effect::Emit { job_id } => {
                if let Some(record) = self.records.remove(&job_id) {
                    self.emit(&record);
                }
            }
            Effect::HaltDispatch => {
                self.halted = true;
                let abandoned: Vec<JobId> = self.queue.drain(..).map(|(job_id, _)| job_id).collect();
                if !abandoned.is_empty() {
                    crawl_info!("Abandoning {} queued fetch(es)", abandoned.len());
                    return Some(Msg::DispatchAbandoned(abandoned));
                }
            }
            Effect::Finish { reason } => {
                crawl_debug!("Crawl state finished: {}", reason);
            }
        }
        None
    }

    fn dispatch(&mut self) {
        while !self.halted && self.fetching < self.max_concurrency {
            let Some((job_id, target)) = self.queue.pop_front() else {
                break;
            };
            crawl_debug!("Fetching {}", target);
            let fetcher = self.fetcher.clone();
            self.fetching += 1;
            self.tasks.spawn(async move {
                let result = AssertUnwindSafe(fetcher.fetch(target.as_str()))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(FetchError::new(FailureKind::Internal, "fetcher panicked"))
                    });
                TaskOutput::Fetched {
                    job_id,
                    target,
                    result,
                }
            });
        }
    }

    fn spawn_process(&mut self, job_id: JobId, target: CrawlTarget, response: FetchResponse) {
        let pipeline = self.pipeline.clone();
        self.tasks.spawn_blocking(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                pipeline.process(&target, &response)
            }))
            .unwrap_or_else(|_| {
                Err(ResourceError::ExtractionFailure {
                    kind: classify(target.as_str(), response.content_type()),
                    message: "extractor panicked".to_string(),
                })
            });
            TaskOutput::Processed {
                job_id,
                target,
                result,
            }
        });
    }

    fn complete(&mut self, output: TaskOutput) {
        match output {
            TaskOutput::Fetched {
                job_id,
                target,
                result,
            } => {
                self.fetching = self.fetching.saturating_sub(1);
                match result {
                    Ok(response) => {
                        // Unparseable final URLs stay attributed to the requested target.
                        let final_target = self
                            .normalizer
                            .normalize(&response.final_url)
                            .unwrap_or_else(|_| target.clone());
                        if response.redirect_count > 0 {
                            crawl_debug!(
                                "{} redirected {} time(s) to {}",
                                target,
                                response.redirect_count,
                                final_target
                            );
                        }
                        self.responses.insert(job_id, response);
                        self.handle(Msg::FetchCompleted {
                            job_id,
                            final_target,
                        });
                        self.responses.remove(&job_id);
                    }
                    Err(err) => {
                        crawl_warn!("Fetch failed for {}: {}", target, err);
                        self.handle(Msg::FetchFailed { job_id });
                    }
                }
            }
            TaskOutput::Processed {
                job_id,
                target,
                result,
            } => {
                let outcome = match result {
                    Ok(processed) => {
                        let outcome = processed.outcome();
                        self.records.insert(job_id, processed.record);
                        outcome
                    }
                    Err(err) => {
                        if err.is_silent() {
                            crawl_debug!("Skipping {}: {}", err, target);
                        } else {
                            let cause = std::error::Error::source(&err)
                                .map(|source| format!(": {source}"))
                                .unwrap_or_default();
                            crawl_warn!("Failed to process {}: {}{}", target, err, cause);
                        }
                        err.outcome()
                    }
                };
                self.handle(Msg::ResourceProcessed { job_id, outcome });
                self.records.remove(&job_id);
            }
        }
    }

    fn emit(&mut self, record: &ScrapedRecord) {
        match self.sink.accept(record) {
            Ok(()) => {
                self.records_written += 1;
                crawl_debug!("Emitted {} record for {}", record.kind, record.url);
            }
            Err(err) => {
                self.sink_errors += 1;
                crawl_error!("Failed to write record for {}: {}", record.url, err);
            }
        }
    }

    fn into_report(self) -> CrawlReport {
        let Controller {
            state,
            sink,
            records_written,
            mut sink_errors,
            ..
        } = self;
        if let Err(err) = sink.flush() {
            sink_errors += 1;
            crawl_error!("Failed to flush output: {}", err);
        }

        let stats = state.stats();
        let reason = state.finish_reason().unwrap_or(FinishReason::Shutdown);
        log_summary(&stats, reason);

        CrawlReport {
            stats,
            reason,
            records_written,
            sink_errors,
        }
    }
}

fn log_summary(stats: &CrawlStats, reason: FinishReason) {
    crawl_info!("=== CRAWLING SUMMARY ===");
    for (name, value) in stats.counters() {
        crawl_info!("{}: {}", name.to_ascii_uppercase(), value);
    }
    crawl_info!("Crawl closed because: {}", reason);
}

/// A crawl running on its own thread and runtime.
pub struct EngineHandle {
    cancel: CancellationToken,
    thread: thread::JoinHandle<Result<CrawlReport, EngineError>>,
}

impl EngineHandle {
    pub fn start(crawler: Crawler, sink: Box<dyn RecordSink>) -> Self {
        Self::spawn(crawler, sink, false)
    }

    /// Like [`start`](Self::start), and Ctrl-C requests a graceful stop.
    pub fn start_with_ctrl_c(crawler: Crawler, sink: Box<dyn RecordSink>) -> Self {
        Self::spawn(crawler, sink, true)
    }

    fn spawn(crawler: Crawler, mut sink: Box<dyn RecordSink>, listen_ctrl_c: bool) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let thread = thread::spawn(move || -> Result<CrawlReport, EngineError> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            Ok(runtime.block_on(async move {
                if listen_ctrl_c {
                    let signal_token = token.clone();
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            crawl_info!("Ctrl-C received");
                            signal_token.cancel();
                        }
                    });
                }
                crawler.run(sink.as_mut(), token).await
            }))
        });
        Self { cancel, thread }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn wait(self) -> Result<CrawlReport, EngineError> {
        self.thread.join().map_err(|_| EngineError::Panicked)?
    }
}
