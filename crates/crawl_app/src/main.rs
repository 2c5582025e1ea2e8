mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use crawl_engine::{Crawler, EngineHandle, JsonLinesSink};
use crawl_logging::{crawl_error, crawl_info};

use crate::config::AppConfig;

fn main() -> ExitCode {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match AppConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("campus-crawler: {err}");
            return ExitCode::FAILURE;
        }
    };
    let level = match config.level_filter() {
        Ok(level) => level,
        Err(err) => {
            eprintln!("campus-crawler: {err}");
            return ExitCode::FAILURE;
        }
    };
    crawl_logging::initialize(config.log_target.into(), level);

    let sink = match JsonLinesSink::create(&config.output) {
        Ok(sink) => sink,
        Err(err) => {
            crawl_error!("Cannot open output {:?}: {}", config.output, err);
            return ExitCode::FAILURE;
        }
    };

    let crawler = Crawler::with_reqwest(config.crawl_config());
    let handle = EngineHandle::start_with_ctrl_c(crawler, Box::new(sink));
    match handle.wait() {
        Ok(report) => {
            crawl_info!(
                "Wrote {} record(s) to {:?}",
                report.records_written,
                config.output
            );
            if report.sink_errors > 0 {
                crawl_error!("{} record(s) could not be written", report.sink_errors);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            crawl_error!("Crawl aborted: {}", err);
            ExitCode::FAILURE
        }
    }
}
