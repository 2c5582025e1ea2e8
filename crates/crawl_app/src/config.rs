//! Runner configuration, read from an optional RON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crawl_core::UrlNormalizer;
use crawl_engine::{CrawlConfig, FetchSettings};
use crawl_logging::LogDestination;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

/// Every field is optional in the file; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub domain: String,
    pub seeds: Vec<String>,
    pub output: PathBuf,
    pub max_concurrency: usize,
    pub max_links_per_page: usize,
    pub strip_fragments: bool,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: Option<String>,
    pub log_level: String,
    pub log_target: LogTarget,
}

impl Default for AppConfig {
    fn default() -> Self {
        let crawl = CrawlConfig::default();
        let fetch = FetchSettings::default();
        Self {
            domain: crawl.domain,
            seeds: crawl.seeds,
            output: PathBuf::from("output/thws.jsonl"),
            max_concurrency: crawl.max_concurrency,
            max_links_per_page: crawl.max_links_per_page,
            strip_fragments: crawl.normalizer.strip_fragment,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_bytes: fetch.max_bytes,
            user_agent: None,
            log_level: "info".to_string(),
            log_target: LogTarget::Both,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.log_level.trim())
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn crawl_config(&self) -> CrawlConfig {
        let mut config = CrawlConfig::for_domain(self.domain.clone(), self.seeds.clone());
        config.max_concurrency = self.max_concurrency;
        config.max_links_per_page = self.max_links_per_page;
        config.normalizer = UrlNormalizer::new(self.strip_fragments);
        config.fetch.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        config.fetch.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config.fetch.redirect_limit = self.redirect_limit;
        config.fetch.max_bytes = self.max_bytes;
        if let Some(agent) = &self.user_agent {
            config.fetch.user_agent = agent.clone();
        }
        config
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Invalid("domain must not be empty".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        self.level_filter().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::{AppConfig, ConfigError, LogTarget};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn missing_path_gives_defaults() {
        let config = AppConfig::load_or_default(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.domain, "thws.de");
        assert_eq!(config.output, Path::new("output/thws.jsonl"));
        assert_eq!(
            config.seeds,
            vec!["https://www.thws.de/".to_string(), "https://fiw.thws.de/".to_string()]
        );
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let file = write_config(
            r#"(
                seeds: ["https://fiw.thws.de/"],
                output: "out/fiw.jsonl",
                max_concurrency: 4,
                strip_fragments: true,
                request_timeout_secs: 5,
                log_level: "debug",
                log_target: Terminal,
            )"#,
        );

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.domain, "thws.de");
        assert_eq!(config.seeds, vec!["https://fiw.thws.de/".to_string()]);
        assert_eq!(config.log_target, LogTarget::Terminal);

        let crawl = config.crawl_config();
        assert_eq!(crawl.max_concurrency, 4);
        assert!(crawl.normalizer.strip_fragment);
        assert_eq!(crawl.fetch.request_timeout, Duration::from_secs(5));
        assert_eq!(crawl.fetch.allowed_domains, vec!["thws.de".to_string()]);
        assert_eq!(config.level_filter().unwrap(), log::LevelFilter::Debug);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let err = AppConfig::load(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let file = write_config("(max_concurrency: \"many\")");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero = write_config("(max_concurrency: 0)");
        assert!(matches!(
            AppConfig::load(zero.path()).unwrap_err(),
            ConfigError::Invalid(_)
        ));

        let level = write_config("(log_level: \"loud\")");
        assert!(matches!(
            AppConfig::load(level.path()).unwrap_err(),
            ConfigError::InvalidLogLevel(_)
        ));
    }
}
