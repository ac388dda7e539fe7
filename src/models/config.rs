//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::PageSelectors;
use crate::services::scanner::parse_selector;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Scheduling site endpoints and term
    #[serde(default)]
    pub site: SiteConfig,

    /// Page selectors for prerequisite and search-result pages
    #[serde(default)]
    pub parser: PageSelectors,

    /// Output file and write-guard settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.site.term.trim().is_empty() {
            return Err(AppError::validation("site.term is empty"));
        }
        self.site.base()?;
        for selector in self.parser.all() {
            parse_selector(selector)?;
        }
        if self.parser.or_token.trim().is_empty() {
            return Err(AppError::validation("parser.or_token is empty"));
        }
        if self.output.file_name.trim().is_empty() || self.output.partial_file_name.trim().is_empty()
        {
            return Err(AppError::validation("output file names must not be empty"));
        }
        if self.output.file_name == self.output.partial_file_name {
            return Err(AppError::validation(
                "output.partial_file_name must differ from output.file_name",
            ));
        }
        if self.output.max_drop_percent > 100 {
            return Err(AppError::validation(
                "output.max_drop_percent must be within 0..=100",
            ));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between prerequisite requests of one department, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum number of departments crawled concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Scheduling site endpoints, relative to `base_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Term code (e.g., "SP26")
    #[serde(default = "defaults::term")]
    pub term: String,

    /// Page fetched once to establish session cookies
    #[serde(default = "defaults::warmup_path")]
    pub warmup_path: String,

    #[serde(default = "defaults::department_list_path")]
    pub department_list_path: String,

    /// Form target of the course search
    #[serde(default = "defaults::search_path")]
    pub search_path: String,

    /// Printable results of the last search in the session
    #[serde(default = "defaults::results_path")]
    pub results_path: String,

    #[serde(default = "defaults::prereq_path")]
    pub prereq_path: String,

    /// Text shown on a results page when the search matched nothing
    #[serde(default = "defaults::no_results_marker")]
    pub no_results_marker: String,
}

impl SiteConfig {
    /// Parsed base URL, with a trailing slash so relative paths join under it.
    pub fn base(&self) -> Result<Url> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?)
    }

    /// Absolute URL of an endpoint path.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base()?.join(path)?)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            term: defaults::term(),
            warmup_path: defaults::warmup_path(),
            department_list_path: defaults::department_list_path(),
            search_path: defaults::search_path(),
            results_path: defaults::results_path(),
            prereq_path: defaults::prereq_path(),
            no_results_marker: defaults::no_results_marker(),
        }
    }
}

/// Output file and write-guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Catalog file name within the storage directory
    #[serde(default = "defaults::file_name")]
    pub file_name: String,

    /// File that receives completed batches when a run aborts
    #[serde(default = "defaults::partial_file_name")]
    pub partial_file_name: String,

    /// Pretty-print the JSON document
    #[serde(default = "defaults::pretty")]
    pub pretty: bool,

    /// Persist completed batches on a fatal error
    #[serde(default = "defaults::persist_partial")]
    pub persist_partial: bool,

    /// Maximum allowed drop in record count against the previous catalog (0-100)
    #[serde(default = "defaults::max_drop_percent")]
    pub max_drop_percent: u8,

    /// Previous catalogs smaller than this are not compared against
    #[serde(default = "defaults::min_baseline")]
    pub min_baseline: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: defaults::file_name(),
            partial_file_name: defaults::partial_file_name(),
            pretty: defaults::pretty(),
            persist_partial: defaults::persist_partial(),
            max_drop_percent: defaults::max_drop_percent(),
            min_baseline: defaults::min_baseline(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        0
    }
    pub fn max_concurrent() -> usize {
        8
    }

    // Site defaults
    pub fn base_url() -> String {
        "https://act.ucsd.edu/scheduleOfClasses/".into()
    }
    pub fn term() -> String {
        "SP26".into()
    }
    pub fn warmup_path() -> String {
        "scheduleOfClassesFacultyResult.htm".into()
    }
    pub fn department_list_path() -> String {
        "department-list.json".into()
    }
    pub fn search_path() -> String {
        "scheduleOfClassesFacultyResult.htm".into()
    }
    pub fn results_path() -> String {
        "scheduleOfClassesFacultyResultPrint.htm".into()
    }
    pub fn prereq_path() -> String {
        "scheduleOfClassesPreReq.htm".into()
    }
    pub fn no_results_marker() -> String {
        "No Result Found".into()
    }

    // Output defaults
    pub fn file_name() -> String {
        "SOC_list.json".into()
    }
    pub fn partial_file_name() -> String {
        "SOC_list.partial.json".into()
    }
    pub fn pretty() -> bool {
        true
    }
    pub fn persist_partial() -> bool {
        true
    }
    pub fn max_drop_percent() -> u8 {
        20
    }
    pub fn min_baseline() -> usize {
        10
    }
}
