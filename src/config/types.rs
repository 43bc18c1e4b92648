use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site description
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host of the directory site
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Path of the paginated listing
    #[serde(rename = "listing-path", default = "default_listing_path")]
    pub listing_path: String,

    /// Query parameter carrying the 1-based page number
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Selector preset to use
    #[serde(default)]
    pub variant: SiteVariant,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_path: default_listing_path(),
            page_param: default_page_param(),
            user_agent: default_user_agent(),
            variant: SiteVariant::default(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Size of the worker pool used by both phases
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries applied to transient failures
    #[serde(rename = "retry-times", default = "default_retry_times")]
    pub retry_times: u32,

    /// Delay between retries (milliseconds)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,

    /// How the page count is determined when no override is given
    #[serde(default)]
    pub pagination: PaginationMode,

    /// Operator-provided page count; skips the last-page indicator
    #[serde(rename = "page-count", default)]
    pub page_count: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
            retry_times: default_retry_times(),
            retry_delay_ms: 0,
            pagination: PaginationMode::default(),
            page_count: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Export path; `{date}` expands to the local date as YYYYMMDD
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Export format
    #[serde(default)]
    pub format: OutputFormat,

    /// Field separator for CSV export
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Prefix CSV output with a UTF-8 byte order mark, so spreadsheet tools
    /// detect the encoding
    #[serde(rename = "utf8-bom", default = "default_utf8_bom")]
    pub utf8_bom: bool,

    /// Optional markdown run report
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::default(),
            delimiter: default_delimiter(),
            utf8_bom: default_utf8_bom(),
            summary_path: None,
        }
    }
}

impl OutputConfig {
    /// Resolves the export path for the given date stamp (YYYYMMDD)
    pub fn resolved_path(&self, date_stamp: &str) -> PathBuf {
        PathBuf::from(self.path.replace("{date}", date_stamp))
    }
}

/// Historical selector sets of the directory site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteVariant {
    /// Current page layout, detail links filtered by path shape
    #[default]
    Current,
    /// Older page layout, every styled listing link is followed
    Legacy,
}

impl FromStr for SiteVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown site variant '{}'", other)),
        }
    }
}

/// Page count discovery mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// Read the last-page indicator, fall back to discovery when absent
    #[default]
    Auto,
    /// Always walk pages one at a time until an empty page
    Discovery,
}

/// Export format of the record file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" | "jsonlines" => Ok(Self::Jsonl),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

fn default_base_url() -> String {
    "https://www.gob.pe".to_string()
}

fn default_listing_path() -> String {
    "/funcionariospublicos".to_string()
}

fn default_page_param() -> String {
    "sheet".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36"
        .to_string()
}

fn default_workers() -> usize {
    9
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_times() -> u32 {
    2
}

fn default_output_path() -> String {
    "funcionarios/funcionarios_publicos_{date}.csv".to_string()
}

fn default_delimiter() -> char {
    ';'
}

fn default_utf8_bom() -> bool {
    true
}
