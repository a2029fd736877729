use crate::error::{IngestError, Result};
use crate::segment::{ParseOptions, DEFAULT_SEGMENT_DURATION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Docx,
    Json,
    Srt,
    Srtx,
    Text,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Docx => write!(f, "docx"),
            InputFormat::Json => write!(f, "json"),
            InputFormat::Srt => write!(f, "srt"),
            InputFormat::Srtx => write!(f, "srtx"),
            InputFormat::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docx" => Ok(InputFormat::Docx),
            "json" => Ok(InputFormat::Json),
            "srt" => Ok(InputFormat::Srt),
            "srtx" => Ok(InputFormat::Srtx),
            "txt" | "text" | "md" | "markdown" => Ok(InputFormat::Text),
            _ => Err(format!(
                "Unknown input format: {}. Use 'docx', 'json', 'srt', 'srtx' or 'txt'",
                s
            )),
        }
    }
}

impl InputFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse().map_err(|_| {
            IngestError::UnsupportedFormat(format!(
                "{} (extension '{}')",
                path.display(),
                ext
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Srt,
    Srtx,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Srtx => write!(f, "srtx"),
        }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
            OutputFormat::Srtx => "srtx",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "srtx" => Ok(OutputFormat::Srtx),
            _ => Err(format!(
                "Unknown format: {}. Use 'json', 'srt', or 'srtx'",
                s
            )),
        }
    }
}

/// Connection settings for the layout oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Base URLs tried in order.
    pub endpoints: Vec<String>,
    /// Requests per endpoint before moving on.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            endpoints: vec!["https://generativelanguage.googleapis.com/v1beta".to_string()],
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub segment_duration: f64,
    pub concurrency: usize,
    pub default_output: OutputFormat,
    pub oracle: OracleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_duration: DEFAULT_SEGMENT_DURATION,
            concurrency: 4,
            default_output: OutputFormat::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl Config {
    /// Config file (if any) with environment variables on top.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read one TOML file. A file that does not parse is ignored with a warning.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Override fields from `PAPERCUT_*` / `GEMINI_API_KEY` style variables.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(duration) = lookup("PAPERCUT_SEGMENT_DURATION") {
            match duration.parse() {
                Ok(d) => self.segment_duration = d,
                Err(_) => warn!("Ignoring PAPERCUT_SEGMENT_DURATION={:?}", duration),
            }
        }
        if let Some(concurrency) = lookup("PAPERCUT_CONCURRENCY") {
            match concurrency.parse() {
                Ok(c) => self.concurrency = c,
                Err(_) => warn!("Ignoring PAPERCUT_CONCURRENCY={:?}", concurrency),
            }
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.oracle.api_key = Some(key);
        }
        if let Some(model) = lookup("PAPERCUT_ORACLE_MODEL") {
            self.oracle.model = model;
        }
        if let Some(endpoints) = lookup("PAPERCUT_ORACLE_ENDPOINTS") {
            self.oracle.endpoints = endpoints
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.segment_duration.is_finite() || self.segment_duration <= 0.0 {
            return Err(IngestError::Config(format!(
                "Segment duration must be a positive number of seconds, got {}",
                self.segment_duration
            )));
        }

        if self.concurrency == 0 {
            return Err(IngestError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.oracle.api_key.is_some() {
            if self.oracle.endpoints.is_empty() {
                return Err(IngestError::Config(
                    "GEMINI_API_KEY is set but no oracle endpoints are configured".to_string(),
                ));
            }
            if self.oracle.max_attempts == 0 {
                return Err(IngestError::Config(
                    "Oracle max_attempts must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            segment_duration: self.segment_duration,
        }
    }

    /// Oracle settings, only when an API key is available.
    pub fn oracle(&self) -> Option<OracleConfig> {
        self.oracle.api_key.as_ref().map(|_| self.oracle.clone())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("papercut").join("config.toml"))
    }
}
