//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.surveystats.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".surveystats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analytics settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// JSON data file holding surveys, respondents and responses.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            verbose: false,
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("surveys.json")
}

/// Analytics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Number of surveys listed on the dashboard.
    #[serde(default = "default_top_surveys_limit")]
    pub top_surveys_limit: usize,

    /// Decimal places for percentages in Markdown output.
    #[serde(default = "default_precision")]
    pub precision: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_surveys_limit: default_top_surveys_limit(),
            precision: default_precision(),
        }
    }
}

fn default_top_surveys_limit() -> usize {
    crate::analysis::DEFAULT_TOP_SURVEYS
}

fn default_precision() -> usize {
    1
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format used when `--format` is not given.
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty_json: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.general.data_file = data.clone();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        if let Some(limit) = args.top {
            self.analytics.top_surveys_limit = limit;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.data_file, PathBuf::from("surveys.json"));
        assert_eq!(config.analytics.top_surveys_limit, 5);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(config.report.pretty_json);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_file = "data/prod.json"
verbose = true

[analytics]
top_surveys_limit = 10

[report]
format = "markdown"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_file, PathBuf::from("data/prod.json"));
        assert!(config.general.verbose);
        assert_eq!(config.analytics.top_surveys_limit, 10);
        assert_eq!(config.analytics.precision, 1);
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(config.report.pretty_json);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[analytics]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.analytics.top_surveys_limit, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[analytics]\nprecision = 2\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.analytics.precision, 2);
        assert_eq!(config.general.data_file, PathBuf::from("surveys.json"));

        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
