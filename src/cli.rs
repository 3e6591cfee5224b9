//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::SurveyStatus;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SurveyStats - survey response store and analytics
///
/// Keeps surveys, respondents and responses in a JSON data file and
/// reports completion, drop-off, answer distributions and NPS.
///
/// Examples:
///   surveystats overview srv-feedback --from 2023-06-01
///   surveystats question srv-feedback q-features --format markdown
///   surveystats nps srv-feedback
///   surveystats submit srv-feedback --answers answers.json --email ada@example.com
///   surveystats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// JSON data file with surveys, respondents and responses
    ///
    /// Defaults to the config file setting, then surveys.json.
    #[arg(short, long, value_name = "FILE", env = "SURVEYSTATS_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// Owner whose surveys are visible
    #[arg(long, value_name = "ID", env = "SURVEYSTATS_OWNER", global = true)]
    pub owner: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .surveystats.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Number of surveys listed on the dashboard
    #[arg(long, value_name = "COUNT", global = true)]
    pub top: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .surveystats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Completion rate, daily trend, devices and drop-off for a survey
    Overview {
        survey: String,
        /// First completion date to include (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,
        /// Last completion date to include (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,
    },
    /// Skip rate and answer distribution for one question
    Question { survey: String, question: String },
    /// Net Promoter Score (defaults to the survey's first NPS question)
    Nps {
        survey: String,
        question: Option<String>,
    },
    /// Totals and top surveys for the owner
    Dashboard,
    /// List the owner's surveys
    Surveys {
        #[arg(long, value_name = "STATUS")]
        status: Option<StatusArg>,
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,
    },
    /// Show a survey and its questions
    Show { survey: String },
    /// List a survey's responses with respondent details
    Responses {
        survey: String,
        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,
        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,
    },
    /// Show an active survey as respondents see it
    Public { survey: String },
    /// Create a draft survey from a JSON file
    Create {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Replace a draft survey's content from a JSON file
    Update {
        survey: String,
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Publish a draft survey
    Publish { survey: String },
    /// Mark an active survey as completed
    Complete { survey: String },
    /// Delete a survey and its responses
    Delete { survey: String },
    /// Submit a response to an active survey
    Submit {
        survey: String,
        /// JSON object mapping question ids to answers
        #[arg(long, value_name = "FILE")]
        answers: PathBuf,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// List respondents with response counts
    Respondents {
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,
    },
    /// Show one respondent and their responses
    Respondent { id: String },
}

impl Command {
    /// Whether the command changes the data file.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Create { .. }
                | Command::Update { .. }
                | Command::Publish { .. }
                | Command::Complete { .. }
                | Command::Delete { .. }
                | Command::Submit { .. }
        )
    }

    /// Whether the command works on owner-scoped surveys.
    pub fn needs_owner(&self) -> bool {
        !matches!(
            self,
            Command::Submit { .. }
                | Command::Public { .. }
                | Command::Respondents { .. }
                | Command::Respondent { .. }
        )
    }
}

/// Output format for results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown tables
    Markdown,
}

/// Survey status filter for `surveys --status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusArg {
    Draft,
    Active,
    Completed,
}

impl From<StatusArg> for SurveyStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Draft => SurveyStatus::Draft,
            StatusArg::Active => SurveyStatus::Active,
            StatusArg::Completed => SurveyStatus::Completed,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let command = match self.command {
            Some(ref command) => command,
            None => return Err("No command given (see --help)".to_string()),
        };

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if command.needs_owner() && self.owner.as_deref().map_or(true, |o| o.trim().is_empty()) {
            return Err("An owner is required (--owner or SURVEYSTATS_OWNER)".to_string());
        }

        if let Some(0) = self.top {
            return Err("--top must be at least 1".to_string());
        }

        if let Command::Overview {
            from: Some(from),
            to: Some(to),
            ..
        }
        | Command::Responses {
            from: Some(from),
            to: Some(to),
            ..
        } = command
        {
            if from > to {
                return Err(format!("--from {} is after --to {}", from, to));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings. `--quiet` wins
    /// over a config file that enables verbose output.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The owner id, empty when not set (validated before use).
    pub fn owner_id(&self) -> &str {
        self.owner.as_deref().unwrap_or("")
    }
}
