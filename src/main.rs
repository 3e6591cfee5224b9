//! SurveyStats - survey response store and analytics
//!
//! A CLI that keeps surveys, respondents and responses in a JSON data
//! file and reports completion rates, drop-off, answer distributions,
//! NPS and owner dashboards.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad input, invalid state, data file problems)
//!   2 - Requested survey, question or respondent not found

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use error::StoreError;
use report::Report;
use std::path::Path;
use store::{
    Dataset, PublicSurvey, RespondentInput, Submission, SurveyDraft, SurveyFilter, SurveyService,
};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration (general.verbose feeds the log level)
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    debug!("SurveyStats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            let not_found = e
                .downcast_ref::<StoreError>()
                .map(StoreError::is_not_found)
                .unwrap_or(false);
            std::process::exit(if not_found { 2 } else { 1 });
        }
    }
}

/// Handle --init-config: generate a default .surveystats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so rendered reports on stdout stay parseable.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load the data file, run the command, save if it changed anything,
/// and write the rendered result.
async fn run(args: Args, config: Config) -> Result<()> {
    let command = args
        .command
        .clone()
        .context("No command given (see --help)")?;
    let data_path = config.general.data_file.clone();

    let dataset = Dataset::load(&data_path)
        .await
        .with_context(|| format!("Failed to load data file {}", data_path.display()))?;
    let mut service = SurveyService::new(dataset);

    let report = execute(&mut service, &command, &args, &config).await?;

    if command.mutates() {
        service
            .dataset()
            .save(&data_path)
            .await
            .with_context(|| format!("Failed to save data file {}", data_path.display()))?;
        info!("Saved {}", data_path.display());
    }

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report, config.report.pretty_json)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, config.analytics.precision)
        }
    };

    match args.output {
        Some(ref path) => {
            tokio::fs::write(path, &output)
                .await
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// Run a single command against the service.
async fn execute(
    service: &mut SurveyService,
    command: &Command,
    args: &Args,
    config: &Config,
) -> Result<Report> {
    let owner = args.owner_id();

    let report = match command {
        Command::Overview { survey, from, to } => {
            Report::Overview(service.survey_overview(owner, survey, *from, *to)?)
        }
        Command::Question { survey, question } => {
            Report::Question(service.question_analytics(owner, survey, question)?)
        }
        Command::Nps { survey, question } => {
            Report::Nps(service.nps(owner, survey, question.as_deref())?)
        }
        Command::Dashboard => {
            Report::Dashboard(service.dashboard(owner, config.analytics.top_surveys_limit))
        }
        Command::Surveys { status, search } => {
            let filter = SurveyFilter {
                status: status.map(Into::into),
                search: search.clone(),
            };
            Report::Surveys(service.list_surveys(owner, &filter))
        }
        Command::Show { survey } => Report::Survey(service.get_survey(owner, survey)?.clone()),
        Command::Responses { survey, from, to } => {
            Report::Responses(service.list_responses(owner, survey, *from, *to)?)
        }
        Command::Public { survey } => {
            Report::PublicSurvey(PublicSurvey::from(service.public_survey(survey)?))
        }
        Command::Create { file } => {
            let draft: SurveyDraft = read_json(file).await?;
            Report::Survey(service.create_survey(owner, draft)?.clone())
        }
        Command::Update { survey, file } => {
            let draft: SurveyDraft = read_json(file).await?;
            Report::Survey(service.update_survey(owner, survey, draft)?.clone())
        }
        Command::Publish { survey } => Report::Survey(service.publish_survey(owner, survey)?.clone()),
        Command::Complete { survey } => {
            Report::Survey(service.complete_survey(owner, survey)?.clone())
        }
        Command::Delete { survey } => {
            service.delete_survey(owner, survey)?;
            Report::Deleted {
                survey_id: survey.clone(),
            }
        }
        Command::Submit {
            survey,
            answers,
            email,
            name,
            ip,
            user_agent,
        } => {
            let submission = Submission {
                respondent: RespondentInput {
                    email: email.clone(),
                    name: name.clone(),
                },
                answers: read_json(answers).await?,
                ip_address: ip.clone(),
                user_agent: user_agent.clone(),
            };
            Report::Submitted(service.submit_response(survey, submission)?.clone())
        }
        Command::Respondents { search } => {
            Report::Respondents(service.list_respondents(search.as_deref()))
        }
        Command::Respondent { id } => Report::Respondent(service.respondent_history(id)?),
    };

    Ok(report)
}

/// Read and parse a JSON input file.
async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: ignoring {}: {:#}", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
