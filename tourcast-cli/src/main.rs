//! Tourcast CLI - narrated audio tours from the command line
//!
//! Generates a tour script for a location and renders it to speech.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tourcast::prelude::*;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, config_path, init_config, load_config};

/// Exit code when the tour text was produced but speech rendering failed.
const EXIT_RENDER_FAILED: u8 = 2;

/// Tourcast - personalized spoken tours of any place
#[derive(Parser)]
#[command(name = "tourcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "TOURCAST_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a tour and render it to audio
    Tour(TourArgs),

    /// Show how the planner would split the tour time
    Plan(RequestArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Location, interests and duration shared by `tour` and `plan`.
#[derive(Args)]
struct RequestArgs {
    /// Place to tour
    #[arg(short, long)]
    location: String,

    /// Interests to cover (Architecture, History, Culture, Culinary)
    #[arg(short, long = "interest", required = true, value_delimiter = ',')]
    interests: Vec<Interest>,

    /// Tour length in minutes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    duration: u32,
}

impl RequestArgs {
    fn to_request(&self) -> tourcast::Result<TourRequest> {
        TourRequest::new(
            &self.location,
            self.interests.iter().copied().collect(),
            self.duration,
        )
    }
}

/// Arguments for the tour command
#[derive(Args)]
struct TourArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Narration language code (overrides config)
    #[arg(long)]
    language: Option<String>,

    /// Speech voice (overrides config)
    #[arg(long)]
    voice: Option<String>,

    /// Let specialists ground narration with web search
    #[arg(long)]
    web_search: bool,

    /// Audio output file (defaults to a name derived from the location)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Also write the tour text to this file
    #[arg(long)]
    text_out: Option<PathBuf>,

    /// Skip speech rendering
    #[arg(long)]
    no_audio: bool,

    /// Print the full outcome (budget, sections, usage) as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the effective configuration
    Validate,
}

/// Errors that end the command with a failure status.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tour(#[from] tourcast::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("configuration has errors:\n{0}")]
    Invalid(String),
}

type CliResult<T> = std::result::Result<T, CliError>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tourcast={level},tourcast_cli={level},{}",
            if verbosity >= 3 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    let path = cli.config.as_deref();
    match cli.command {
        Commands::Tour(args) => cmd_tour(args, path).await,
        Commands::Plan(args) => cmd_plan(&args, path).await,
        Commands::Config(args) => cmd_config(args, path).await,
    }
}

/// Loads settings and refuses to continue when they contain errors.
async fn checked_config(path: Option<&Path>) -> CliResult<TourConfig> {
    let config = load_config(path).await?;
    let issues = config.validate();
    for issue in issues.iter().filter(|i| i.level == IssueLevel::Warning) {
        tracing::warn!("{issue}");
    }
    if config.is_valid() {
        Ok(config)
    } else {
        let errors: Vec<String> = issues
            .iter()
            .filter(|i| i.level == IssueLevel::Error)
            .map(ToString::to_string)
            .collect();
        Err(CliError::Invalid(errors.join("\n")))
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> CliResult<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn save_audio(audio: &SpeechResponse, path: &Path) -> CliResult<()> {
    audio.save(path).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Generate a tour, print it and render it to audio.
async fn cmd_tour(args: TourArgs, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let mut config = checked_config(config_path).await?;
    if let Some(language) = args.language {
        config.language = language;
    }
    if let Some(voice) = args.voice {
        config.voice = voice;
    }
    config.web_search |= args.web_search;

    let request = args.request.to_request()?;
    let client = Arc::new(OpenAI::new(config.openai_config()?)?);
    let renderer = SpeechRenderer::from_config(&config, Arc::clone(&client) as SharedSpeechProvider);
    let pipeline = TourPipeline::new(config, client);

    let outcome = pipeline.run(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome).map_err(tourcast::Error::from)?);
    } else {
        println!("{}", outcome.text());
    }
    if let Some(path) = &args.text_out {
        write_file(path, outcome.text().as_bytes()).await?;
    }

    if args.no_audio {
        return Ok(ExitCode::SUCCESS);
    }

    let audio = match renderer.render(outcome.text()).await {
        Ok(audio) => audio,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(ExitCode::from(EXIT_RENDER_FAILED));
        }
    };
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(suggested_file_name(request.location())));
    save_audio(&audio, &out)?;
    println!();
    println!("Audio saved: {}", out.display());

    Ok(ExitCode::SUCCESS)
}

/// Print the planner's time allocation.
async fn cmd_plan(args: &RequestArgs, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = checked_config(config_path).await?;
    let request = args.to_request()?;
    let pipeline = TourPipeline::from_config(config)?;

    let allocation = pipeline.plan(&request).await?;

    println!("Plan for {} ({} minutes)", request.location(), request.duration_minutes());
    println!("  introduction  {:>5.1} min", allocation.introduction);
    for interest in Interest::ALL {
        let marker = if request.interests().contains(interest) { "" } else { " (not selected)" };
        println!(
            "  {:<12}  {:>5.1} min{marker}",
            interest.key(),
            allocation.minutes_for(interest)
        );
    }
    println!("  conclusion    {:>5.1} min", allocation.conclusion);
    println!("  total         {:>5.1} min", allocation.total());

    Ok(ExitCode::SUCCESS)
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_path_arg: Option<&Path>) -> CliResult<ExitCode> {
    let config_file = config_path_arg.map_or_else(config_path, Path::to_path_buf);

    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            let mut config = load_config(config_path_arg).await?;
            let key_status = if config.has_api_key() { "set" } else { "-" };
            config.api_key = None;
            let content = toml::to_string_pretty(&config).map_err(ConfigError::from)?;
            println!("# {}", config_file.display());
            println!("# OPENAI_API_KEY: {key_status}");
            println!("{content}");
        }
        ConfigCommands::Init { force } => {
            init_config(&config_file, force).await?;
            println!("Configuration created: {}", config_file.display());
            println!();
            println!("Next steps:");
            println!("  1. export OPENAI_API_KEY=<key>");
            println!("  2. tourcast tour -l Paris -i History -i Architecture -d 10");
        }
        ConfigCommands::Validate => {
            let config = load_config(config_path_arg).await?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("Configuration is valid");
            }
            for issue in &issues {
                println!("{issue}");
            }
            if !config.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
