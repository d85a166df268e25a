//! Propagation verifier CLI
//!
//! Entry point for the `prop-verify` command-line tool.

use clap::{Parser, Subcommand};
use propagation_verifier::cancel::CancelToken;
use propagation_verifier::config::{self, ConfigError, EffectiveConfig};
use propagation_verifier::signal::SignalHandler;
use propagation_verifier::{
    CheckReport, CheckResult, CheckSummary, ExitCode, Expectation, Expected, HttpProbe, ResourceLocator, RunSummary,
    TransientSet, TransportError, Verifier, VerifyError,
};
use pv_content::LocatorError;
use serde_json::{json, Map, Value};
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prop-verify")]
#[command(about = "Verify that content lifecycle changes reach the delivery surface", version)]
struct Cli {
    /// Repo config file (default: .propagation/verify.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Host config file (default: ~/.config/propagation-verifier/config.toml)
    #[arg(long, global = true)]
    host_config: Option<PathBuf>,

    /// Base for relative locators
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Maximum probes per check (0 disables the bound)
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Maximum seconds per check (0 disables the bound)
    #[arg(long, global = true)]
    max_duration: Option<u64>,

    /// Wait between probes in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Backoff between probes
    #[arg(long, global = true, value_parser = ["fixed", "exponential"])]
    backoff: Option<String>,

    /// Stop on DNS/TLS/invalid-request errors instead of retrying
    #[arg(long, global = true)]
    fail_fast: bool,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Also write the run summary to this file
    #[arg(long, global = true)]
    summary_out: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll a locator until it settles on a non-transient status
    Poll {
        url: String,

        /// Statuses that mean "keep waiting" (comma-separated)
        #[arg(long, short = 't')]
        transient: Option<TransientSet>,

        /// Status the locator must settle on
        #[arg(long, short = 'e')]
        expect: Option<u16>,
    },

    /// Wait for a published locator to serve 200
    WaitLive { url: String },

    /// Wait for an unpublished locator to serve 410
    WaitGone { url: String },

    /// Wait for a retired part locator to serve 404
    WaitNotFound { url: String },

    /// Verify an unpublished parent serves 410, then each part serves 404
    VerifyRemoved {
        url: String,

        /// Part slug under the parent (repeatable)
        #[arg(long = "part", short = 'p')]
        parts: Vec<String>,
    },

    /// Print the effective configuration (secrets redacted) as JSON
    Config,
}

/// Errors that stop the CLI before a run summary exists
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("HTTP client setup failed: {0}")]
    Probe(#[from] TransportError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Probe(_) => ExitCode::Transport,
            _ => ExitCode::Usage,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    process::exit(code.as_i32());
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let effective = load_config(&cli)?;

    if let Commands::Config = cli.command {
        println!("{}", effective.to_json()?);
        return Ok(ExitCode::Success);
    }

    let settings = effective.settings()?;
    let base = settings.base_locator()?;
    let probe = HttpProbe::new(settings.http_probe_config()?)?;

    let cancel = CancelToken::new();
    SignalHandler::new(cancel.clone()).install()?;

    let verifier = Verifier::new(probe, settings.verifier_config()?).with_cancel(cancel);
    let parse = |url: &str| ResourceLocator::parse_with_base(url, base.as_ref());

    let started = Instant::now();
    let checks = match &cli.command {
        Commands::Poll { url, transient, expect } => {
            let locator = parse(url)?;
            let expected = expect.map_or(Expected::AnySettled, Expected::Status);
            let expectation = Expectation::new(expected, transient.clone().unwrap_or_default());
            vec![summarize(&locator, expected, verifier.check(&locator, &expectation))]
        }
        Commands::WaitLive { url } => {
            let locator = parse(url)?;
            vec![summarize(&locator, Expected::Live, verifier.wait_for_live(&locator))]
        }
        Commands::WaitGone { url } => {
            let locator = parse(url)?;
            vec![summarize(&locator, Expected::Gone, verifier.wait_for_gone(&locator))]
        }
        Commands::WaitNotFound { url } => {
            let locator = parse(url)?;
            vec![summarize(&locator, Expected::NotFound, verifier.wait_for_not_found(&locator))]
        }
        Commands::VerifyRemoved { url, parts } => {
            let parent = parse(url)?;
            match verifier.verify_removed(&parent, parts.as_slice()) {
                Ok(report) => report.results().map(CheckSummary::from_result).collect(),
                Err(e) => vec![CheckSummary::from_error(parent.as_str(), Expected::Gone, &e)],
            }
        }
        Commands::Config => Vec::new(),
    };

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let summary = RunSummary::from_checks(uuid::Uuid::new_v4().to_string(), checks, duration_ms);

    if let Some(path) = &cli.summary_out {
        summary.write_to_file(path).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
    }

    if cli.json {
        println!("{}", summary.to_json()?);
    } else {
        for check in &summary.checks {
            println!("{}", check.human_line());
        }
        println!("{}", summary.human_summary);
    }

    Ok(summary.exit_code_enum().unwrap_or(ExitCode::UnexpectedStatus))
}

fn summarize(locator: &ResourceLocator, expected: Expected, result: Result<CheckReport, VerifyError>) -> CheckSummary {
    let result = match result {
        Ok(report) => CheckResult::Passed(report),
        Err(error) => CheckResult::Failed {
            locator: locator.clone(),
            expected,
            error,
        },
    };
    CheckSummary::from_result(&result)
}

fn load_config(cli: &Cli) -> Result<EffectiveConfig, ConfigError> {
    let host = cli.host_config.clone().or_else(config::default_host_config_path);
    let repo = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(config::REPO_CONFIG_PATH));

    EffectiveConfig::build(host.as_deref(), Some(repo.as_path()), Some(cli_overrides(cli)))
}

/// Flags given on the command line, as the top config layer
fn cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();
    if let Some(base_url) = &cli.base_url {
        overrides.insert("base_url".to_string(), json!(base_url));
    }
    if let Some(max_attempts) = cli.max_attempts {
        overrides.insert("max_attempts".to_string(), json!(max_attempts));
    }
    if let Some(max_duration) = cli.max_duration {
        overrides.insert("max_duration_seconds".to_string(), json!(max_duration));
    }
    if let Some(interval_ms) = cli.interval_ms {
        overrides.insert("interval_ms".to_string(), json!(interval_ms));
    }
    if let Some(backoff) = &cli.backoff {
        overrides.insert("backoff".to_string(), json!(backoff));
    }
    if cli.fail_fast {
        overrides.insert("transport_policy".to_string(), json!("fail_fast"));
    }
    Value::Object(overrides)
}
