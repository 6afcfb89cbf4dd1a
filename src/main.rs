//! # Allocation CLI
//!
//! Thin wrapper over the library pipeline: read the three input files, run
//! the matcher, write the report.
//!
//! ## Usage
//!
//! ```bash
//! topicmatch --students students.txt --topics topics.txt \
//!            --supervisors supervisors.txt --output report.txt
//! ```
//!
//! Exit codes: 0 on success (unmatched students are not an error), 2 on
//! input validation failure, 1 on I/O or configuration errors.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use topicmatch::{Config, LoadError, Report, ReportFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "topicmatch",
    version,
    about = "Deterministic student-project allocation"
)]
struct Cli {
    /// Students input file (id: topic preferences)
    #[arg(long)]
    students: PathBuf,

    /// Topics input file (id: area)
    #[arg(long)]
    topics: PathBuf,

    /// Supervisors input file (id: capacity, program:topic:level entries)
    #[arg(long)]
    supervisors: PathBuf,

    /// Report output file
    #[arg(long, short)]
    output: PathBuf,

    /// Configuration file (default: config.toml + config.local.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format override
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Require exactly five preferences per student
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    Csv,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Csv => ReportFormat::Csv,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    if cli.strict {
        config.matching.strict_preference_count = true;
    }
    if let Some(format) = cli.format {
        config.report.format = format.into();
    }
    init_logging(&config);

    let students = read_input(&cli.students)?;
    let topics = read_input(&cli.topics)?;
    let supervisors = read_input(&cli.supervisors)?;

    let instance = match topicmatch::load_instance(&students, &topics, &supervisors, &config) {
        Ok(instance) => instance,
        Err(LoadError::Validation(issues)) => {
            for issue in &issues {
                eprintln!("{issue}");
            }
            eprintln!("{} validation issue(s); no matching attempted", issues.len());
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(err.into()),
    };

    info!(
        students = instance.students.len(),
        topics = instance.topics.len(),
        supervisors = instance.supervisors.len(),
        "input validated"
    );

    let (catalog, outcome) = topicmatch::run_matching(&instance, config.match_options());
    let report = Report::build(&instance, &catalog, &outcome);

    let rendered = match config.report.format {
        ReportFormat::Text => report.render_text(),
        ReportFormat::Json => report.to_json().context("failed to serialize report")?,
        ReportFormat::Csv => report.assignment_csv(),
    };
    fs::write(&cli.output, rendered)
        .with_context(|| format!("failed to write report to {}", cli.output.display()))?;

    info!(
        matched = report.metrics.matched,
        total = report.metrics.total_students,
        rounds = report.rounds.len(),
        stable = report.stable,
        output = %cli.output.display(),
        "allocation complete"
    );

    Ok(ExitCode::SUCCESS)
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
