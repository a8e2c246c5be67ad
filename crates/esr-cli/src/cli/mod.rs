mod commands;

use clap::Parser;
use esr_core::EsrError;
use std::path::PathBuf;

/// Exit codes: 0 success, 1 ambiguous axes (retry with `--x`/`--y`),
/// 2 any other failure.
pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error}");
            error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{err}");
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "esr-lab", about = "ESR spectrometer data ingestion and processing")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Show file structure, metadata and ingestion diagnostics
    Info(commands::InfoArgs),
    /// Run the processing pipeline and export the result
    Process(commands::ProcessArgs),
    /// Compute derived physics scalars from a processed spectrum
    Report(commands::ReportArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Info(args) => commands::run_info(args),
        CliCommand::Process(args) => commands::run_process(args),
        CliCommand::Report(args) => commands::run_report(args),
    }
}

/// Shared loading flags: input path plus optional explicit column names.
#[derive(clap::Args)]
pub(crate) struct LoadArgs {
    /// Input file (.csv, .tsv or .txt)
    pub path: PathBuf,

    /// Explicit field (X) column name, skipping axis heuristics
    #[arg(long = "x", requires = "y_column")]
    pub x_column: Option<String>,

    /// Explicit signal (Y) column name, skipping axis heuristics
    #[arg(long = "y", requires = "x_column")]
    pub y_column: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Load(#[from] EsrError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        // 1 is reserved for the ambiguous-axes retry signal.
        2
    }
}
