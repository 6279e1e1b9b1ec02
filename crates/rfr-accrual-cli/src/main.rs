mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::accrual::AccrueArgs;
use commands::calendar::ObservationArgs;

/// Compounded-in-arrears RFR interest accruals
#[derive(Parser)]
#[command(
    name = "rfra",
    version,
    about = "Compounded-in-arrears RFR interest accruals",
    long_about = "A CLI for SONIA/SOFR compounded-in-arrears interest with a business-day \
                  lookback, decimal precision throughout, an optional single margin step \
                  and a credit adjustment spread."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log each compounding block to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Accrue interest for one period from a JSON request
    Accrue(AccrueArgs),
    /// Resolve the business day, observation date and rate for a calendar date
    Observation(ObservationArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Accrue(args) => commands::accrual::run_accrue(args),
        Commands::Observation(args) => commands::calendar::run_observation(args),
        Commands::Version => {
            println!("rfra {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
