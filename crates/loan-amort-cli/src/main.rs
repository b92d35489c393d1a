mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::{AnalyzeArgs, PositionArgs, ScheduleArgs};

/// Loan amortization schedules with decimal precision
#[derive(Parser)]
#[command(
    name = "lamort",
    version,
    about = "Loan amortization schedule calculations",
    long_about = "A CLI for computing loan amortization schedules with decimal \
                  precision. Generates month-by-month payment breakdowns, overlays \
                  recurring extra principal payments, and locates a loan's position \
                  in its schedule from calendar dates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Locate the loan's position in its schedule given calendar dates
    Position(PositionArgs),
    /// Full analysis: both schedules, payoff summary, lifecycle position
    Analyze(AnalyzeArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::amortization::run_schedule(args),
        Commands::Position(args) => commands::amortization::run_position(args),
        Commands::Analyze(args) => commands::amortization::run_analyze(args),
        Commands::Version => {
            println!("lamort {}", env!("CARGO_PKG_VERSION"));
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
