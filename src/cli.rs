use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Rainfall statistics per station and year.
#[derive(Parser)]
#[command(
    name = "rainfall_stats",
    version,
    about = "Annual rainfall totals, bands, averages and shares per station"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Append log output to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline and write every artifact.
    Run(RunArgs),
    /// Load the input and report row counts without writing anything.
    Check(InputArgs),
}

/// Input selection shared by every subcommand.
#[derive(clap::Args)]
pub struct InputArgs {
    /// Path to TOML configuration file (default: rainfall.toml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the input table path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the field delimiter from config.
    #[arg(long)]
    pub delimiter: Option<String>,
}

/// Arguments for the `run` subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Override the output directory from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// First year included in annual summaries.
    #[arg(long)]
    pub min_year: Option<i32>,

    /// Last year included in annual summaries.
    #[arg(long)]
    pub max_year: Option<i32>,

    /// Do not print the summary table.
    #[arg(short, long)]
    pub quiet: bool,
}
