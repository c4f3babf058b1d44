mod cli;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use rainfall_stats::config::RainfallConfig;
use rainfall_stats::{ingest, logging, pipeline, report};

use crate::cli::{Cli, Command, InputArgs, RunArgs};

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run_pipeline(args),
        Command::Check(args) => check_input(args),
    }
}

fn load_config(args: &InputArgs) -> Result<RainfallConfig> {
    let mut config =
        RainfallConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(input) = &args.input {
        config.input.path = Some(input.clone());
    }
    if let Some(delimiter) = &args.delimiter {
        config.input.delimiter = delimiter.clone();
    }
    Ok(config)
}

fn run_pipeline(args: RunArgs) -> Result<()> {
    let mut config = load_config(&args.input)?;
    if let Some(dir) = args.output {
        config.output.dir = dir;
    }
    if let Some(year) = args.min_year {
        config.filter.min_year = year;
    }
    if let Some(year) = args.max_year {
        config.filter.max_year = year;
    }

    let output = pipeline::run(&config).context("rainfall pipeline failed")?;
    let written = report::write_outputs(&config, &output)
        .with_context(|| format!("failed to write results to {}", config.output.dir.display()))?;

    if !args.quiet {
        report::print_summary(&output);
        println!("Results written:");
        for path in written {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

fn check_input(args: InputArgs) -> Result<()> {
    let config = load_config(&args)?;
    config.validate()?;
    let input = config
        .input
        .path
        .as_deref()
        .context("no input file configured")?;

    let table = ingest::load_table(input, &config.load_options()?)
        .with_context(|| format!("cannot load {}", input.display()))?;
    logging::log_load_summary(&input.display().to_string(), &table.stats);

    let stations: std::collections::BTreeSet<&str> =
        table.records.iter().map(|r| r.station.as_str()).collect();
    let years: std::collections::BTreeSet<i32> = table.records.iter().map(|r| r.year).collect();

    println!("{}", input.display());
    println!(
        "  rows: {} read, {} used, {} dropped",
        table.stats.rows_read,
        table.stats.rows_used,
        table.stats.dropped_rows()
    );
    println!("  stations: {}", stations.len());
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => println!("  years: {first}-{last}"),
        _ => println!("  years: none"),
    }
    Ok(())
}
