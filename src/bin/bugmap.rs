//! Bugmap CLI Binary
//!
//! Command-line interface for building and exporting defect treemaps.

use bugmap::logging::{init_logging, LoggingConfig};
use bugmap::tooling::cli::{Cli, CliContext};
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing workspace: {}", e);
            process::exit(1);
        }
    };

    let logging = apply_overrides(context.config().logging.clone(), &cli);
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match context.execute(&cli.command).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// CLI flags take precedence over the configured logging section.
fn apply_overrides(mut logging: LoggingConfig, cli: &Cli) -> LoggingConfig {
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        logging.output = output.clone();
    }
    if cli.log_file.is_some() {
        logging.file = cli.log_file.clone();
    }
    logging
}
