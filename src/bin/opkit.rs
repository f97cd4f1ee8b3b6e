//! Opkit CLI Binary
//!
//! Command-line interface for the agent operations toolkit.

use clap::Parser;
use opkit::logging;
use opkit::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing workspace: {}", e);
            process::exit(1);
        }
    };

    // CLI flags override the loaded logging configuration.
    let mut logging_config = context.config().logging.clone();
    if let Some(level) = cli.log_level {
        logging_config.level = level;
    }
    if let Some(format) = cli.log_format {
        logging_config.format = format;
    }
    if let Some(output) = cli.log_output {
        logging_config.output = output;
    }
    if let Some(file) = cli.log_file {
        logging_config.file = Some(file);
    }
    if let Err(e) = logging::init_logging(Some(&logging_config)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
