// kee - AWS CLI profile manager

mod auth;
mod aws_cli;
mod aws_config;
mod cli;
mod config;
mod env;
mod error;
mod fs;
mod models;
mod prompt;
mod registry;
mod session;

use clap::Parser;
use colored::Colorize;

fn main() {
    // Parse CLI arguments first to get verbose flag
    let args = cli::Cli::parse();

    // Quiet by default so log lines don't interleave with command output
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::execute(args) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
