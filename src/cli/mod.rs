//! CLI definition and user-facing output.
//!
//! Uses clap derive macros for the argument definitions.

pub mod args;

use colored::Colorize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use prckey::constants::ENV_LOG;
use prckey::pipeline::GenerateSummary;

/// Log level for a `-v` count.
pub fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the stderr log subscriber. `PRCKEY_LOG` adds filter directives.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(""))
        .add_directive(log_level(verbose).into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Print an error the way the binary reports every failure.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {err:#}", "Error:".red().bold());
}

/// One line per file written, to stdout.
pub fn print_summary(summary: &GenerateSummary) {
    for path in &summary.private_outputs {
        println!("{} {}", "private".dimmed(), path.display());
    }
    println!(
        "{}  {} ({} slots)",
        "public".dimmed(),
        summary.public_output.display(),
        summary.table_len
    );
}
