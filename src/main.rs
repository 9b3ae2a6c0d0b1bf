//! make-prc-key: generates the keys used to sign and verify prc files.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! error propagation and user-facing messages.

mod cli;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;

use cli::args::Cli;
use prckey::config::Config;
use prckey::crypto::RsaProvider;
use prckey::env::Env;
use prckey::keygen;
use prckey::pipeline::{self, GenerateRequest};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    cli::init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        cli::print_error(&err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let work_dir = std::env::current_dir().context("failed to determine current directory")?;
    let config = Config::load(Some(work_dir.as_path()), &Env::real())?;

    let (request, mut registry) = GenerateRequest::prepare(&cli.into_options(), &config)?;
    debug!(
        public_output = %request.public_output.display(),
        keys = request.keys.len(),
        existing_slots = registry.len(),
        "validated request"
    );

    let provider = RsaProvider::new();
    let summary = pipeline::generate(&request, &provider, &mut registry, keygen::unix_now())?;

    cli::print_summary(&summary);
    Ok(())
}
