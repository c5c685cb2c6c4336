//! curcheck - billing source reachability verifier
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use curcheck::cli::{Cli, Commands, OutputFormat};
use curcheck::core::logging;
use curcheck::error::CurcheckError;
use curcheck::storage::ResolvedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let resolved = match ResolvedConfig::resolve(&cli) {
        Ok(resolved) => resolved,
        Err(e) => return fail(&e, cli.effective_format(), cli.no_color, cli.pretty),
    };

    logging::init(&logging::LogSettings::resolve(
        cli.log_level.as_deref(),
        cli.json_output,
        resolved.verbose,
    ));

    tracing::debug!(sources = ?resolved.sources, "Resolved configuration");

    let format = resolved.format;
    let pretty = resolved.pretty;
    let no_color = resolved.no_color || !curcheck::util::env::should_use_color(resolved.no_color);

    match run(cli.command, &resolved, no_color).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e, format, no_color, pretty),
    }
}

async fn run(command: Commands, resolved: &ResolvedConfig, no_color: bool) -> curcheck::Result<()> {
    let format = resolved.format;
    let pretty = resolved.pretty;
    let config = &resolved.config;

    match command {
        Commands::Verify(args) => {
            curcheck::cli::verify::execute(&args, config, format, pretty, no_color).await
        }
        Commands::CheckFiles(args) => {
            curcheck::cli::files::execute(&args, config, format, pretty, no_color).await
        }
    }
}

fn fail(e: &CurcheckError, format: OutputFormat, no_color: bool, pretty: bool) -> ExitCode {
    tracing::error!("{}", e);
    let error_output = curcheck::render::error::render_error_full(e, format, no_color, pretty);
    eprintln!("{error_output}");
    ExitCode::from(e.exit_code() as u8)
}
