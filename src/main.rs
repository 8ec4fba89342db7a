use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod executor;
mod pipeline;
mod util;
mod workspace;

use cli::{normalize_args, RootArgs, USAGE_EXIT_CODE};
use config::{RunConfig, Toolchain};
use executor::SystemExecutor;
use workspace::Workspace;

fn main() -> ExitCode {
    let args = match RootArgs::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(err) => {
            // clap renders --help as an "error" too; both end the run as usage
            let _ = err.print();
            return ExitCode::from(USAGE_EXIT_CODE);
        }
    };
    init_tracing(args.verbose);

    match prepare(&args) {
        Ok((config, workspace, mut executor)) => {
            let outcome = pipeline::run(&config, &workspace, &mut executor);
            tracing::debug!(?outcome, "run finished");
            ExitCode::from(outcome.exit_code())
        }
        Err(err) => {
            println!("error: {err:#}");
            print_usage();
            ExitCode::from(USAGE_EXIT_CODE)
        }
    }
}

/// Everything that must succeed before the first side effect.
fn prepare(args: &RootArgs) -> Result<(RunConfig, Workspace, SystemExecutor)> {
    let config = RunConfig::from_args(args)?;
    let toolchain = Toolchain::from_env()?;
    let workspace = Workspace::current()?;
    tracing::debug!(
        root = %workspace.root().display(),
        repo = %toolchain.toolkit_repo,
        "resolved workspace"
    );
    Ok((config, workspace, SystemExecutor::new(toolchain)))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_usage() {
    let mut command = RootArgs::command();
    println!();
    println!("{}", command.render_help());
}
