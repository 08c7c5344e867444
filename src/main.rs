//! Main entry point for the streamtar CLI app

use std::io::IsTerminal;
use std::process::ExitCode;

use streamtar::cli::{self, Args, OutputTarget};
use streamtar::pipeline;
use streamtar::StreamError;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = cli::run();
    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Error: cannot initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = run_app(&args) {
        eprintln!("Error [{}]: {}", e.tag(), e);
        if let OutputTarget::File(path) = args.output_target() {
            if path.exists() {
                eprintln!("Partial archive left at '{}' (no end-of-archive marker)", path.display());
            }
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_app(args: &Args) -> Result<(), StreamError> {
    let options = args.archive_options();
    let target = args.output_target();
    let sink = target.open()?;
    pipeline::build_archive(&args.directory, sink, &target.describe(), &options)?;
    Ok(())
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default = if verbose { "streamtar=debug" } else { "streamtar=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(EnvFilter::from_default_env().add_directive(default.parse()?))
        .try_init()
}
