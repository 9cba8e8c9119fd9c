mod cmd;
mod error;
mod fsops;
mod output;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

use crate::output::Format;

/// Exit status for a failed setup, launch or wait (the tools' historical `-1`).
const FAILURE_EXIT_CODE: u8 = 255;

/// Log filter, e.g. `PROFILER_LOG=debug`. Defaults to `warn`.
const LOG_ENV: &str = "PROFILER_LOG";

struct Elapsed(Instant);

impl FormatTime for Elapsed {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let d = self.0.elapsed();
        let total_secs = d.as_secs();
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        let millis = d.subsec_millis();
        write!(w, "[{mins:02}:{secs:02}:{millis:03}]")
    }
}

#[derive(Parser)]
#[command(name = "profiler", version, about)]
struct Cli {
    /// Report format written to stdout
    #[arg(long, value_enum, global = true, default_value_t = Format::Text, env = "PROFILER_FORMAT")]
    format: Format,
    /// Working directory for the child process
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a command with the profiler's own stdin, stdout and stderr
    Run(cmd::RunArgs),
    /// Run a command reading stdin from a file and writing stdout+stderr to a file
    Redirect(cmd::RedirectArgs),
    /// Copy the input into place, run a command that uses fixed file names, then move its output out
    Stage(cmd::StageArgs),
    /// Save console input to a file, run a command that uses fixed file names, then print its output
    Relay(cmd::RelayArgs),
}

fn main() -> ExitCode {
    // stdout carries the report; logs go to stderr.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_timer(Elapsed(Instant::now()))
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let ctx = cmd::Context {
        format: cli.format,
        workdir: cli.workdir,
    };

    let result = match cli.command {
        Command::Run(args) => cmd::run_inherit(args, &ctx),
        Command::Redirect(args) => cmd::run_redirect(args, &ctx),
        Command::Stage(args) => cmd::run_stage(args, &ctx),
        Command::Relay(args) => cmd::run_relay(args, &ctx),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}
