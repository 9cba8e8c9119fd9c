use std::ffi::OsString;
use std::path::PathBuf;

use clap::Args;
use procstat::ExecutionRequest;
use tracing::info;

use super::Context;
use crate::error::CliResult;
use crate::output;

#[derive(Args)]
pub struct RunArgs {
    /// Program to run, followed by its arguments
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<OsString>,
}

#[derive(Args)]
pub struct RedirectArgs {
    /// Program to run
    command: OsString,
    /// File the program reads as stdin (must exist)
    input: PathBuf,
    /// File receiving the program's stdout and stderr (created or truncated)
    output: PathBuf,
    /// Arguments passed to the program, after `--`
    #[arg(last = true)]
    args: Vec<OsString>,
}

/// Inherit-IO: the child shares the profiler's console.
pub fn run_inherit(args: RunArgs, ctx: &Context) -> CliResult<()> {
    let mut words = args.command.into_iter();
    // clap guarantees at least one value
    let program = words.next().unwrap_or_default();
    let request = ctx.prepare(ExecutionRequest::new(program).args(words));

    info!(command = %request.command_line(), "run");
    let usage = procstat::profile(&request)?;
    output::emit(&usage, ctx.format)
}

/// Redirect-IO: stdin from `input`, stdout and stderr into `output`.
pub fn run_redirect(args: RedirectArgs, ctx: &Context) -> CliResult<()> {
    let request = ctx.prepare(
        ExecutionRequest::redirected(args.command, args.input, args.output).args(args.args),
    );

    info!(command = %request.command_line(), "redirect");
    let usage = procstat::profile(&request)?;
    output::emit(&usage, ctx.format)
}
