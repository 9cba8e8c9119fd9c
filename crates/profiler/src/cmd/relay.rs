use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use procstat::ExecutionRequest;
use tracing::{info, warn};

use super::Context;
use crate::error::CliResult;
use crate::{fsops, output};

#[derive(Args)]
pub struct RelayArgs {
    /// Program to run; it reads `input` and writes `output` itself
    command: OsString,
    /// File that receives the profiler's stdin before the run
    input: PathBuf,
    /// File printed to stdout after the run
    output: PathBuf,
    /// Run without printing the usage report
    #[arg(long)]
    no_report: bool,
    /// Arguments passed to the program, after `--`
    #[arg(last = true)]
    args: Vec<OsString>,
}

/// Console relay: stdin → `input`, run, `output` → stdout, delete both files.
pub fn run_relay(args: RelayArgs, ctx: &Context) -> CliResult<()> {
    let request = ctx.prepare(ExecutionRequest::new(args.command).args(args.args));
    let input = ctx.child_path(&args.input);
    let output = ctx.child_path(&args.output);

    if let Err(e) = save_lines(io::stdin().lock(), &input) {
        warn!(path = %input.display(), error = %e, "saving stdin failed");
    }

    info!(command = %request.command_line(), "relay");
    let result = procstat::profile(&request);

    fsops::print_file(&output, &mut io::stdout().lock());
    fsops::remove_quietly(&output);
    fsops::remove_quietly(&input);

    let usage = result?;
    if args.no_report {
        return Ok(());
    }
    output::emit(&usage, ctx.format)
}

/// Copy every line of `reader` into `path`, each terminated by `\n`.
fn save_lines(reader: impl BufRead, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for line in reader.split(b'\n') {
        out.write_all(&line?)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
