use std::ffi::OsString;
use std::path::PathBuf;

use clap::Args;
use procstat::ExecutionRequest;
use tracing::info;

use super::Context;
use crate::error::CliResult;
use crate::{fsops, output};

#[derive(Args)]
pub struct StageArgs {
    /// Program to run; it reads `program_input` and writes `program_output` itself
    command: OsString,
    /// Input file name the program expects
    program_input: PathBuf,
    /// Output file name the program writes
    program_output: PathBuf,
    /// File copied to `program_input` before the run
    source_input: PathBuf,
    /// Where `program_output` is moved after the run
    dest_output: PathBuf,
    /// Run without printing the usage report
    #[arg(long)]
    no_report: bool,
    /// Arguments passed to the program, after `--`
    #[arg(last = true)]
    args: Vec<OsString>,
}

/// The copy → run → cleanup → move pipeline.
struct Staging {
    program_input: PathBuf,
    program_output: PathBuf,
    source_input: PathBuf,
    dest_output: PathBuf,
}

impl Staging {
    /// Put the source input under the program's expected name.
    ///
    /// Returns whether a temporary copy may now exist and needs cleaning up.
    /// A failed copy still counts, so that a partial file is not left behind.
    fn copy_input(&self) -> bool {
        if self.program_input == self.source_input {
            return false;
        }
        fsops::copy_file(&self.source_input, &self.program_input);
        true
    }

    fn cleanup(&self, copied: bool) {
        if copied {
            fsops::remove_quietly(&self.program_input);
        }
    }

    fn move_output(&self) {
        if self.program_output != self.dest_output {
            fsops::move_file(&self.program_output, &self.dest_output);
        }
    }
}

pub fn run_stage(args: StageArgs, ctx: &Context) -> CliResult<()> {
    let staging = Staging {
        program_input: ctx.child_path(&args.program_input),
        program_output: ctx.child_path(&args.program_output),
        source_input: args.source_input,
        dest_output: args.dest_output,
    };
    let request = ctx.prepare(ExecutionRequest::new(args.command).args(args.args));

    info!(command = %request.command_line(), "stage");
    let copied = staging.copy_input();
    let result = procstat::profile(&request);
    staging.cleanup(copied);
    staging.move_output();

    let usage = result?;
    if args.no_report {
        return Ok(());
    }
    output::emit(&usage, ctx.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn staging(dir: &std::path::Path, same_input: bool) -> Staging {
        let source_input = dir.join("case1.in");
        Staging {
            program_input: if same_input {
                source_input.clone()
            } else {
                dir.join("prog.in")
            },
            program_output: dir.join("prog.out"),
            source_input,
            dest_output: dir.join("case1.out"),
        }
    }

    #[test]
    fn pipeline_restores_names() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staging(dir.path(), false);
        fs::write(&staging.source_input, "1 2\n").unwrap();

        let copied = staging.copy_input();
        assert!(copied);
        assert_eq!(fs::read_to_string(&staging.program_input).unwrap(), "1 2\n");

        fs::write(&staging.program_output, "3\n").unwrap();
        staging.cleanup(copied);
        staging.move_output();

        assert!(!staging.program_input.exists());
        assert!(!staging.program_output.exists());
        assert!(staging.source_input.exists());
        assert_eq!(fs::read_to_string(&staging.dest_output).unwrap(), "3\n");
    }

    #[test]
    fn same_input_name_is_neither_copied_nor_removed() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staging(dir.path(), true);
        fs::write(&staging.source_input, "data").unwrap();

        let copied = staging.copy_input();
        staging.cleanup(copied);

        assert!(!copied);
        assert!(staging.source_input.exists());
    }

    #[test]
    fn missing_output_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staging(dir.path(), false);

        let copied = staging.copy_input();
        staging.cleanup(copied);
        staging.move_output();

        assert!(!staging.dest_output.exists());
    }
}
