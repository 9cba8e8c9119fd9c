mod relay;
mod run;
mod stage;

pub use relay::{RelayArgs, run_relay};
pub use run::{RedirectArgs, RunArgs, run_inherit, run_redirect};
pub use stage::{StageArgs, run_stage};

use std::path::{Path, PathBuf};

use procstat::ExecutionRequest;

use crate::output::Format;

/// Options shared by every subcommand.
pub struct Context {
    pub format: Format,
    pub workdir: Option<PathBuf>,
}

impl Context {
    /// Apply context-wide settings to a request.
    fn prepare(&self, request: ExecutionRequest) -> ExecutionRequest {
        match &self.workdir {
            Some(dir) => request.working_dir(dir),
            None => request,
        }
    }

    /// Resolve a file name the child sees relative to its own working directory.
    fn child_path(&self, path: &Path) -> PathBuf {
        match &self.workdir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}
