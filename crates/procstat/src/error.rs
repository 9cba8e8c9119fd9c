use std::io;
use std::path::PathBuf;

/// Failure of one step of a profiled run.
///
/// Every variant carries the `io::Error` reported by the OS so the caller can
/// surface the raw error code. `UsageQuery` is only ever logged by a backend;
/// the run still produces a (degraded) report.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("open input file {}: {source}", .path.display())]
    InputOpen { path: PathBuf, source: io::Error },

    #[error("open output file {}: {source}", .path.display())]
    OutputOpen { path: PathBuf, source: io::Error },

    #[error("spawn `{program}`: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("wait for child: {source}")]
    Wait { source: io::Error },

    #[error("query resource usage: {source}")]
    UsageQuery { source: io::Error },
}

impl ProfileError {
    /// Raw OS error code, when the failure came from a system call.
    pub fn os_code(&self) -> Option<i32> {
        self.io_error().raw_os_error()
    }

    fn io_error(&self) -> &io::Error {
        match self {
            Self::InputOpen { source, .. }
            | Self::OutputOpen { source, .. }
            | Self::Spawn { source, .. }
            | Self::Wait { source }
            | Self::UsageQuery { source } => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
