//! Resolution of the child's standard streams.
//!
//! Every opened file is owned by the returned [`StreamBindings`]. Dropping the
//! bindings (or the `Command` they were moved into) closes them, so an early
//! return on any error path cannot leak a descriptor.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::process::Stdio;

use tracing::debug;

use crate::error::{ProfileError, Result};
use crate::request::{ExecutionRequest, StderrSink, StdinSource, StdoutSink};

/// One resolved standard stream.
#[derive(Debug)]
pub enum Binding {
    Inherit,
    File(File),
    /// A duplicate of the parent's stdout, for stderr following an
    /// inherited stdout.
    ParentStdout,
}

impl Binding {
    pub fn is_inherited(&self) -> bool {
        matches!(self, Self::Inherit)
    }

    /// Hand the binding to the process-creation primitive.
    ///
    /// The file becomes inheritable in the child only; the parent's copy is
    /// closed when the `Stdio` is dropped.
    pub fn into_stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::File(file) => Stdio::from(file),
            Self::ParentStdout => Stdio::from(io::stdout()),
        }
    }
}

#[derive(Debug)]
pub struct StreamBindings {
    pub stdin: Binding,
    pub stdout: Binding,
    pub stderr: Binding,
}

impl StreamBindings {
    pub fn inherited() -> Self {
        Self {
            stdin: Binding::Inherit,
            stdout: Binding::Inherit,
            stderr: Binding::Inherit,
        }
    }
}

/// Open every file the request names.
///
/// The input is opened first, so a missing input never creates or truncates
/// the output. Output files may be left created/truncated when a later step
/// fails.
pub fn provision(request: &ExecutionRequest) -> Result<StreamBindings> {
    let stdin = match request.stdin_source() {
        StdinSource::Inherited => Binding::Inherit,
        StdinSource::FromFile(path) => Binding::File(open_input(path)?),
    };

    let stdout = match request.stdout_sink() {
        StdoutSink::Inherited => None,
        StdoutSink::ToFile(path) => Some((path.as_path(), open_output(path)?)),
    };

    let stderr = match (request.stderr_sink(), &stdout) {
        (StderrSink::Inherited, _) => Binding::Inherit,
        (StderrSink::SameAsStdout, None) => Binding::ParentStdout,
        (StderrSink::SameAsStdout, Some((path, file))) => Binding::File(share(path, file)?),
        (StderrSink::ToFile(path), Some((out_path, out_file))) => {
            let file = open_output(path)?;
            if is_same_file(out_path, out_file, path, &file)? {
                // Two offsets on one file would overwrite each other.
                drop(file);
                Binding::File(share(path, out_file)?)
            } else {
                Binding::File(file)
            }
        }
        (StderrSink::ToFile(path), None) => Binding::File(open_output(path)?),
    };

    let stdout = stdout.map_or(Binding::Inherit, |(_, file)| Binding::File(file));

    debug!(
        stdin_inherited = stdin.is_inherited(),
        stdout_inherited = stdout.is_inherited(),
        stderr_inherited = stderr.is_inherited(),
        "streams provisioned"
    );
    Ok(StreamBindings {
        stdin,
        stdout,
        stderr,
    })
}

fn open_input(path: &Path) -> Result<File> {
    let input_error = |source| ProfileError::InputOpen {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(input_error)?;
    // Opening a directory read-only succeeds on unix; reading it would not.
    let metadata = file.metadata().map_err(input_error)?;
    if metadata.is_dir() {
        return Err(input_error(io::Error::from(io::ErrorKind::IsADirectory)));
    }
    Ok(file)
}

fn open_output(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path).map_err(|source| ProfileError::OutputOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether two opened outputs are one file, however their paths are spelled.
#[cfg(unix)]
fn is_same_file(_: &Path, a: &File, b_path: &Path, b: &File) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let identity = |file: &File| {
        file.metadata()
            .map(|m| (m.dev(), m.ino()))
            .map_err(|source| ProfileError::OutputOpen {
                path: b_path.to_path_buf(),
                source,
            })
    };
    Ok(identity(a)? == identity(b)?)
}

#[cfg(not(unix))]
fn is_same_file(a_path: &Path, _: &File, b_path: &Path, _: &File) -> Result<bool> {
    let canonical = |path: &Path| {
        std::fs::canonicalize(path).map_err(|source| ProfileError::OutputOpen {
            path: path.to_path_buf(),
            source,
        })
    };
    Ok(canonical(a_path)? == canonical(b_path)?)
}

/// Second descriptor on the same open file, sharing its offset.
fn share(path: &Path, file: &File) -> Result<File> {
    file.try_clone().map_err(|source| ProfileError::OutputOpen {
        path: path.to_path_buf(),
        source,
    })
}
