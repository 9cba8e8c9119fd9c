//! OS process creation and accounting, behind one trait.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{UnixBackend, UnixChild};
#[cfg(windows)]
pub use windows::{WindowsBackend, WindowsChild};

use std::process::Command;

use crate::error::Result;
use crate::request::ExecutionRequest;
use crate::streams::StreamBindings;
use crate::usage::{ChildUsage, Termination};

/// Backend for the platform being built.
#[cfg(unix)]
pub type NativeBackend = UnixBackend;
#[cfg(windows)]
pub type NativeBackend = WindowsBackend;

/// Launches, waits on, and releases exactly one child process.
///
/// `Child` owns every OS resource tied to the running process. A backend
/// must release it in `close` (or when the value is dropped on an error
/// path) and never anywhere else.
pub trait ProcessBackend {
    type Child;

    /// Human-readable name for this backend (e.g. "unix").
    fn name(&self) -> &str;

    /// Create the child with the given stream bindings.
    ///
    /// The bindings are consumed; once this returns, the parent no longer
    /// holds any of the redirected files open.
    fn spawn(&self, request: &ExecutionRequest, bindings: StreamBindings) -> Result<Self::Child>;

    /// Block until the child terminates.
    ///
    /// Returns as soon as the OS reports the exit, so the caller can stop
    /// the wall clock before any counters are read.
    fn wait(&self, child: &mut Self::Child) -> Result<Termination>;

    /// Counters of a child that `wait` has returned for.
    ///
    /// Never fails: a failed query yields [`ChildUsage::degraded`].
    fn usage(&self, child: &Self::Child, termination: Termination) -> ChildUsage;

    /// Release the child's handles.
    fn close(&self, child: Self::Child);
}

/// The `Command` every backend spawns through.
pub(crate) fn command_for(request: &ExecutionRequest, bindings: StreamBindings) -> Command {
    let StreamBindings {
        stdin,
        stdout,
        stderr,
    } = bindings;

    let mut command = Command::new(request.program());
    command
        .args(request.arguments())
        .stdin(stdin.into_stdio())
        .stdout(stdout.into_stdio())
        .stderr(stderr.into_stdio());
    if let Some(dir) = request.current_dir() {
        command.current_dir(dir);
    }
    command
}
