//! Process execution profiling.
//!
//! Spawns one child, optionally binding its standard streams to files, waits
//! for it, and reports wall time, CPU time, peak resident memory and exit
//! code:
//!
//! ```no_run
//! use procstat::{ExecutionReport, ExecutionRequest, profile, render_text};
//!
//! let request = ExecutionRequest::redirected("./solution", "1.in", "1.out");
//! let usage = profile(&request)?;
//! print!("{}", render_text(&ExecutionReport::from(&usage)));
//! # Ok::<(), procstat::ProfileError>(())
//! ```

pub mod backend;
mod error;
mod launcher;
mod report;
mod request;
pub mod streams;
mod usage;

pub use backend::{NativeBackend, ProcessBackend};
pub use error::{ProfileError, Result};
pub use launcher::{profile, profile_with};
pub use report::{ExecutionReport, render_json, render_text};
pub use request::{ExecutionRequest, StderrSink, StdinSource, StdoutSink};
pub use streams::{Binding, StreamBindings};
pub use usage::{ChildUsage, RawUsage, SIGNALED_EXIT_CODE, Termination};
