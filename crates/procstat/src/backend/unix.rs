//! fork/exec + `wait4(2)` backend.

use std::io;
use std::process::Child;

use nix::errno::Errno;
use nix::unistd::Pid;
use tracing::{debug, trace, warn};

use super::{ProcessBackend, command_for};
use crate::error::{ProfileError, Result};
use crate::request::ExecutionRequest;
use crate::streams::StreamBindings;
use crate::usage::{ChildUsage, Termination, bytes_to_kb, secs_usecs_to_us};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnixBackend;

/// A spawned child. Reaped by [`UnixBackend::wait`], never by std.
#[derive(Debug)]
pub struct UnixChild {
    child: Child,
    pid: Pid,
    /// Filled in by the reaping `wait4` call.
    reaped: Option<Counters>,
}

/// `rusage` fields already converted to µs and KB.
#[derive(Debug, Clone, Copy)]
struct Counters {
    user_time_us: u64,
    kernel_time_us: u64,
    peak_memory_kb: u64,
}

impl ProcessBackend for UnixBackend {
    type Child = UnixChild;

    fn name(&self) -> &str {
        "unix"
    }

    fn spawn(&self, request: &ExecutionRequest, bindings: StreamBindings) -> Result<UnixChild> {
        let mut command = command_for(request, bindings);
        // std reports exec failures (ENOENT, EACCES, ...) from the child
        // through a close-on-exec pipe, so they surface here.
        let spawned = command.spawn();
        // Closes the parent's copies of any redirected files.
        drop(command);

        let mut child = spawned.map_err(|source| ProfileError::Spawn {
            program: request.program().to_string_lossy().into_owned(),
            source,
        })?;

        match libc::pid_t::try_from(child.id()) {
            Ok(raw) => {
                let pid = Pid::from_raw(raw);
                debug!(pid = raw, command = %request.command_line(), "child spawned");
                Ok(UnixChild {
                    child,
                    pid,
                    reaped: None,
                })
            }
            Err(e) => {
                discard(&mut child);
                Err(ProfileError::Spawn {
                    program: request.program().to_string_lossy().into_owned(),
                    source: io::Error::other(format!("pid {} out of range: {e}", child.id())),
                })
            }
        }
    }

    fn wait(&self, child: &mut UnixChild) -> Result<Termination> {
        let (status, usage) = wait4(child.pid)?;
        child.reaped = Some(Counters {
            user_time_us: timeval_to_us(usage.ru_utime),
            kernel_time_us: timeval_to_us(usage.ru_stime),
            peak_memory_kb: peak_memory_kb(usage.ru_maxrss),
        });
        let termination = termination(status);
        if let Termination::Signaled(sig) = termination {
            warn!(pid = child.pid.as_raw(), signal = sig, "child killed by signal");
        }
        Ok(termination)
    }

    /// `wait4` reports the counters together with the exit, so this only
    /// reads back what the wait recorded.
    fn usage(&self, child: &UnixChild, termination: Termination) -> ChildUsage {
        match child.reaped {
            Some(counters) => ChildUsage {
                termination,
                user_time_us: counters.user_time_us,
                kernel_time_us: counters.kernel_time_us,
                peak_memory_kb: counters.peak_memory_kb,
                degraded: false,
            },
            None => {
                warn!(pid = child.pid.as_raw(), "child was not reaped, reporting zeroed counters");
                ChildUsage::degraded(termination)
            }
        }
    }

    fn close(&self, child: UnixChild) {
        let UnixChild { child, pid, .. } = child;
        trace!(pid = pid.as_raw(), "child released");
        drop(child);
    }
}

/// Kill and reap a child that cannot be tracked, logging what fails.
fn discard(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!(pid = child.id(), error = %e, "killing untracked child failed");
    }
    if let Err(e) = child.wait() {
        warn!(pid = child.id(), error = %e, "reaping untracked child failed");
    }
}

/// Block until `pid` terminates and return its raw status and rusage.
///
/// For more details, see [wait4(2)](https://man7.org/linux/man-pages/man2/wait4.2.html).
fn wait4(pid: Pid) -> Result<(libc::c_int, libc::rusage)> {
    let mut status: libc::c_int = 0;
    // SAFETY: libc structs have valid all-zero byte-patterns
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    loop {
        // SAFETY: all pointers are valid for FFI with wait4 here
        let result = unsafe { libc::wait4(pid.as_raw(), &raw mut status, 0, &raw mut usage) };
        // NOTE: read errno before anything else can overwrite it
        let errno = Errno::last();
        if result != -1 {
            trace!(pid = result, status, "wait4 returned");
            return Ok((status, usage));
        }
        if errno != Errno::EINTR {
            return Err(ProfileError::Wait {
                source: io::Error::from(errno),
            });
        }
        debug!(pid = pid.as_raw(), "wait4 interrupted, retrying");
    }
}

/// Without `WUNTRACED` only exited or signaled statuses are reported.
fn termination(status: libc::c_int) -> Termination {
    if libc::WIFEXITED(status) {
        Termination::Exited(libc::WEXITSTATUS(status))
    } else {
        Termination::Signaled(libc::WTERMSIG(status))
    }
}

fn timeval_to_us(tv: libc::timeval) -> u64 {
    let secs = u64::try_from(tv.tv_sec).unwrap_or(0);
    let usecs = u64::try_from(tv.tv_usec).unwrap_or(0);
    secs_usecs_to_us(secs, usecs)
}

/// `ru_maxrss` is kilobytes on Linux and the BSDs, bytes on Apple platforms.
fn peak_memory_kb(maxrss: libc::c_long) -> u64 {
    let value = u64::try_from(maxrss).unwrap_or(0);
    if cfg!(any(target_os = "macos", target_os = "ios")) {
        bytes_to_kb(value)
    } else {
        value
    }
}
