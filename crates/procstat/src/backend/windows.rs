//! CreateProcess + `GetProcessTimes` / `K32GetProcessMemoryInfo` backend.

use std::io;
use std::os::windows::io::AsRawHandle;
use std::process::Child;

use tracing::{debug, trace, warn};
use windows_sys::Win32::Foundation::{FILETIME, HANDLE};
use windows_sys::Win32::System::ProcessStatus::{K32GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use windows_sys::Win32::System::Threading::GetProcessTimes;

use super::{ProcessBackend, command_for};
use crate::error::{ProfileError, Result};
use crate::request::ExecutionRequest;
use crate::streams::StreamBindings;
use crate::usage::{
    ChildUsage, SIGNALED_EXIT_CODE, Termination, bytes_to_kb, filetime_parts_to_ticks,
    filetime_ticks_to_us,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsBackend;

/// A spawned child. Owns the process handle; std has already closed the
/// primary thread handle.
#[derive(Debug)]
pub struct WindowsChild {
    child: Child,
}

impl ProcessBackend for WindowsBackend {
    type Child = WindowsChild;

    fn name(&self) -> &str {
        "windows"
    }

    fn spawn(&self, request: &ExecutionRequest, bindings: StreamBindings) -> Result<WindowsChild> {
        let mut command = command_for(request, bindings);
        let spawned = command.spawn();
        // Closes the parent's copies of any redirected handles.
        drop(command);

        let child = spawned.map_err(|source| ProfileError::Spawn {
            program: request.program().to_string_lossy().into_owned(),
            source,
        })?;
        debug!(pid = child.id(), command = %request.command_line(), "child spawned");
        Ok(WindowsChild { child })
    }

    fn wait(&self, child: &mut WindowsChild) -> Result<Termination> {
        let status = child
            .child
            .wait()
            .map_err(|source| ProfileError::Wait { source })?;
        // Windows always has an exit code; values above i32::MAX (NTSTATUS
        // codes) wrap to negative, matching the DWORD bit pattern.
        Ok(Termination::Exited(
            status.code().unwrap_or(SIGNALED_EXIT_CODE),
        ))
    }

    /// The process handle stays queryable until `close`.
    fn usage(&self, child: &WindowsChild, termination: Termination) -> ChildUsage {
        let handle = child.child.as_raw_handle() as HANDLE;
        match query_counters(handle) {
            Ok((kernel_time_us, user_time_us, peak_memory_kb)) => ChildUsage {
                termination,
                user_time_us,
                kernel_time_us,
                peak_memory_kb,
                degraded: false,
            },
            Err(e) => {
                let err = ProfileError::UsageQuery { source: e };
                warn!(pid = child.child.id(), error = %err, "reporting zeroed counters");
                ChildUsage::degraded(termination)
            }
        }
    }

    fn close(&self, child: WindowsChild) {
        let WindowsChild { child } = child;
        trace!(pid = child.id(), "child released");
        drop(child);
    }
}

/// Kernel time, user time (µs) and peak working set (KB).
fn query_counters(handle: HANDLE) -> io::Result<(u64, u64, u64)> {
    let (kernel, user) = process_times(handle)?;
    let peak = peak_working_set_kb(handle)?;
    Ok((kernel, user, peak))
}

fn process_times(handle: HANDLE) -> io::Result<(u64, u64)> {
    let zero = FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
    };
    let (mut creation, mut exit, mut kernel, mut user) = (zero, zero, zero, zero);
    // SAFETY: `handle` is a live process handle owned by `Child`; all
    // out-pointers refer to initialised locals.
    let ok = unsafe { GetProcessTimes(handle, &mut creation, &mut exit, &mut kernel, &mut user) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok((filetime_us(&kernel), filetime_us(&user)))
}

fn peak_working_set_kb(handle: HANDLE) -> io::Result<u64> {
    let size = u32::try_from(size_of::<PROCESS_MEMORY_COUNTERS>()).map_err(io::Error::other)?;
    // SAFETY: plain C struct, all-zero is a valid value
    let mut counters: PROCESS_MEMORY_COUNTERS = unsafe { std::mem::zeroed() };
    counters.cb = size;
    // SAFETY: `handle` is live and `counters` is `size` bytes long
    let ok = unsafe { K32GetProcessMemoryInfo(handle, &mut counters, size) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(bytes_to_kb(
        u64::try_from(counters.PeakWorkingSetSize).unwrap_or(u64::MAX),
    ))
}

fn filetime_us(ft: &FILETIME) -> u64 {
    filetime_ticks_to_us(filetime_parts_to_ticks(ft.dwLowDateTime, ft.dwHighDateTime))
}
