//! Provision → spawn → wait → usage → close, written once for every backend.

use std::time::Instant;

use tracing::{debug, info};

use crate::backend::{NativeBackend, ProcessBackend};
use crate::error::Result;
use crate::request::ExecutionRequest;
use crate::streams;
use crate::usage::RawUsage;

/// Run `request` on the platform's native backend.
pub fn profile(request: &ExecutionRequest) -> Result<RawUsage> {
    profile_with(&NativeBackend::default(), request)
}

/// Run `request` to completion on `backend` and measure it.
///
/// Wall time spans from just before process creation to just after the wait
/// returns; counters are read after the clock stops. The child is closed
/// exactly once, whether or not the wait succeeded. Nothing is retried.
pub fn profile_with<B: ProcessBackend>(backend: &B, request: &ExecutionRequest) -> Result<RawUsage> {
    let bindings = streams::provision(request)?;

    debug!(backend = backend.name(), command = %request.command_line(), "launching");
    let start = Instant::now();
    let mut child = backend.spawn(request, bindings)?;
    let waited = backend.wait(&mut child);
    let wall_time = start.elapsed();
    let counters = waited.map(|termination| backend.usage(&child, termination));
    backend.close(child);

    let usage = RawUsage::new(wall_time, counters?);
    info!(
        wall_time_us = usage.wall_time_us,
        user_time_us = usage.user_time_us,
        kernel_time_us = usage.kernel_time_us,
        peak_memory_kb = usage.peak_memory_kb,
        exit_code = usage.exit_code,
        "child finished"
    );
    Ok(usage)
}
