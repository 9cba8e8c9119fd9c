use std::time::Duration;

/// Exit code reported when the child produced none (killed by a signal).
///
/// Rendered as `-1 (0xFFFFFFFF)`.
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// How the child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
}

impl Termination {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(_) => SIGNALED_EXIT_CODE,
        }
    }

    pub fn signal(self) -> Option<i32> {
        match self {
            Self::Exited(_) => None,
            Self::Signaled(sig) => Some(sig),
        }
    }
}

/// Counters a backend reads from the OS once the child has been waited on,
/// already normalised to microseconds and kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildUsage {
    pub termination: Termination,
    pub user_time_us: u64,
    pub kernel_time_us: u64,
    pub peak_memory_kb: u64,
    /// Counters could not be read and are zero.
    pub degraded: bool,
}

impl ChildUsage {
    /// Zeroed counters for a child whose accounting query failed.
    pub fn degraded(termination: Termination) -> Self {
        Self {
            termination,
            user_time_us: 0,
            kernel_time_us: 0,
            peak_memory_kb: 0,
            degraded: true,
        }
    }
}

/// Measurements of one finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawUsage {
    pub wall_time_us: u64,
    pub user_time_us: u64,
    pub kernel_time_us: u64,
    pub peak_memory_kb: u64,
    pub exit_code: i32,
    pub termination: Termination,
    pub usage_degraded: bool,
}

impl RawUsage {
    pub fn new(wall_time: Duration, child: ChildUsage) -> Self {
        Self {
            wall_time_us: duration_to_us(wall_time),
            user_time_us: child.user_time_us,
            kernel_time_us: child.kernel_time_us,
            peak_memory_kb: child.peak_memory_kb,
            exit_code: child.termination.exit_code(),
            termination: child.termination,
            usage_degraded: child.degraded,
        }
    }

    pub fn total_cpu_time_us(&self) -> u64 {
        self.kernel_time_us.saturating_add(self.user_time_us)
    }
}

pub(crate) fn duration_to_us(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// `struct timeval` style seconds + microseconds.
#[cfg(any(unix, test))]
pub(crate) fn secs_usecs_to_us(secs: u64, usecs: u64) -> u64 {
    secs.saturating_mul(1_000_000).saturating_add(usecs)
}

/// `FILETIME` durations count 100 ns ticks.
#[cfg(any(windows, test))]
pub(crate) fn filetime_ticks_to_us(ticks: u64) -> u64 {
    ticks / 10
}

#[cfg(any(windows, test))]
pub(crate) fn filetime_parts_to_ticks(low: u32, high: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

pub(crate) fn bytes_to_kb(bytes: u64) -> u64 {
    bytes >> 10
}
