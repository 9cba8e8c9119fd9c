//! Display-ready view of [`RawUsage`] and its fixed text format.
//!
//! The text block is a stable contract: scripts scrape it from stdout, so the
//! labels, units and separator lines must not change.

use serde::Serialize;

use crate::usage::RawUsage;

const SEPARATOR: &str = "-----------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Milliseconds with three fractional digits, e.g. `12.345`.
    pub wall_time_ms: String,
    pub peak_memory_kb: u64,
    /// Seconds with three fractional digits.
    pub kernel_time_s: String,
    pub user_time_s: String,
    pub total_cpu_time_s: String,
    pub exit_code: i32,
    /// Upper-case two's complement, without the `0x` prefix.
    pub exit_code_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    pub usage_degraded: bool,
}

impl From<&RawUsage> for ExecutionReport {
    fn from(usage: &RawUsage) -> Self {
        Self {
            wall_time_ms: format_millis(usage.wall_time_us),
            peak_memory_kb: usage.peak_memory_kb,
            kernel_time_s: format_seconds(usage.kernel_time_us),
            user_time_s: format_seconds(usage.user_time_us),
            total_cpu_time_s: format_ms_as_seconds(
                (usage.kernel_time_us / 1_000).saturating_add(usage.user_time_us / 1_000),
            ),
            exit_code: usage.exit_code,
            exit_code_hex: format!("{:X}", usage.exit_code),
            signal: usage.termination.signal(),
            usage_degraded: usage.usage_degraded,
        }
    }
}

/// µs → `ms.fff`, by integer division so no rounding happens.
pub(crate) fn format_millis(us: u64) -> String {
    format!("{}.{:03}", us / 1_000, us % 1_000)
}

/// µs → `s.fff`, truncated to whole milliseconds.
pub(crate) fn format_seconds(us: u64) -> String {
    format_ms_as_seconds(us / 1_000)
}

/// The total is summed from the truncated parts, so it always equals
/// kernel + user as displayed.
fn format_ms_as_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1_000, ms % 1_000)
}

/// The six-line report between two separator lines, preceded by a blank line.
pub fn render_text(report: &ExecutionReport) -> String {
    format!(
        "\n{SEPARATOR}\n\
         总执行时间：{} ms\n\
         内存使用：{} KB\n\
         CPU内核时间：{} 秒\n\
         CPU用户时间：{} 秒\n\
         总CPU时间：{} 秒\n\
         程序返回值：{} (0x{})\n\
         {SEPARATOR}\n",
        report.wall_time_ms,
        report.peak_memory_kb,
        report.kernel_time_s,
        report.user_time_s,
        report.total_cpu_time_s,
        report.exit_code,
        report.exit_code_hex,
    )
}

/// One-line JSON object with every report field.
pub fn render_json(report: &ExecutionReport) -> serde_json::Result<String> {
    serde_json::to_string(report)
}
