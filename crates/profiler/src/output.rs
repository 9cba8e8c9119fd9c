use std::io::{self, Write};

use clap::ValueEnum;
use procstat::{ExecutionReport, RawUsage, render_json, render_text};

use crate::error::CliResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Fixed six-line block between separator lines
    Text,
    /// One JSON object per line
    Json,
}

pub fn render(usage: &RawUsage, format: Format) -> CliResult<String> {
    let report = ExecutionReport::from(usage);
    Ok(match format {
        Format::Text => render_text(&report),
        Format::Json => {
            let mut line = render_json(&report)?;
            line.push('\n');
            line
        }
    })
}

/// Write the report for `usage` to stdout.
pub fn emit(usage: &RawUsage, format: Format) -> CliResult<()> {
    let text = render(usage, format)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
