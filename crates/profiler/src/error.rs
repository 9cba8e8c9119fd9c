#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Profile(#[from] procstat::ProfileError),

    #[error("write report: {0}")]
    Output(#[from] std::io::Error),

    #[error("serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_error_line_names_step_and_os_code() {
        let err = CliError::from(procstat::ProfileError::Spawn {
            program: "nope".into(),
            source: std::io::Error::from_raw_os_error(2),
        });
        let line = err.to_string();
        assert!(line.starts_with("spawn `nope`: "), "line was: {line}");
        assert!(line.ends_with("(os error 2)"), "line was: {line}");
    }
}
