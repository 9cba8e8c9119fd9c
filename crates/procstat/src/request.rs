use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Where the child's stdin comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StdinSource {
    #[default]
    Inherited,
    FromFile(PathBuf),
}

/// Where the child's stdout goes. Files are created or truncated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StdoutSink {
    #[default]
    Inherited,
    ToFile(PathBuf),
}

/// Where the child's stderr goes.
///
/// `SameAsStdout` follows whatever stdout resolves to, like `2>&1`: the same
/// open file, or the parent's stdout when stdout is inherited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StderrSink {
    #[default]
    Inherited,
    ToFile(PathBuf),
    SameAsStdout,
}

/// A single program invocation to profile.
///
/// Built once by the caller and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    program: OsString,
    arguments: Vec<OsString>,
    working_dir: Option<PathBuf>,
    stdin: StdinSource,
    stdout: StdoutSink,
    stderr: StderrSink,
}

impl ExecutionRequest {
    /// A request that inherits all three standard streams.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            arguments: Vec::new(),
            working_dir: None,
            stdin: StdinSource::Inherited,
            stdout: StdoutSink::Inherited,
            stderr: StderrSink::Inherited,
        }
    }

    /// Redirect-IO: stdin reads `input`, stdout and stderr both write `output`.
    pub fn redirected(
        program: impl Into<OsString>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self::new(program)
            .stdin(StdinSource::FromFile(input.into()))
            .stdout(StdoutSink::ToFile(output.into()))
            .stderr(StderrSink::SameAsStdout)
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, source: StdinSource) -> Self {
        self.stdin = source;
        self
    }

    pub fn stdout(mut self, sink: StdoutSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: StderrSink) -> Self {
        self.stderr = sink;
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.arguments
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn stdin_source(&self) -> &StdinSource {
        &self.stdin
    }

    pub fn stdout_sink(&self) -> &StdoutSink {
        &self.stdout
    }

    pub fn stderr_sink(&self) -> &StderrSink {
        &self.stderr
    }

    /// Program and arguments joined by spaces, for logs and diagnostics.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.arguments.len() + 1);
        parts.push(self.program.to_string_lossy());
        parts.extend(self.arguments.iter().map(|a| a.to_string_lossy()));
        parts.join(" ")
    }
}
