use std::fmt;
use std::path::{Path, PathBuf};

/// Which executable a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// The located container runtime (docker or compatible).
    Runtime,
    /// Any other program, spawned as given (artifact builds).
    External(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Merge stdout and stderr into `CommandResult::output`.
    Capture,
    /// Inherit the terminal; used for follow-mode log tailing.
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub program: Program,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub output: OutputMode,
}

impl CommandRequest {
    pub fn runtime<I, S>(args: I, working_dir: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: Program::Runtime,
            args: args.into_iter().map(Into::into).collect(),
            working_dir: working_dir.to_path_buf(),
            output: OutputMode::Capture,
        }
    }

    pub fn external<I, S>(program: &str, args: I, working_dir: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: Program::External(program.to_string()),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: working_dir.to_path_buf(),
            output: OutputMode::Capture,
        }
    }

    pub fn streamed(mut self) -> Self {
        self.output = OutputMode::Stream;
        self
    }

    /// Human-readable command line, as echoed in failure messages.
    pub fn display_line(&self) -> String {
        let head = match &self.program {
            Program::Runtime => "<runtime>",
            Program::External(name) => name.as_str(),
        };

        std::iter::once(head)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// Outcome of a process that ran to completion. A non-zero exit is data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub output: String,
}

impl CommandResult {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Builds the argv handed to the OS for a runtime request.
///
/// A leading literal runtime name (`"docker"`) is treated as a placeholder and
/// replaced by the resolved path instead of being passed as an argument.
pub fn runtime_argv(runtime_path: &Path, runtime_name: &str, args: &[String]) -> Vec<String> {
    let rest = match args.first() {
        Some(first) if first == runtime_name => &args[1..],
        _ => args,
    };

    std::iter::once(runtime_path.to_string_lossy().into_owned())
        .chain(rest.iter().cloned())
        .collect()
}
