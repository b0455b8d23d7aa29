use crate::domain::{
    CommandRequest, CommandResult, CommandRunner, OutputMode, Program, RunnerError, runtime_argv,
};
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

pub const FAKE_RUNTIME_PATH: &str = "/usr/local/bin/docker";

/// A call the fake runner accepted, with the exact argv a real spawn would get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    pub output: OutputMode,
}

#[derive(Debug, Clone)]
enum Scripted {
    Exit { code: i32, output: String },
    SpawnError,
}

/// Records commands instead of running them. Calls match scripted
/// responses by prefix of their display line (`docker compose down`).
#[derive(Debug)]
pub struct FakeRunner {
    runtime_name: String,
    runtime_path: RwLock<Option<PathBuf>>,
    calls: RwLock<Vec<RecordedCall>>,
    scripted: RwLock<Vec<(String, Scripted)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            runtime_name: "docker".to_string(),
            runtime_path: RwLock::new(Some(PathBuf::from(FAKE_RUNTIME_PATH))),
            calls: RwLock::new(Vec::new()),
            scripted: RwLock::new(Vec::new()),
        }
    }

    /// A host where the runtime cannot be located.
    pub fn without_runtime() -> Self {
        let runner = Self::new();
        *runner.runtime_path.write().unwrap() = None;
        runner
    }

    /// Makes calls starting with `prefix` exit with `code`.
    pub fn fail_on(&self, prefix: &str, code: i32) {
        self.script(
            prefix,
            Scripted::Exit {
                code,
                output: format!("Mock failure on: {prefix}"),
            },
        );
    }

    /// Makes calls starting with `prefix` succeed with `output`.
    pub fn respond(&self, prefix: &str, output: &str) {
        self.script(
            prefix,
            Scripted::Exit {
                code: 0,
                output: output.to_string(),
            },
        );
    }

    pub fn respond_with(&self, prefix: &str, code: i32, output: &str) {
        self.script(
            prefix,
            Scripted::Exit {
                code,
                output: output.to_string(),
            },
        );
    }

    pub fn spawn_error_on(&self, prefix: &str) {
        self.script(prefix, Scripted::SpawnError);
    }

    fn script(&self, prefix: &str, response: Scripted) {
        self.scripted
            .write()
            .unwrap()
            .push((prefix.to_string(), response));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().unwrap().clone()
    }

    /// Display lines with the runtime path shown as its name.
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(|call| self.line_of(call)).collect()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.starts_with(prefix))
    }

    pub fn issued(&self, prefix: &str) -> bool {
        self.position(prefix).is_some()
    }

    fn line_of(&self, call: &RecordedCall) -> String {
        let mut parts = call.argv.clone();
        if let Some(first) = parts.first_mut() {
            if first == FAKE_RUNTIME_PATH {
                *first = self.runtime_name.clone();
            }
        }
        parts.join(" ")
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for FakeRunner {
    fn runtime_path(&self) -> Option<PathBuf> {
        self.runtime_path.read().unwrap().clone()
    }

    fn run(&self, request: &CommandRequest) -> Result<CommandResult, RunnerError> {
        let argv = match &request.program {
            Program::Runtime => {
                let path = self.runtime_path().ok_or(RunnerError::RuntimeNotFound)?;
                runtime_argv(&path, &self.runtime_name, &request.args)
            }
            Program::External(name) => std::iter::once(name.clone())
                .chain(request.args.iter().cloned())
                .collect(),
        };

        let call = RecordedCall {
            argv,
            working_dir: request.working_dir.clone(),
            output: request.output,
        };
        let line = self.line_of(&call);
        self.calls.write().unwrap().push(call);

        let scripted = self
            .scripted
            .read()
            .unwrap()
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone());

        match scripted {
            Some(Scripted::Exit { code, output }) => Ok(CommandResult::new(code, output)),
            Some(Scripted::SpawnError) => Err(RunnerError::Spawn {
                command: line,
                source: io::Error::new(io::ErrorKind::PermissionDenied, "Mock spawn failure"),
            }),
            None => Ok(CommandResult::new(0, "")),
        }
    }
}
