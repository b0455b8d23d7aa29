use super::locator::RuntimeLocator;
use crate::domain::{
    CommandRequest, CommandResult, CommandRunner, DeploySettings, OutputMode, Program, RunnerError,
    runtime_argv,
};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs commands as real processes. Every process the crate starts goes
/// through `ProcessRunner::spawn`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    locator: RuntimeLocator,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(locator: RuntimeLocator) -> Self {
        Self {
            locator,
            timeout: None,
        }
    }

    pub fn from_settings(settings: &DeploySettings) -> Self {
        let locator = RuntimeLocator::new(
            settings.runtime_program.clone(),
            settings.runtime_candidates.clone(),
        );
        Self::new(locator).with_timeout(settings.command_timeout)
    }

    /// Bounds the wait on captured commands. Streamed commands are never cut.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn argv(&self, request: &CommandRequest) -> Result<Vec<String>, RunnerError> {
        match &request.program {
            Program::Runtime => {
                let path = self.locator.locate().ok_or(RunnerError::RuntimeNotFound)?;
                Ok(runtime_argv(&path, self.locator.program(), &request.args))
            }
            Program::External(name) => Ok(std::iter::once(name.clone())
                .chain(request.args.iter().cloned())
                .collect()),
        }
    }

    fn spawn(
        &self,
        argv: &[String],
        request: &CommandRequest,
    ) -> Result<CommandResult, RunnerError> {
        let description = request.display_line();
        let spawn_error = |source: io::Error| RunnerError::Spawn {
            command: description.clone(),
            source,
        };

        let Some((program, args)) = argv.split_first() else {
            return Err(spawn_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty command line",
            )));
        };

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&request.working_dir);
        debug!("Running {:?} in {:?}", argv, request.working_dir);

        if request.output == OutputMode::Stream {
            let status = cmd.status().map_err(spawn_error)?;
            return Ok(CommandResult::new(exit_code(status), String::new()));
        }

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.timeout {
            None => child.wait().map_err(spawn_error)?,
            Some(limit) => match wait_with_deadline(&mut child, limit).map_err(spawn_error)? {
                Some(status) => status,
                None => {
                    warn!("{} exceeded {:?}, killed", description, limit);
                    return Err(RunnerError::Timeout {
                        command: description,
                        timeout: limit,
                    });
                }
            },
        };

        let mut output = collect(stdout);
        output.push_str(&collect(stderr));

        let result = CommandResult::new(exit_code(status), output);
        trace!("{} exited with {}", description, result.exit_code);
        Ok(result)
    }
}

impl CommandRunner for ProcessRunner {
    fn runtime_path(&self) -> Option<PathBuf> {
        self.locator.locate()
    }

    fn run(&self, request: &CommandRequest) -> Result<CommandResult, RunnerError> {
        let argv = self.argv(request)?;
        self.spawn(&argv, request)
    }
}

fn drain<R>(mut pipe: R) -> JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// The parts of a child process the deadline wait needs.
trait Reapable {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl Reapable for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// `Ok(None)` means the deadline passed and the child was killed. A failed
/// poll kills the child too before the error is returned.
fn wait_with_deadline<C: Reapable>(
    child: &mut C,
    limit: Duration,
) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err);
            }
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

// Killed by a signal: no code.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
