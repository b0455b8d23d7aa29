use crate::domain::{CommandRequest, CommandResult, CommandRunner, RunnerError, Topology};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Issues `compose` subcommands through the command runner.
pub struct ComposeDriver {
    runner: Arc<dyn CommandRunner>,
    working_dir: PathBuf,
    full_stack_file: Option<PathBuf>,
    service_only_file: PathBuf,
}

impl ComposeDriver {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        working_dir: &Path,
        full_stack_file: Option<PathBuf>,
        service_only_file: PathBuf,
    ) -> Self {
        Self {
            runner,
            working_dir: working_dir.to_path_buf(),
            full_stack_file,
            service_only_file,
        }
    }

    /// `compose <args>` against the runtime's default file.
    pub fn compose_request(&self, args: &[&str]) -> CommandRequest {
        let argv = std::iter::once("compose").chain(args.iter().copied());
        CommandRequest::runtime(argv, &self.working_dir)
    }

    /// `compose -f <file> <args>`.
    pub fn compose_with_file_request(&self, file: &Path, args: &[&str]) -> CommandRequest {
        let file = file.to_string_lossy();
        let argv = ["compose", "-f", &*file]
            .into_iter()
            .chain(args.iter().copied());
        CommandRequest::runtime(argv, &self.working_dir)
    }

    /// The compose file selection for a topology. `None` for standalone,
    /// which never goes through compose.
    pub fn request_for(&self, topology: Topology, args: &[&str]) -> Option<CommandRequest> {
        if !topology.uses_compose() {
            return None;
        }

        Some(match (topology, &self.full_stack_file) {
            (Topology::ServiceOnly, _) => {
                self.compose_with_file_request(&self.service_only_file, args)
            }
            (_, Some(file)) => self.compose_with_file_request(file, args),
            (_, None) => self.compose_request(args),
        })
    }

    pub fn compose(&self, args: &[&str]) -> Result<CommandResult, RunnerError> {
        self.runner.run(&self.compose_request(args))
    }

    pub fn compose_with_file(
        &self,
        file: &Path,
        args: &[&str],
    ) -> Result<CommandResult, RunnerError> {
        self.runner.run(&self.compose_with_file_request(file, args))
    }

    /// Success predicate over `compose`: true iff the exit code is zero.
    pub fn compose_succeeded(&self, args: &[&str]) -> bool {
        self.compose(args).map(|r| r.success()).unwrap_or(false)
    }

    pub fn compose_with_file_succeeded(&self, file: &Path, args: &[&str]) -> bool {
        self.compose_with_file(file, args)
            .map(|r| r.success())
            .unwrap_or(false)
    }
}
