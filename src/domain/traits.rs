use super::{CommandRequest, CommandResult, RunnerError};
use std::fmt::Debug;
use std::path::PathBuf;

/// Executes commands against the host. The only seam between the lifecycle
/// logic and real processes.
pub trait CommandRunner: Send + Sync + Debug {
    /// Resolves the runtime executable afresh; `None` when it is absent.
    fn runtime_path(&self) -> Option<PathBuf>;

    /// Runs a request to completion. Non-zero exits come back as `Ok`.
    fn run(&self, request: &CommandRequest) -> Result<CommandResult, RunnerError>;
}
