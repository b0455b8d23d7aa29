use crate::domain::{OperationReport, Topology};
use crate::services::LifecycleManager;
use clap::{Args, Subcommand};

/// Lifecycle of the service through one of the compose files.
#[derive(Args, Debug)]
pub struct ComposeCommand {
    #[command(subcommand)]
    pub action: ComposeAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    /// compose up -d
    Up,
    /// compose down
    Down,
    /// Down, then up
    Restart,
    /// Build the artifact, then up
    BuildAndRun,
    /// Down, remove the old image, build a fresh one, up
    Rebuild,
    /// Follow the service container logs
    Logs,
}

/// The service as a single container outside compose.
#[derive(Args, Debug)]
pub struct StandaloneCommand {
    #[command(subcommand)]
    pub action: StandaloneAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandaloneAction {
    /// Replace the container and run it on the shared network
    Run {
        /// Build the artifact and image first
        #[arg(long)]
        build: bool,
    },
    /// Stop and remove the container
    Stop,
    /// Stop, then run again
    Restart,
    /// Remove container and image, rebuild, run
    Rebuild,
    /// Follow the container logs
    Logs,
}

pub fn run_compose(
    manager: &LifecycleManager,
    topology: Topology,
    action: ComposeAction,
) -> OperationReport {
    match action {
        ComposeAction::Up => manager.start(topology),
        ComposeAction::Down => manager.stop(topology),
        ComposeAction::Restart => manager.restart(topology),
        ComposeAction::BuildAndRun => manager.build_and_run(topology),
        ComposeAction::Rebuild => manager.rebuild(topology),
        ComposeAction::Logs => manager.logs(),
    }
}

pub fn run_standalone(manager: &LifecycleManager, action: StandaloneAction) -> OperationReport {
    match action {
        StandaloneAction::Run { build } => manager.run_standalone(build),
        StandaloneAction::Stop => manager.stop(Topology::Standalone),
        StandaloneAction::Restart => manager.restart(Topology::Standalone),
        StandaloneAction::Rebuild => manager.rebuild(Topology::Standalone),
        StandaloneAction::Logs => manager.logs(),
    }
}
