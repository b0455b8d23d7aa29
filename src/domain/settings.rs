use super::ServiceContainer;
use std::path::PathBuf;
use std::time::Duration;

/// Sibling project providing the shared infrastructure (database, cache,
/// registry) for `infra`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraProject {
    pub dir: PathBuf,
    pub services: Vec<String>,
    /// Printed after a successful start, e.g. `MySQL: localhost:3306`.
    pub endpoints: Vec<String>,
}

/// Fully resolved settings for one service. Built by `infra::config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    /// Working directory for every command except `infra`.
    pub project_dir: PathBuf,
    pub runtime_program: String,
    pub runtime_candidates: Vec<PathBuf>,
    pub command_timeout: Option<Duration>,
    pub status_format: String,
    /// Artifact build run before image builds; empty disables the step.
    pub artifact_command: Vec<String>,
    /// `None` lets the runtime pick its default compose file.
    pub compose_file: Option<PathBuf>,
    pub service_only_file: PathBuf,
    pub service: ServiceContainer,
    pub infra: InfraProject,
}
