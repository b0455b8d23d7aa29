use super::ComposeDriver;
use crate::domain::{
    CommandRequest, CommandResult, CommandRunner, DeployError, DeploySettings, OperationReport,
    StepOutcome, Topology,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a failed `rmi` most likely meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRemoval {
    /// The image was not there to begin with.
    Absent,
    /// The image exists but could not be removed.
    Failed,
}

pub fn classify_image_removal(output: &str) -> ImageRemoval {
    let lowered = output.to_lowercase();
    if lowered.contains("no such image") || lowered.contains("image not known") {
        ImageRemoval::Absent
    } else {
        ImageRemoval::Failed
    }
}

/// Drives build, start, stop, rebuild and log-tail for one service across
/// the three topologies. Every operation returns an `OperationReport`;
/// nothing here panics or propagates past the operation boundary.
pub struct LifecycleManager {
    runner: Arc<dyn CommandRunner>,
    compose: ComposeDriver,
    settings: DeploySettings,
}

impl LifecycleManager {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: DeploySettings) -> Self {
        let compose = ComposeDriver::new(
            runner.clone(),
            &settings.project_dir,
            settings.compose_file.clone(),
            settings.service_only_file.clone(),
        );

        Self {
            runner,
            compose,
            settings,
        }
    }

    pub fn start(&self, topology: Topology) -> OperationReport {
        if topology == Topology::Standalone {
            return self.run_standalone(false);
        }

        let failure_hint = match topology {
            Topology::ServiceOnly => {
                "Make sure the infrastructure services are already running (deckhand infra)"
            }
            _ => "Make sure the Docker daemon (Docker Desktop) is running",
        };

        self.operation(&format!("start {topology}"), Some(failure_hint), |report| {
            info!("🚀 Starting service ({topology})...");
            self.compose_step(report, topology, "compose up", &["up", "-d"])?;

            report.hint(format!("View logs: deckhand {} logs", cli_group(topology)));
            report.hint("Check status: deckhand status");
            Ok(())
        })
    }

    pub fn stop(&self, topology: Topology) -> OperationReport {
        self.operation(&format!("stop {topology}"), None, |report| {
            info!("💤 Stopping service ({topology})...");
            if topology == Topology::Standalone {
                let name = self.settings.service.name.as_str();
                self.critical(report, "stop container", &self.runtime(["stop", name]))?;
                self.best_effort(report, "remove container", &self.runtime(["rm", name]))?;
                return Ok(());
            }

            self.compose_step(report, topology, "compose down", &["down"])?;
            Ok(())
        })
    }

    /// Stop, then start. A failed stop does not prevent the start attempt,
    /// except when the runtime is missing altogether.
    pub fn restart(&self, topology: Topology) -> OperationReport {
        let mut report = OperationReport::new(format!("restart {topology}"));

        let stopped = self.stop(topology);
        report.steps.extend(stopped.steps);

        if let Some(err) = stopped.error {
            if err.is_runtime_unavailable() {
                error!("{}", err);
                report.fail(err);
                return report;
            }
            warn!("Stop failed, starting anyway: {}", err);
        }

        report.absorb(self.start(topology));
        report
    }

    pub fn build_image(&self) -> OperationReport {
        self.operation("build image", None, |report| {
            self.require_runtime()?;
            self.build_artifact(report)?;
            self.build_image_step(report)?;

            report.hint(format!("Image {} built", self.settings.service.image));
            Ok(())
        })
    }

    /// Artifact build followed by a normal start.
    pub fn build_and_run(&self, topology: Topology) -> OperationReport {
        if topology == Topology::Standalone {
            return self.run_standalone(true);
        }

        let mut report = OperationReport::new(format!("build and run {topology}"));
        let built = self.operation("build artifact", None, |report| {
            self.require_runtime()?;
            self.build_artifact(report)
        });

        let failed = !built.succeeded();
        report.absorb(built);
        if failed {
            return report;
        }

        report.absorb(self.start(topology));
        report
    }

    /// Forced stop, old image removal, fresh image, start. Cleanup steps are
    /// best effort; the image build and the start are not.
    pub fn rebuild(&self, topology: Topology) -> OperationReport {
        let failure_hint = match topology {
            Topology::Standalone => self.network_hint(),
            Topology::ServiceOnly => {
                "Make sure the infrastructure services are already running (deckhand infra)"
                    .to_string()
            }
            Topology::FullStack => {
                "Make sure the Docker daemon (Docker Desktop) is running".to_string()
            }
        };

        self.operation(&format!("rebuild {topology}"), Some(failure_hint.as_str()), |report| {
            self.require_runtime()?;
            self.build_artifact(report)?;

            if topology == Topology::Standalone {
                self.remove_standalone_container(report)?;
            } else {
                let down =
                    self.compose_step_best_effort(report, topology, "compose down", &["down"])?;
                if down == StepOutcome::Ok {
                    info!("✅ Service stopped and removed");
                }
            }

            self.remove_image(report)?;

            info!("🔨 Building Docker image...");
            self.build_image_step(report)?;

            info!("🚀 Starting service...");
            if topology == Topology::Standalone {
                self.run_container(report)?;
                report.hint(self.access_hint());
            } else {
                self.compose_step(report, topology, "compose up", &["up", "-d"])?;
            }

            report.hint(format!("View logs: deckhand {} logs", cli_group(topology)));
            Ok(())
        })
    }

    /// Follows the service container's logs until interrupted.
    pub fn logs(&self) -> OperationReport {
        self.operation("logs", None, |report| {
            let name = self.settings.service.name.as_str();
            let request = self.runtime(["logs", "-f", name]).streamed();
            self.critical(report, "tail logs", &request)?;
            Ok(())
        })
    }

    /// Container table. Best effort: a non-zero exit is shown, not failed.
    pub fn status(&self) -> OperationReport {
        self.operation("status", None, |report| {
            let request = self.runtime(["ps", "--format", self.settings.status_format.as_str()]);

            match self.execute(&request) {
                Ok(result) => {
                    report.record("list containers", StepOutcome::Ok);
                    report.output = Some(result.output);
                }
                Err(DeployError::CommandFailed { output, exit_code, .. }) => {
                    debug!("ps exited with {exit_code}, ignored");
                    report.record("list containers", StepOutcome::BestEffortFailed);
                    report.output = Some(output);
                }
                Err(err) => {
                    report.record("list containers", StepOutcome::CriticalFailed);
                    return Err(err);
                }
            }
            Ok(())
        })
    }

    /// Replaces the standalone container: stop and remove whatever is there,
    /// then `run` a fresh one on the shared network.
    pub fn run_standalone(&self, build_first: bool) -> OperationReport {
        let failure_hint = self.network_hint();

        self.operation("run standalone", Some(failure_hint.as_str()), |report| {
            if build_first {
                self.require_runtime()?;
                self.build_artifact(report)?;
                self.build_image_step(report)?;
            }

            self.remove_standalone_container(report)?;
            self.run_container(report)?;

            report.hint(self.access_hint());
            report.hint("View logs: deckhand standalone logs");
            Ok(())
        })
    }

    /// Starts the shared infrastructure from the sibling project. Nothing is
    /// spawned unless both the directory and the runtime are present.
    pub fn infra_only(&self) -> OperationReport {
        self.operation("infra", None, |report| {
            let infra = &self.settings.infra;
            if !infra.dir.is_dir() {
                return Err(DeployError::PreconditionMissing {
                    what: "infrastructure project directory".to_string(),
                    path: infra.dir.clone(),
                });
            }

            self.require_runtime()?;

            info!("🚀 Starting {} from {:?}", infra.services.join(", "), infra.dir);
            let args = ["compose", "up", "-d"]
                .into_iter()
                .map(String::from)
                .chain(infra.services.iter().cloned());
            let request = CommandRequest::runtime(args, &infra.dir);
            self.critical(report, "compose up infra", &request)?;

            report.hint(format!(
                "Infrastructure services started from {}",
                infra.dir.display()
            ));
            for endpoint in &infra.endpoints {
                report.hint(endpoint.clone());
            }
            Ok(())
        })
    }

    fn operation<F>(&self, name: &str, failure_hint: Option<&str>, body: F) -> OperationReport
    where
        F: FnOnce(&mut OperationReport) -> Result<(), DeployError>,
    {
        let mut report = OperationReport::new(name);
        debug!("Operation {name}");

        if let Err(err) = body(&mut report) {
            error!("{name} failed: {err}");
            if let Some(output) = err.output() {
                debug!("Captured output:\n{output}");
            }
            if let Some(hint) = failure_hint.filter(|_| !err.is_runtime_unavailable()) {
                report.hint(hint);
            }
            report.fail(err);
        }

        report
    }

    fn require_runtime(&self) -> Result<PathBuf, DeployError> {
        self.runner
            .runtime_path()
            .ok_or(DeployError::RuntimeUnavailable)
    }

    fn runtime<'a, I>(&self, args: I) -> CommandRequest
    where
        I: IntoIterator<Item = &'a str>,
    {
        CommandRequest::runtime(args, &self.settings.project_dir)
    }

    /// Runs a request; a non-zero exit becomes `CommandFailed`.
    fn execute(&self, request: &CommandRequest) -> Result<CommandResult, DeployError> {
        let result = self.runner.run(request)?;
        if result.success() {
            return Ok(result);
        }

        Err(DeployError::CommandFailed {
            command: request.display_line(),
            exit_code: result.exit_code,
            output: result.output,
        })
    }

    fn critical(
        &self,
        report: &mut OperationReport,
        label: &str,
        request: &CommandRequest,
    ) -> Result<CommandResult, DeployError> {
        match self.execute(request) {
            Ok(result) => {
                report.record(label, StepOutcome::Ok);
                Ok(result)
            }
            Err(err) => {
                report.record(label, StepOutcome::CriticalFailed);
                Err(err)
            }
        }
    }

    /// Swallows a non-zero exit. A missing runtime, a spawn failure or a
    /// timeout still abort the sequence.
    fn best_effort(
        &self,
        report: &mut OperationReport,
        label: &str,
        request: &CommandRequest,
    ) -> Result<StepOutcome, DeployError> {
        match self.execute(request) {
            Ok(_) => {
                report.record(label, StepOutcome::Ok);
                Ok(StepOutcome::Ok)
            }
            Err(DeployError::CommandFailed { output, .. }) => {
                debug!("{label} failed, ignored: {}", output.trim());
                report.record(label, StepOutcome::BestEffortFailed);
                Ok(StepOutcome::BestEffortFailed)
            }
            Err(err) => {
                report.record(label, StepOutcome::CriticalFailed);
                Err(err)
            }
        }
    }

    fn compose_request(
        &self,
        topology: Topology,
        args: &[&str],
    ) -> Result<CommandRequest, DeployError> {
        self.compose
            .request_for(topology, args)
            .ok_or_else(|| DeployError::PreconditionMissing {
                what: format!("compose file for {topology}"),
                path: self.settings.project_dir.clone(),
            })
    }

    fn compose_step(
        &self,
        report: &mut OperationReport,
        topology: Topology,
        label: &str,
        args: &[&str],
    ) -> Result<CommandResult, DeployError> {
        let request = self.compose_request(topology, args)?;
        self.critical(report, label, &request)
    }

    fn compose_step_best_effort(
        &self,
        report: &mut OperationReport,
        topology: Topology,
        label: &str,
        args: &[&str],
    ) -> Result<StepOutcome, DeployError> {
        let request = self.compose_request(topology, args)?;
        self.best_effort(report, label, &request)
    }

    fn build_artifact(&self, report: &mut OperationReport) -> Result<(), DeployError> {
        let Some((program, args)) = self.settings.artifact_command.split_first() else {
            debug!("No artifact command configured, skipping artifact build");
            return Ok(());
        };

        info!("📦 Building artifact with {program}...");
        let request = CommandRequest::external(
            program,
            args.iter().cloned(),
            &self.settings.project_dir,
        );
        self.critical(report, "build artifact", &request)?;
        Ok(())
    }

    fn build_image_step(&self, report: &mut OperationReport) -> Result<(), DeployError> {
        let image = self.settings.service.image.as_str();
        info!("🔨 Building image {image}...");
        self.critical(report, "build image", &self.runtime(["build", "-t", image, "."]))?;
        info!("✅ Docker image {image} built");
        Ok(())
    }

    /// `rmi -f` the service image. Never blocks the sequence on a non-zero
    /// exit, but tells "was not there" apart from "could not remove".
    fn remove_image(&self, report: &mut OperationReport) -> Result<(), DeployError> {
        let image = self.settings.service.image.as_str();
        let request = self.runtime(["rmi", image, "-f"]);

        match self.execute(&request) {
            Ok(_) => {
                report.record("remove image", StepOutcome::Ok);
                info!("✅ Old image {image} removed");
            }
            Err(DeployError::CommandFailed { output, .. }) => {
                report.record("remove image", StepOutcome::BestEffortFailed);
                match classify_image_removal(&output) {
                    ImageRemoval::Absent => debug!("Image {image} not present, nothing to remove"),
                    ImageRemoval::Failed => {
                        warn!("Could not remove image {image}, continuing: {}", output.trim())
                    }
                }
            }
            Err(err) => {
                report.record("remove image", StepOutcome::CriticalFailed);
                return Err(err);
            }
        }
        Ok(())
    }

    fn remove_standalone_container(&self, report: &mut OperationReport) -> Result<(), DeployError> {
        let name = self.settings.service.name.as_str();
        self.best_effort(report, "stop container", &self.runtime(["stop", name]))?;
        self.best_effort(report, "remove container", &self.runtime(["rm", name]))?;
        Ok(())
    }

    fn run_container(&self, report: &mut OperationReport) -> Result<(), DeployError> {
        let service = &self.settings.service;
        info!("🚀 Running {} on network {}...", service.name, service.network);
        let request = CommandRequest::runtime(service.run_args(), &self.settings.project_dir);
        self.critical(report, "run container", &request)?;
        Ok(())
    }

    fn access_hint(&self) -> String {
        format!("Access at: http://localhost:{}", self.settings.service.host_port())
    }

    fn network_hint(&self) -> String {
        format!(
            "Make sure the shared infrastructure containers are running and reachable on network {}",
            self.settings.service.network
        )
    }
}

fn cli_group(topology: Topology) -> &'static str {
    match topology {
        Topology::FullStack => "stack",
        Topology::ServiceOnly => "service",
        Topology::Standalone => "standalone",
    }
}

const CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        "Full stack (service and infrastructure from the default compose file)",
        &[
            ("deckhand stack up", "Start all services"),
            ("deckhand stack down", "Stop all services"),
            ("deckhand stack restart", "Restart all services"),
            ("deckhand stack build-and-run", "Build the artifact and start all services"),
            ("deckhand stack rebuild", "Stop, remove the old image, rebuild and start"),
            ("deckhand stack logs", "Follow the service logs"),
        ],
    ),
    (
        "Service only (infrastructure already running)",
        &[
            ("deckhand service up", "Start only the service"),
            ("deckhand service down", "Stop only the service (infrastructure keeps running)"),
            ("deckhand service restart", "Restart only the service"),
            ("deckhand service build-and-run", "Build the artifact and start only the service"),
            (
                "deckhand service rebuild",
                "Completely rebuild and run (removes old container and image)",
            ),
            ("deckhand service logs", "Follow the service logs"),
        ],
    ),
    (
        "Standalone container (outside compose)",
        &[
            (
                "deckhand standalone run",
                "Replace and run the service container on the shared network",
            ),
            ("deckhand standalone run --build", "Build the image first, then run"),
            ("deckhand standalone stop", "Stop and remove the service container"),
            ("deckhand standalone rebuild", "Remove container and image, rebuild and run"),
            ("deckhand standalone logs", "Follow the service logs"),
        ],
    ),
    (
        "Other",
        &[
            ("deckhand build", "Build the artifact and the Docker image"),
            ("deckhand status", "Show container status"),
            ("deckhand infra", "Run only the infrastructure from the sibling platform project"),
            ("deckhand commands", "Show this list"),
            ("deckhand setup", "Write a default deckhand.toml"),
        ],
    ),
];

/// Human-readable list of every command, grouped by topology.
pub fn command_catalog() -> String {
    let width = CATALOG
        .iter()
        .flat_map(|(_, entries)| entries.iter())
        .map(|(cmd, _)| cmd.len())
        .max()
        .unwrap_or(0);

    let mut out = String::from("=== Service Deployment Commands ===\n");
    for (section, entries) in CATALOG {
        out.push('\n');
        out.push_str(section);
        out.push_str(":\n");
        for (cmd, description) in *entries {
            out.push_str(&format!("  {cmd:<width$}  - {description}\n"));
        }
    }
    out.push_str(
        "\nNote: use the service commands when the database, cache and registry are already running.\n",
    );
    out
}
