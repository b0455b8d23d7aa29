use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use deckhand::cli::{ComposeCommand, StandaloneCommand, deploy, init_tracing, report, setup};
use deckhand::infra::config::{self, load_settings};
use deckhand::services::command_catalog;
use deckhand::{LifecycleManager, ProcessRunner, Topology};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "deckhand",
    version,
    about = "Build, run and rebuild one service container across compose and standalone setups"
)]
struct Cli {
    /// Global config directory (default: ~/.config/deckhand)
    #[arg(long, env = "DECKHAND_CONFIG_DIR", default_value_os_t = config::default_config_dir())]
    config_dir: PathBuf,

    /// Project directory: compose files, Dockerfile and the artifact build live here
    #[arg(long, env = "DECKHAND_PROJECT_DIR", default_value = ".")]
    project_dir: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service plus infrastructure from the default compose file
    Stack(ComposeCommand),
    /// Only the service, infrastructure already running
    Service(ComposeCommand),
    /// The service as a single container on the shared network
    Standalone(StandaloneCommand),
    /// Build the artifact and the Docker image
    Build,
    /// Show container status
    Status,
    /// Start only the infrastructure from the sibling platform project
    Infra,
    /// List every available command
    Commands,
    /// Write a default deckhand.toml
    Setup {
        /// Write into the project directory instead of the config directory
        #[arg(long)]
        local: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let manager = || -> Result<LifecycleManager> {
        let settings = load_settings(&cli.config_dir, &cli.project_dir)?;
        let runner = Arc::new(ProcessRunner::from_settings(&settings));
        Ok(LifecycleManager::new(runner, settings))
    };

    let outcome = match cli.command {
        Commands::Setup { local } => {
            let target = if local { &cli.project_dir } else { &cli.config_dir };
            setup::install(target)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Commands => {
            print!("{}", command_catalog());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Stack(cmd) => deploy::run_compose(&manager()?, Topology::FullStack, cmd.action),
        Commands::Service(cmd) => {
            deploy::run_compose(&manager()?, Topology::ServiceOnly, cmd.action)
        }
        Commands::Standalone(cmd) => deploy::run_standalone(&manager()?, cmd.action),
        Commands::Build => manager()?.build_image(),
        Commands::Status => manager()?.status(),
        Commands::Infra => manager()?.infra_only(),
    };

    report::print(&outcome);
    Ok(if outcome.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
