mod command;
mod error;
mod outcome;
mod settings;
mod topology;
pub mod traits;

pub use command::{CommandRequest, CommandResult, OutputMode, Program, runtime_argv};
pub use error::{DeployError, RunnerError};
pub use outcome::{OperationReport, StepOutcome, StepRecord};
pub use settings::{DeploySettings, InfraProject};
pub use topology::{
    ENV_ACTIVE_PROFILE, ENV_DATASOURCE_PASSWORD, ENV_DATASOURCE_URL, ENV_DATASOURCE_USERNAME,
    ENV_REGISTRY_URL, ServiceContainer, ServiceEnv, Topology,
};
pub use traits::CommandRunner;
