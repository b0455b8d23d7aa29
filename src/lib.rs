pub mod cli;
pub mod domain;
pub mod infra;
pub mod services;

// Fake runner shared by unit and integration tests
pub mod test_support;

pub use domain::{
    CommandRequest, CommandResult, CommandRunner, DeployError, DeploySettings, OperationReport,
    StepOutcome, Topology,
};
pub use infra::{ProcessRunner, RuntimeLocator};
pub use services::{ComposeDriver, LifecycleManager};
