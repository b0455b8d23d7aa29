use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failures of the command runner itself. A non-zero exit is not one of them.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("container runtime executable not found")]
    RuntimeNotFound,
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Why a lifecycle step, and with it the operation, did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(
        "container runtime not found; make sure Docker is installed and running (you can also run the commands directly from a terminal)"
    )]
    RuntimeUnavailable,
    #[error("command failed ({exit_code}): {command}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },
    #[error("{what} not found at {}", path.display())]
    PreconditionMissing { what: String, path: PathBuf },
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

impl DeployError {
    /// Captured output of a failed command, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }

    pub fn is_runtime_unavailable(&self) -> bool {
        matches!(self, Self::RuntimeUnavailable)
    }
}

impl From<RunnerError> for DeployError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::RuntimeNotFound => Self::RuntimeUnavailable,
            RunnerError::Spawn { command, source } => Self::Spawn { command, source },
            RunnerError::Timeout { command, timeout } => Self::Timeout { command, timeout },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_not_found_maps_to_unavailable() {
        let err: DeployError = RunnerError::RuntimeNotFound.into();
        assert!(err.is_runtime_unavailable());
    }

    #[test]
    fn test_output_only_for_non_empty_failures() {
        let err = DeployError::CommandFailed {
            command: "<runtime> ps".into(),
            exit_code: 1,
            output: "  \n".into(),
        };
        assert_eq!(err.output(), None);

        let err = DeployError::CommandFailed {
            command: "<runtime> ps".into(),
            exit_code: 1,
            output: "Cannot connect to the Docker daemon".into(),
        };
        assert_eq!(err.output(), Some("Cannot connect to the Docker daemon"));
    }

    #[test]
    fn test_precondition_message_names_path() {
        let err = DeployError::PreconditionMissing {
            what: "core platform directory".into(),
            path: PathBuf::from("../core-platform"),
        };
        assert_eq!(
            err.to_string(),
            "core platform directory not found at ../core-platform"
        );
    }
}
