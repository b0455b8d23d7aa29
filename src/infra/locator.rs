use std::fmt::Debug;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, trace};

pub const DEFAULT_RUNTIME_NAME: &str = "docker";

pub fn default_candidates() -> Vec<PathBuf> {
    [
        "/usr/local/bin/docker",
        "/usr/bin/docker",
        "/opt/homebrew/bin/docker",
        "/Applications/Docker.app/Contents/Resources/bin/docker",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

/// PATH search for a command name. Returns the raw answer (untrimmed), or
/// `None` if the lookup itself could not run.
pub trait PathLookup: Send + Sync + Debug {
    fn lookup(&self, program: &str) -> Option<String>;
}

/// Asks `which`.
#[derive(Debug, Default)]
pub struct WhichLookup;

impl PathLookup for WhichLookup {
    fn lookup(&self, program: &str) -> Option<String> {
        let output = Command::new("which")
            .arg(program)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Finds the container runtime executable. Holds no cache: every call to
/// `locate` probes the filesystem again.
#[derive(Debug, Clone)]
pub struct RuntimeLocator {
    program: String,
    candidates: Vec<PathBuf>,
    lookup: Arc<dyn PathLookup>,
}

impl RuntimeLocator {
    pub fn new(program: impl Into<String>, candidates: Vec<PathBuf>) -> Self {
        Self::with_lookup(program, candidates, Arc::new(WhichLookup))
    }

    pub fn with_lookup(
        program: impl Into<String>,
        candidates: Vec<PathBuf>,
        lookup: Arc<dyn PathLookup>,
    ) -> Self {
        Self {
            program: program.into(),
            candidates,
            lookup,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(found) = self.candidates.iter().find(|path| path.exists()) {
            trace!("Runtime found at fixed candidate {:?}", found);
            return Some(found.clone());
        }

        let answer = self.lookup.lookup(&self.program)?;
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            debug!("{} not found on PATH", self.program);
            return None;
        }

        let path = PathBuf::from(trimmed);
        if path.exists() {
            trace!("Runtime found on PATH at {:?}", path);
            Some(path)
        } else {
            debug!("PATH lookup returned {:?}, which does not exist", path);
            None
        }
    }
}

impl Default for RuntimeLocator {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_NAME, default_candidates())
    }
}
