use super::DeployError;

/// Result of a single step inside a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Ok,
    /// Cleanup step failed; swallowed, the sequence continues.
    BestEffortFailed,
    /// Step whose failure ends the sequence.
    CriticalFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub label: String,
    pub outcome: StepOutcome,
}

/// What a lifecycle operation did, and whether it succeeded.
#[derive(Debug)]
pub struct OperationReport {
    pub operation: String,
    pub steps: Vec<StepRecord>,
    pub error: Option<DeployError>,
    pub hints: Vec<String>,
    /// Captured output worth showing even on success (status tables).
    pub output: Option<String>,
}

impl OperationReport {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            steps: Vec::new(),
            error: None,
            hints: Vec::new(),
            output: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn record(&mut self, label: impl Into<String>, outcome: StepOutcome) {
        self.steps.push(StepRecord {
            label: label.into(),
            outcome,
        });
    }

    pub fn hint(&mut self, text: impl Into<String>) {
        self.hints.push(text.into());
    }

    pub fn fail(&mut self, error: DeployError) {
        self.error = Some(error);
    }

    pub fn outcome_of(&self, label: &str) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|step| step.label == label)
            .map(|step| step.outcome)
    }

    pub fn step_labels(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.label.as_str()).collect()
    }

    /// Folds a sub-operation (stop inside restart) into this report.
    pub fn absorb(&mut self, other: OperationReport) {
        self.steps.extend(other.steps);
        self.hints.extend(other.hints);
        if self.output.is_none() {
            self.output = other.output;
        }
        if self.error.is_none() {
            self.error = other.error;
        }
    }
}
