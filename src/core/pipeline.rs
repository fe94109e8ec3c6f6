//! Ordered workflows over one shared, mutable context.
//!
//! Steps run strictly one after another; each gets exclusive `&mut` access to
//! the context for its duration. The first failing step stops the run and the
//! remaining steps are recorded as skipped. What happens to that failure is
//! decided by the workflow's [`FailurePolicy`].

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::logging;

type StepFn<'a, C> = Box<dyn FnMut(&mut C) -> Result<()> + 'a>;

/// One named unit of work.
pub struct Step<'a, C> {
    pub id: String,
    pub label: Option<String>,
    run: StepFn<'a, C>,
}

impl<'a, C> Step<'a, C> {
    pub fn new<F>(id: impl Into<String>, run: F) -> Self
    where
        F: FnMut(&mut C) -> Result<()> + 'a,
    {
        Self {
            id: id.into(),
            label: None,
            run: Box::new(run),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// A step that only emits a progress line.
    pub fn log(id: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(id, move |_| {
            logging::event(&message);
            Ok(())
        })
    }
}

impl<'a> Step<'a, Configuration> {
    /// A step whose return value is written into the configuration at `path`.
    pub fn merge<T, F>(id: impl Into<String>, path: impl Into<String>, mut produce: F) -> Self
    where
        T: Serialize,
        F: FnMut(&Configuration) -> Result<T> + 'a,
    {
        let path = path.into();
        Self::new(id, move |config: &mut Configuration| {
            let value = produce(config)?;
            config.set(&path, value)
        })
    }
}

/// What a workflow does with the first step failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the step's error to the caller.
    #[default]
    Propagate,
    /// Hand the error to the reporter once and resolve with a failed run.
    Report,
}

pub trait FailureReporter {
    fn report(&self, workflow: &str, step: &str, error: &Error);
}

impl<R: FailureReporter + ?Sized> FailureReporter for &R {
    fn report(&self, workflow: &str, step: &str, error: &Error) {
        (**self).report(workflow, step, error)
    }
}

/// Reports to the diagnostic log and the user's terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report(&self, workflow: &str, step: &str, error: &Error) {
        tracing::error!(workflow, step, code = error.code.as_str(), "workflow step failed");
        crate::log_status!("workflow", "{} failed at step '{}'", workflow, step);
        logging::error(error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub workflow: String,
    pub status: WorkflowStatus,
    pub started_at: String,
    pub steps: Vec<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub summary: WorkflowSummary,
}

impl WorkflowRun {
    pub fn succeeded(&self) -> bool {
        self.status == WorkflowStatus::Success
    }
}

pub struct Workflow<'a, C> {
    name: String,
    steps: Vec<Step<'a, C>>,
    policy: FailurePolicy,
    reporter: Box<dyn FailureReporter + 'a>,
}

impl<'a, C> Workflow<'a, C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            policy: FailurePolicy::default(),
            reporter: Box::new(LogReporter),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(mut self, step: Step<'a, C>) -> Self {
        self.steps.push(step);
        self
    }

    /// Shorthand for `step(Step::new(id, run))`.
    pub fn then<F>(self, id: impl Into<String>, run: F) -> Self
    where
        F: FnMut(&mut C) -> Result<()> + 'a,
    {
        self.step(Step::new(id, run))
    }

    pub fn steps<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = Step<'a, C>>,
    {
        self.steps.extend(steps);
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn reporter<R: FailureReporter + 'a>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Run every step in order against `context`.
    pub fn run(self, context: &mut C) -> Result<WorkflowRun> {
        let Workflow {
            name,
            steps,
            policy,
            reporter,
        } = self;

        let started_at = chrono::Utc::now().to_rfc3339();
        let mut results = Vec::with_capacity(steps.len());
        let mut failure: Option<(String, Error)> = None;

        for mut step in steps {
            if failure.is_some() {
                results.push(StepResult {
                    id: step.id,
                    label: step.label,
                    status: StepStatus::Skipped,
                    duration_ms: None,
                    error: None,
                });
                continue;
            }

            let span = tracing::info_span!("step", workflow = %name, step = %step.id);
            let _entered = span.enter();
            tracing::debug!("step started");

            let started = Instant::now();
            let outcome = (step.run)(context);
            let duration_ms = Some(started.elapsed().as_millis() as u64);

            match outcome {
                Ok(()) => {
                    tracing::debug!(duration_ms, "step completed");
                    results.push(StepResult {
                        id: step.id,
                        label: step.label,
                        status: StepStatus::Success,
                        duration_ms,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::debug!(code = err.code.as_str(), "step failed");
                    results.push(StepResult {
                        id: step.id.clone(),
                        label: step.label,
                        status: StepStatus::Failed,
                        duration_ms,
                        error: Some(err.message.clone()),
                    });
                    failure = Some((step.id, err));
                }
            }
        }

        let Some((failed_step, err)) = failure else {
            let summary = build_summary(&results, WorkflowStatus::Success);
            return Ok(WorkflowRun {
                workflow: name,
                status: WorkflowStatus::Success,
                started_at,
                steps: results,
                failed_step: None,
                error: None,
                error_code: None,
                summary,
            });
        };

        match policy {
            FailurePolicy::Propagate => Err(err),
            FailurePolicy::Report => {
                reporter.report(&name, &failed_step, &err);
                let summary = build_summary(&results, WorkflowStatus::Failed);
                Ok(WorkflowRun {
                    workflow: name,
                    status: WorkflowStatus::Failed,
                    started_at,
                    steps: results,
                    failed_step: Some(failed_step),
                    error: Some(err.message),
                    error_code: Some(err.code.as_str().to_string()),
                    summary,
                })
            }
        }
    }
}

fn build_summary(results: &[StepResult], status: WorkflowStatus) -> WorkflowSummary {
    let count = |wanted: StepStatus| results.iter().filter(|r| r.status == wanted).count();

    let next_actions = match status {
        WorkflowStatus::Failed => {
            vec!["Fix the issue and re-run the command".to_string()]
        }
        WorkflowStatus::Success => Vec::new(),
    };

    WorkflowSummary {
        total_steps: results.len(),
        succeeded: count(StepStatus::Success),
        failed: count(StepStatus::Failed),
        skipped: count(StepStatus::Skipped),
        next_actions,
    }
}
