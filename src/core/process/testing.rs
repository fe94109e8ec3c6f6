//! Scripted runner for tests: records every call and answers from a script.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use super::runner::{CommandDescriptor, CommandOptions, CommandResult, CommandRunner};
use crate::error::{Error, ProcessNonZeroExitDetails, Result};

#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: RefCell<Vec<String>>,
    options: RefCell<Vec<CommandOptions>>,
    responses: RefCell<HashMap<String, VecDeque<String>>>,
    failing: HashSet<String>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a stdout answer for the next call of `formatted`.
    pub(crate) fn respond(self, formatted: &str, stdout: &str) -> Self {
        self.responses
            .borrow_mut()
            .entry(formatted.to_string())
            .or_default()
            .push_back(stdout.to_string());
        self
    }

    /// Make `formatted` exit with code 1.
    pub(crate) fn fail_on(mut self, formatted: &str) -> Self {
        self.failing.insert(formatted.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(crate) fn options(&self) -> Vec<CommandOptions> {
        self.options.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, descriptor: &CommandDescriptor) -> Result<CommandResult> {
        let formatted = descriptor.formatted();
        self.calls.borrow_mut().push(formatted.clone());
        self.options.borrow_mut().push(descriptor.options.clone());

        let stdout = self
            .responses
            .borrow_mut()
            .get_mut(&formatted)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_default();

        if self.failing.contains(&formatted) {
            if descriptor.options.should_exit_on_error() {
                return Err(Error::process_non_zero_exit(ProcessNonZeroExitDetails {
                    command: formatted,
                    exit_code: 1,
                    stdout,
                    stderr: "scripted failure".to_string(),
                }));
            }
            return Ok(CommandResult {
                formatted_command: formatted,
                exit_code: 1,
                stdout,
                stderr: "scripted failure".to_string(),
                label: descriptor.label.clone(),
            });
        }

        Ok(CommandResult {
            formatted_command: formatted,
            exit_code: 0,
            stdout,
            stderr: String::new(),
            label: descriptor.label.clone(),
        })
    }
}
