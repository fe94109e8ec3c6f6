//! Run commands strictly one at a time, collecting every result.
//!
//! Results are kept by position (and optionally by label), so two commands
//! with the same formatted text never overwrite each other.

use serde::Serialize;

use super::runner::{CommandDescriptor, CommandOptions, CommandResult, CommandRunner};
use crate::error::Result;

/// Ordered results of a sequence run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandResults {
    entries: Vec<CommandResult>,
}

impl CommandResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandResult> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CommandResult> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&CommandResult> {
        self.entries.last()
    }

    pub fn by_label(&self, label: &str) -> Option<&CommandResult> {
        self.entries
            .iter()
            .find(|r| r.label.as_deref() == Some(label))
    }

    /// Every result whose formatted command matches, in run order.
    pub fn all_for_command(&self, formatted: &str) -> Vec<&CommandResult> {
        self.entries
            .iter()
            .filter(|r| r.formatted_command == formatted)
            .collect()
    }

    pub fn last_for_command(&self, formatted: &str) -> Option<&CommandResult> {
        self.entries
            .iter()
            .rev()
            .find(|r| r.formatted_command == formatted)
    }

    pub fn stdouts(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.stdout.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<CommandResult> {
        self.entries
    }

    fn push(&mut self, result: CommandResult) {
        self.entries.push(result);
    }
}

impl IntoIterator for CommandResults {
    type Item = CommandResult;
    type IntoIter = std::vec::IntoIter<CommandResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandResults {
    type Item = &'a CommandResult;
    type IntoIter = std::slice::Iter<'a, CommandResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

type DeferredCommand<'a> = Box<dyn FnOnce(&CommandResults) -> Result<CommandDescriptor> + 'a>;

enum PendingCommand<'a> {
    Fixed(CommandDescriptor),
    Deferred(DeferredCommand<'a>),
}

/// A list of commands to run in order. Commands may be fixed up front or
/// built from the results of the commands before them.
pub struct CommandSequence<'a> {
    shared: CommandOptions,
    commands: Vec<PendingCommand<'a>>,
}

impl<'a> CommandSequence<'a> {
    pub fn new(shared: CommandOptions) -> Self {
        Self {
            shared,
            commands: Vec::new(),
        }
    }

    pub fn push(mut self, descriptor: CommandDescriptor) -> Self {
        self.commands.push(PendingCommand::Fixed(descriptor));
        self
    }

    pub fn extend<I>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = CommandDescriptor>,
    {
        self.commands
            .extend(descriptors.into_iter().map(PendingCommand::Fixed));
        self
    }

    /// Add a command built only once every earlier command has completed.
    pub fn push_with<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&CommandResults) -> Result<CommandDescriptor> + 'a,
    {
        self.commands.push(PendingCommand::Deferred(Box::new(build)));
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run every command in order. The first failure aborts the sequence and
    /// is returned unchanged; results gathered so far are dropped.
    pub fn run(self, runner: &dyn CommandRunner) -> Result<CommandResults> {
        let mut results = CommandResults::new();

        for pending in self.commands {
            let mut descriptor = match pending {
                PendingCommand::Fixed(descriptor) => descriptor,
                PendingCommand::Deferred(build) => build(&results)?,
            };
            descriptor.options = descriptor.options.merged_over(&self.shared);

            let result = runner.run(&descriptor)?;
            results.push(result);
        }

        Ok(results)
    }
}

/// Run a fixed list of descriptors in order with shared fallback options.
pub fn run_all(
    runner: &dyn CommandRunner,
    descriptors: Vec<CommandDescriptor>,
    shared: &CommandOptions,
) -> Result<CommandResults> {
    CommandSequence::new(shared.clone())
        .extend(descriptors)
        .run(runner)
}
