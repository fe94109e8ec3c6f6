//! External process execution.
//!
//! - `runner` - spawn one command, capture its output, apply the exit policy
//! - `sequence` - run commands strictly one at a time and keep every result

mod runner;
mod sequence;

#[cfg(test)]
pub(crate) mod testing;

pub use runner::{
    CommandDescriptor, CommandOptions, CommandResult, CommandRunner, SystemRunner,
    DEFAULT_NAMESPACE,
};
pub use sequence::{run_all, CommandResults, CommandSequence};
