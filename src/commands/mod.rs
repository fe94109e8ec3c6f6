use clap::Args;
use serde_json::Value;

use orizuru::configuration::InvocationOptions;

pub mod certificate;
pub mod deploy;
pub mod setting;
pub mod transport;

pub type CmdResult<T> = orizuru::Result<(T, i32)>;

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct GlobalArgs {
    /// Suppress progress lines and command output
    #[arg(long, global = true)]
    pub silent: bool,

    /// Echo command output and debug diagnostics
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Show informational diagnostics
    #[arg(long, global = true)]
    pub debug: bool,
}

impl GlobalArgs {
    pub fn invocation(&self) -> InvocationOptions {
        InvocationOptions {
            silent: self.silent,
            verbose: self.verbose,
            debug: self.debug,
        }
    }
}

/// Interpret a CLI value as JSON when it parses, otherwise as a string.
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub(crate) fn run_json(command: crate::Commands, global: &GlobalArgs) -> (orizuru::Result<Value>, i32) {
    use crate::output::map_cmd_result_to_json;

    match command {
        crate::Commands::Deploy(args) => map_cmd_result_to_json(deploy::run(args, global)),
        crate::Commands::Certificate(args) => map_cmd_result_to_json(certificate::run(args, global)),
        crate::Commands::Transport(args) => map_cmd_result_to_json(transport::run(args, global)),
        crate::Commands::Setting(args) => map_cmd_result_to_json(setting::run(args, global)),
    }
}
