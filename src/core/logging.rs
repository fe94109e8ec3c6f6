//! Diagnostic logging setup and user-facing status lines.
//!
//! Everything goes through `tracing` to stderr. Status lines use the
//! `orizuru::status` target and echoed command output uses `orizuru::output`;
//! both pass the default filter at `info`, while other diagnostics stay at
//! `warn`. Every spawned command runs in a `command` span carrying its
//! `namespace`, so a single channel can be turned up with e.g.
//! `ORIZURU_LOG="[command{namespace=deploy}]=debug"`.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::configuration::InvocationOptions;
use crate::error::Error;

pub const LOG_ENV: &str = "ORIZURU_LOG";
pub const STATUS_TARGET: &str = "orizuru::status";
pub const OUTPUT_TARGET: &str = "orizuru::output";

/// Default filter for the given invocation flags when `ORIZURU_LOG` is unset.
pub fn filter_directive(options: &InvocationOptions) -> &'static str {
    if options.silent {
        "off"
    } else if options.verbose {
        "debug"
    } else if options.debug {
        "info"
    } else {
        "warn,orizuru::status=info,orizuru::output=info"
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(options: &InvocationOptions) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(options)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// A progress line for the person running the CLI.
pub fn event(message: &str) {
    if message.is_empty() {
        return;
    }
    tracing::info!(target: STATUS_TARGET, "{}", message);
}

/// Report a terminal failure.
pub fn error(err: &Error) {
    tracing::error!(code = err.code.as_str(), "{}", err.message);
    if std::io::stderr().is_terminal() {
        eprintln!("{}", err.message);
        for hint in &err.hints {
            eprintln!("  hint: {}", hint.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_wins_over_verbose() {
        let options = InvocationOptions {
            silent: true,
            verbose: true,
            debug: true,
        };
        assert_eq!(filter_directive(&options), "off");
    }

    #[test]
    fn verbose_then_debug_then_default() {
        let mut options = InvocationOptions::default();
        assert!(filter_directive(&options).starts_with("warn,"));
        options.debug = true;
        assert_eq!(filter_directive(&options), "info");
        options.verbose = true;
        assert_eq!(filter_directive(&options), "debug");
    }

    #[test]
    fn default_filter_passes_status_and_output_at_info() {
        let directive = filter_directive(&InvocationOptions::default());
        assert!(directive.contains(&format!("{}=info", STATUS_TARGET)));
        assert!(directive.contains(&format!("{}=info", OUTPUT_TARGET)));
    }
}
