/// Prefixed status line on stderr, printed only when stderr is a terminal.
///
/// Usage:
/// ```ignore
/// log_status!("deploy", "Pushing {} to {}", branch, app);
/// log_status!("transport", "Wrote {} classes", count);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::io::IsTerminal::is_terminal(&::std::io::stderr()) {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

pub mod core;
pub mod utils;

// `orizuru::pipeline` rather than `orizuru::core::pipeline`
pub use core::*;
pub use utils::*;
