pub mod configuration;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod prompt;
pub mod settings;
pub mod transport;

pub use error::{Error, ErrorCode, Result};
