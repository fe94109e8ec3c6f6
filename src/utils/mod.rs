//! Generic utility primitives with zero domain knowledge.
//!
//! - `io` - File I/O with consistent error handling
//! - `template` - `{{key}}` placeholder rendering

pub mod io;
pub mod template;
