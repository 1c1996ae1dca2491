//! Command-line interface for watchwarm.

mod commands;

pub use commands::{is_verbose, run};
