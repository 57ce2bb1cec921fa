//! Emocheck command-line front end
//!
//! Argument parsing, configuration discovery and result rendering for the
//! `emocheck` binary.

pub mod cli;
pub mod output;
pub mod settings;

pub use cli::{Cli, OutputFormat};
