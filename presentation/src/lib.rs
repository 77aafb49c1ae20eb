//! Presentation layer for gavel
//!
//! This crate contains the CLI definition and the console and JSON
//! formatting of meeting reports.

pub mod cli;
pub mod config;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use config::OutputConfig;
pub use output::console::ConsoleFormatter;
pub use output::formatter::ReportFormatter;
