//! CLI command handlers

pub mod commands;

pub use commands::{export, patterns, recognize, validate, ExportFormat};
