//! CLI command handlers

pub mod commands;

pub use commands::{config, convert, sheets, template, ConvertArgs};
