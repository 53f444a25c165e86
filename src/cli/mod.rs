//! CLI command handlers

pub mod commands;

pub use commands::{print_result, run_all, run_complete, send_email, show_config, step};
