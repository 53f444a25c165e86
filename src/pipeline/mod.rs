//! Workbook maintenance pipeline
//!
//! rename → append date row → clear TX sheets → clear sheets after TX3 →
//! clear template. Steps 2 and 3 abort the run on failure; the others log a
//! warning and let it continue.

mod orchestrator;
pub mod steps;

pub use orchestrator::{run_all, run_complete, run_step, FailurePolicy, Step, PIPELINE};
pub use steps::{
    add_date_row, clear_sheets_after_tx3, clear_template, clear_tx_sheets,
    rename_verification_file,
};
