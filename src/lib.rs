//! NAUTIL Admin - daily verification workbook maintenance
//!
//! Runs a fixed sequence of edits on the NAUTIL verification workbook and
//! its template, then emails the result.
//!
//! # Pipeline
//!
//! 1. Rename the verification file with today's date
//! 2. Append a date row to the global view sheet
//! 3. Blank B4:G on TX1, TX2 and TX3
//! 4. Empty every sheet after TX3
//! 5. Blank A4:F on the template's first sheet
//!
//! # Example
//!
//! ```no_run
//! use chrono::Local;
//! use nautil_admin::config::AdminConfig;
//! use nautil_admin::pipeline;
//! use std::path::Path;
//!
//! let mut config = AdminConfig::load(Path::new("nautil.yaml"))?;
//! let result = pipeline::run_all(&mut config, Local::now().date_naive());
//!
//! for line in &result.logs {
//!     println!("{}", line);
//! }
//! # Ok::<(), nautil_admin::error::AdminError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod mail;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use config::AdminConfig;
pub use error::{AdminError, AdminResult};
pub use types::TaskResult;
