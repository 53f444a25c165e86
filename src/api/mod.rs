//! NAUTIL Admin HTTP control surface
//!
//! Run with `nautil-admin serve`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
