//! Dashboard API client
//!
//! - `client` - request helper, error body unwrapping
//! - `endpoints` - typed routes and streamed-operation builders
//! - `types` - request/response shapes

mod client;
mod endpoints;
pub mod types;

pub use client::{error_detail, ApiClient};
pub use endpoints::{get_results_request, setup_run_request, submit_request};
pub use types::*;
