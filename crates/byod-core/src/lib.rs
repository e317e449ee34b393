//! BYOD dashboard client core
//!
//! Talks to the local dashboard server: plain JSON routes for status, jobs,
//! plugins and settings, plus progress streams for submissions, result
//! retrieval and setup.
//!
//! - `api` - HTTP client and typed routes
//! - `stream` - event-stream parsing and the session consumer
//! - `resource` - fetch-on-mount holder for list/detail views
//! - `validation` - upload filename checks against plugin inputs
//! - `config` - `~/.byod/ui.toml` and env overrides

pub mod api;
pub mod config;
pub mod error;
pub mod resource;
pub mod stream;
pub mod validation;

pub use api::ApiClient;
pub use config::DashboardConfig;
pub use error::{ApiError, Result};
pub use resource::{Resource, ResourceState};
pub use stream::{ProgressEvent, StreamConsumer, StreamRequest, StreamState};
pub use validation::validate_files_for_plugin;
