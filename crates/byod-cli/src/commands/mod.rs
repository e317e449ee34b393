//! Command handlers, one module per dashboard page

mod jobs;
mod settings;
mod setup;
mod status;
mod submit;

use std::sync::Arc;

use anyhow::Result;
use byod_core::{ApiClient, DashboardConfig, StreamConsumer};

use crate::cli::Command;

/// Shared handles for every command
pub struct Context {
    pub config: DashboardConfig,
    pub client: ApiClient,
}

impl Context {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// Fresh consumer for one streamed operation
    pub fn consumer(&self) -> StreamConsumer {
        StreamConsumer::new(Arc::new(self.client.clone()))
    }
}

pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Status => status::show_status(ctx).await,
        Command::Aws => status::show_aws(ctx).await,
        Command::Plugins => status::list_plugins(ctx).await,
        Command::Jobs(cmd) => jobs::run(ctx, cmd).await,
        Command::Submit {
            plugin,
            description,
            config_json,
            files,
        } => submit::run(ctx, plugin, description, config_json, files).await,
        Command::Setup(cmd) => setup::run(ctx, cmd).await,
        Command::Profiles(cmd) => settings::profiles(ctx, cmd).await,
        Command::Config => settings::show_config(ctx).await,
    }
}
