use anyhow::{Context as _, Result};

use super::Context;
use crate::cli::ProfilesCommand;
use crate::output::{or_dash, yes_no};

pub async fn profiles(ctx: &Context, command: ProfilesCommand) -> Result<()> {
    match command {
        ProfilesCommand::List => {
            let profiles = ctx
                .client
                .list_profiles()
                .await
                .context("Failed to list profiles")?;
            if profiles.is_empty() {
                println!("No profiles configured");
            }
            for profile in &profiles {
                let marker = if profile.active { "*" } else { " " };
                println!(
                    "{} {:<20} {:<40} key: {}",
                    marker,
                    profile.name,
                    or_dash(profile.api_url.as_deref()),
                    yes_no(profile.has_api_key)
                );
            }
            Ok(())
        }
        ProfilesCommand::Activate { name } => {
            let active = ctx
                .client
                .activate_profile(&name)
                .await
                .with_context(|| format!("Failed to activate profile '{}'", name))?;
            println!("Active profile: {}", active.active);
            Ok(())
        }
    }
}

/// Server-side CLI config plus where this front end is pointed
pub async fn show_config(ctx: &Context) -> Result<()> {
    let info = ctx
        .client
        .config_info()
        .await
        .context("Failed to fetch config")?;

    println!("Dashboard:      {}", ctx.client.base_url());
    println!("Config file:    {}", or_dash(info.config_path.as_deref()));
    println!("Active profile: {}", or_dash(info.active_profile.as_deref()));
    println!("API URL:        {}", or_dash(info.api_url.as_deref()));
    println!("API key set:    {}", yes_no(info.api_key_set));
    Ok(())
}
