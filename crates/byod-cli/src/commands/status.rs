use anyhow::{Context as _, Result};
use byod_core::api::Plugin;

use super::Context;
use crate::output::{or_dash, yes_no};

pub async fn show_status(ctx: &Context) -> Result<()> {
    let status = ctx
        .client
        .status()
        .await
        .context("Failed to fetch platform status")?;

    println!("Authenticated:  {}", yes_no(status.authenticated));
    println!("Profile:        {}", or_dash(status.profile.as_deref()));
    println!("API URL:        {}", or_dash(status.api_url.as_deref()));
    println!("API reachable:  {}", yes_no(status.api_reachable));
    if let Some(version) = &status.version {
        println!("API version:    {}", version);
    }
    println!("Tenant:         {}", or_dash(status.tenant_id.as_deref()));
    if let Some(err) = &status.tenant_error {
        println!("  tenant error: {}", err);
    }
    println!("KMS key:        {}", yes_no(status.kms_key_configured));
    if let Some(err) = &status.kms_key_error {
        println!("  KMS error:    {}", err);
    }
    println!("Role:           {}", yes_no(status.role_configured));
    if let Some(err) = &status.role_error {
        println!("  role error:   {}", err);
    }
    if !status.authenticated {
        println!();
        println!("Not authenticated. Run 'byod auth login' first.");
    }
    Ok(())
}

pub async fn show_aws(ctx: &Context) -> Result<()> {
    let aws = ctx
        .client
        .aws_status()
        .await
        .context("Failed to fetch AWS status")?;

    println!("Configured: {}", yes_no(aws.configured));
    println!("Account:    {}", or_dash(aws.account.as_deref()));
    println!("ARN:        {}", or_dash(aws.arn.as_deref()));
    if let Some(err) = &aws.error {
        println!("Error:      {}", err);
    }
    Ok(())
}

pub async fn list_plugins(ctx: &Context) -> Result<()> {
    let plugins = ctx
        .client
        .list_plugins()
        .await
        .context("Failed to list plugins")?;

    if plugins.is_empty() {
        println!("No plugins available");
        return Ok(());
    }
    for plugin in &plugins {
        println!("{}", plugin_summary(plugin));
        for input in &plugin.inputs {
            let accepts = if !input.formats.is_empty() {
                input
                    .formats
                    .iter()
                    .map(|f| format!(".{}", f))
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                input.pattern.clone().unwrap_or_default()
            };
            println!(
                "    {} ({}) {}",
                or_dash(input.name.as_deref()),
                or_dash(input.kind.as_deref()),
                accepts
            );
        }
    }
    Ok(())
}

fn plugin_summary(plugin: &Plugin) -> String {
    let mut line = plugin.name.clone();
    if let Some(version) = &plugin.version {
        line.push_str(&format!(" v{}", version));
    }
    if let Some(description) = plugin.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!("  {}", description));
    }
    line
}
