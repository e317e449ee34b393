use anyhow::{Context as _, Result};
use byod_core::api::{setup_run_request, SetupRequest, SetupStatus};

use super::Context;
use crate::cli::SetupCommand;
use crate::output::{or_dash, result_lines, yes_no};
use crate::progress;

pub async fn run(ctx: &Context, command: SetupCommand) -> Result<()> {
    match command {
        SetupCommand::Status => {
            let status = ctx
                .client
                .setup_status()
                .await
                .context("Failed to fetch setup status")?;
            for line in status_lines(&status) {
                println!("{}", line);
            }
            Ok(())
        }
        SetupCommand::Run { region, force_new } => {
            let request = setup_run_request(&SetupRequest { region, force_new });
            let consumer = ctx.consumer();
            let result = progress::follow(&consumer, request, ctx.config.stream_idle_timeout())
                .await
                .context("Setup failed")?;
            println!("Setup complete");
            for line in result_lines(&result) {
                println!("  {}", line);
            }
            Ok(())
        }
    }
}

fn status_lines(status: &SetupStatus) -> Vec<String> {
    let mut lines = vec![
        format!("Authenticated:   {}", yes_no(status.authenticated)),
        format!(
            "AWS credentials: {} ({})",
            yes_no(status.aws_configured),
            or_dash(status.aws_account_id.as_deref())
        ),
        format!(
            "Tenant:          {} ({})",
            yes_no(status.tenant_valid),
            or_dash(status.tenant_id.as_deref())
        ),
        format!(
            "KMS key:         {} ({})",
            yes_no(status.kms_key_configured),
            or_dash(status.kms_key_arn.as_deref())
        ),
        format!(
            "Role:            {} ({})",
            yes_no(status.role_configured),
            or_dash(status.role_arn.as_deref())
        ),
        format!("Registered:      {}", yes_no(status.registered)),
    ];
    let errors = [
        ("tenant", &status.tenant_error),
        ("KMS key", &status.kms_key_error),
        ("role", &status.role_error),
    ];
    for (what, err) in errors {
        if let Some(err) = err {
            lines.push(format!("  {} error: {}", what, err));
        }
    }
    lines
}
