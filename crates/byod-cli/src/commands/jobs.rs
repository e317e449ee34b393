use std::path::Path;

use anyhow::{bail, Context as _, Result};
use byod_core::api::{get_results_request, Job, JobFilter, ResultListing};
use byod_core::Resource;
use tracing::info;

use super::Context;
use crate::cli::JobsCommand;
use crate::output::{format_bytes, or_dash, result_lines};
use crate::progress;

pub async fn run(ctx: &Context, command: JobsCommand) -> Result<()> {
    match command {
        JobsCommand::List {
            limit,
            status,
            plugin,
        } => list(ctx, JobFilter { limit, status, plugin }).await,
        JobsCommand::Show { job_id } => show(ctx, &job_id).await,
        JobsCommand::Get { job_id } => get_results(ctx, &job_id).await,
        JobsCommand::Results { job_id } => results(ctx, &job_id).await,
        JobsCommand::File {
            job_id,
            path,
            output,
        } => file(ctx, &job_id, &path, output.as_deref()).await,
    }
}

async fn list(ctx: &Context, filter: JobFilter) -> Result<()> {
    let jobs = ctx
        .client
        .list_jobs(&filter)
        .await
        .context("Failed to list jobs")?;

    if jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }
    println!("{:<38} {:<12} {:<20} {}", "JOB", "STATUS", "PLUGIN", "CREATED");
    for job in &jobs {
        println!("{}", job_row(job));
    }
    Ok(())
}

fn job_row(job: &Job) -> String {
    format!(
        "{:<38} {:<12} {:<20} {}",
        job.job_id,
        job.status,
        or_dash(job.plugin_name.as_deref()),
        or_dash(job.created_at.as_deref())
    )
}

fn print_job(job: &Job) {
    println!("Job:         {}", job.job_id);
    println!("Status:      {}", job.status);
    println!("Plugin:      {}", or_dash(job.plugin_name.as_deref()));
    println!("Description: {}", or_dash(job.description.as_deref()));
    println!("Created:     {}", or_dash(job.created_at.as_deref()));
    println!("Updated:     {}", or_dash(job.updated_at.as_deref()));
    if let Some(err) = &job.error_message {
        println!("Error:       {}", err);
    }
}

async fn show(ctx: &Context, job_id: &str) -> Result<()> {
    let job = ctx
        .client
        .get_job(job_id)
        .await
        .with_context(|| format!("Failed to fetch job {}", job_id))?;
    print_job(&job);
    Ok(())
}

/// Stream result retrieval, then reload the job and its file listing
async fn get_results(ctx: &Context, job_id: &str) -> Result<()> {
    let client = ctx.client.clone();
    let id = job_id.to_string();
    let job = Resource::mount(move || {
        let client = client.clone();
        let id = id.clone();
        async move { client.get_job(&id).await }
    })
    .await;

    let state = job.state();
    if let Some(err) = state.error {
        bail!("Failed to fetch job {}: {}", job_id, err);
    }
    if let Some(job) = state.data.as_ref().filter(|j| !j.is_completed()) {
        bail!(
            "Job {} is '{}'; results are only available once it has completed",
            job_id,
            job.status
        );
    }

    let consumer = ctx.consumer();
    let result = progress::follow(
        &consumer,
        get_results_request(job_id),
        ctx.config.stream_idle_timeout(),
    )
    .await
    .with_context(|| format!("Retrieving results for {} failed", job_id))?;

    info!("Results retrieved for job {}", job_id);
    for line in result_lines(&result) {
        println!("{}", line);
    }

    let refreshed = job.refetch().await;
    if let Some(job) = refreshed.data {
        println!("Status: {}", job.status);
    }
    results(ctx, job_id).await
}

async fn results(ctx: &Context, job_id: &str) -> Result<()> {
    let listing = ctx
        .client
        .list_results(job_id)
        .await
        .with_context(|| format!("Failed to list results for {}", job_id))?;
    for line in listing_lines(&listing) {
        println!("{}", line);
    }
    Ok(())
}

fn listing_lines(listing: &ResultListing) -> Vec<String> {
    let mut lines = vec![format!("Output directory: {}", listing.output_dir)];
    if listing.files.is_empty() {
        lines.push("  (no files)".to_string());
    }
    for file in &listing.files {
        lines.push(format!(
            "  {:<48} {:>10}  {}",
            file.path,
            format_bytes(file.size),
            file.mime
        ));
    }
    lines
}

async fn file(ctx: &Context, job_id: &str, path: &str, output: Option<&Path>) -> Result<()> {
    let download = output.is_some();
    let bytes = ctx
        .client
        .fetch_result_file(job_id, path, download)
        .await
        .with_context(|| format!("Failed to fetch {} for job {}", path, job_id))?;

    match output {
        Some(target) => {
            tokio::fs::write(target, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;
            eprintln!(
                "Saved {} ({}) to {}",
                path,
                format_bytes(bytes.len() as u64),
                target.display()
            );
        }
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&bytes).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
