use std::path::PathBuf;

use anyhow::{anyhow, bail, Context as _, Result};
use byod_core::api::{submit_request, SubmitRequest, UploadFile};
use byod_core::validate_files_for_plugin;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::Context;
use crate::output::{format_bytes, result_lines};
use crate::progress;

pub async fn run(
    ctx: &Context,
    plugin: String,
    description: String,
    config_json: Option<String>,
    paths: Vec<PathBuf>,
) -> Result<()> {
    let config = parse_plugin_config(config_json.as_deref())?;

    let plugins = ctx
        .client
        .list_plugins()
        .await
        .context("Failed to list plugins")?;
    let selected = plugins
        .iter()
        .find(|p| p.name == plugin)
        .ok_or_else(|| anyhow!("Unknown plugin '{}'", plugin))?;

    let names = paths
        .iter()
        .map(|path| upload_name(path))
        .collect::<Result<Vec<_>>>()?;
    let rejected = validate_files_for_plugin(&names, &selected.inputs);
    if !rejected.is_empty() {
        bail!(rejected.join("\n"));
    }

    let mut files = Vec::with_capacity(paths.len());
    let mut total = 0u64;
    for (path, name) in paths.iter().zip(names) {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        debug!("Read {} ({} bytes)", path.display(), content.len());
        total += content.len() as u64;
        files.push(UploadFile {
            name,
            content: content.into(),
        });
    }
    eprintln!(
        "Submitting {} file(s), {} to {}",
        files.len(),
        format_bytes(total),
        plugin
    );

    let request = submit_request(&SubmitRequest {
        plugin,
        description,
        config,
        files,
    });
    let consumer = ctx.consumer();
    let result = progress::follow(&consumer, request, ctx.config.stream_idle_timeout())
        .await
        .context("Submission failed")?;

    if let Some(job_id) = result.get("job_id").and_then(Value::as_str) {
        info!("Submitted job {}", job_id);
    }
    for line in result_lines(&result) {
        println!("{}", line);
    }
    Ok(())
}

/// `--config-json` must be an object; absent means `{}`
fn parse_plugin_config(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw).context("Invalid --config-json")? {
        Value::Object(map) => Ok(map),
        other => bail!("--config-json must be a JSON object, got {}", other),
    }
}

fn upload_name(path: &std::path::Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file path", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_plugin_config() {
        assert!(parse_plugin_config(None).unwrap().is_empty());
        assert!(parse_plugin_config(Some("  ")).unwrap().is_empty());
        let map = parse_plugin_config(Some(r#"{"threads": 4}"#)).unwrap();
        assert_eq!(map["threads"], 4);
        assert!(parse_plugin_config(Some("[1, 2]")).is_err());
        assert!(parse_plugin_config(Some("{nope")).is_err());
    }

    #[test]
    fn test_upload_name_uses_basename() {
        assert_eq!(upload_name(Path::new("/data/run1/reads.fastq.gz")).unwrap(), "reads.fastq.gz");
        assert!(upload_name(Path::new("/")).is_err());
    }
}
