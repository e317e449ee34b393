//! Typed dashboard routes
//!
//! Plain JSON passthroughs plus builders for the three streamed operations.

use bytes::Bytes;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use super::client::ApiClient;
use super::types::{
    ActiveProfile, AwsStatus, ConfigInfo, Job, JobFilter, Plugin, Profile, ResultListing,
    SetupRequest, SetupStatus, StatusInfo, SubmitRequest,
};
use crate::error::Result;
use crate::stream::{FormPart, StreamRequest};

/// Percent-encode one path segment (ids, profile names)
fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl ApiClient {
    pub async fn status(&self) -> Result<StatusInfo> {
        self.get_json("/api/status").await
    }

    pub async fn aws_status(&self) -> Result<AwsStatus> {
        self.get_json("/api/status/aws").await
    }

    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        self.request_json::<_, Value>(Method::GET, "/api/jobs", &filter.query(), None)
            .await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        self.get_json(&format!("/api/jobs/{}", segment(job_id)))
            .await
    }

    pub async fn list_plugins(&self) -> Result<Vec<Plugin>> {
        self.get_json("/api/plugins").await
    }

    /// Decrypted result files for a job (after a results retrieval ran)
    pub async fn list_results(&self, job_id: &str) -> Result<ResultListing> {
        self.get_json(&format!("/api/jobs/{}/results", segment(job_id)))
            .await
    }

    /// Raw content of one result file
    pub async fn fetch_result_file(&self, job_id: &str, path: &str, download: bool) -> Result<Bytes> {
        debug!("Fetching result file {} for job {}", path, job_id);
        let query = [("path", path.to_string()), ("download", download.to_string())];
        self.get_bytes(&format!("/api/jobs/{}/results/file", segment(job_id)), &query)
            .await
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.get_json("/api/settings/profiles").await
    }

    pub async fn activate_profile(&self, name: &str) -> Result<ActiveProfile> {
        self.post_json(
            &format!("/api/settings/profiles/{}/activate", segment(name)),
            &json!({}),
        )
        .await
    }

    pub async fn config_info(&self) -> Result<ConfigInfo> {
        self.get_json("/api/settings/config").await
    }

    pub async fn setup_status(&self) -> Result<SetupStatus> {
        self.get_json("/api/setup/status").await
    }
}

/// POST /api/submit as multipart: one `files` part per upload
pub fn submit_request(submit: &SubmitRequest) -> StreamRequest {
    let mut parts: Vec<FormPart> = submit
        .files
        .iter()
        .map(|file| FormPart::file("files", file.name.clone(), file.content.clone()))
        .collect();
    parts.push(FormPart::text("plugin", submit.plugin.clone()));
    parts.push(FormPart::text("description", submit.description.clone()));
    parts.push(FormPart::text(
        "config",
        Value::Object(submit.config.clone()).to_string(),
    ));
    StreamRequest::post("/api/submit").multipart(parts)
}

/// POST /api/jobs/{id}/get: download and decrypt results
pub fn get_results_request(job_id: &str) -> StreamRequest {
    StreamRequest::post(format!("/api/jobs/{}/get", segment(job_id)))
}

/// POST /api/setup/run
pub fn setup_run_request(setup: &SetupRequest) -> StreamRequest {
    StreamRequest::post("/api/setup/run").json(json!({
        "region": setup.region,
        "force_new": setup.force_new,
    }))
}
