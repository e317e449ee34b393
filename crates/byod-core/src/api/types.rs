//! Response and request shapes for the dashboard routes

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// GET /api/status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusInfo {
    pub authenticated: bool,
    pub profile: Option<String>,
    pub api_url: Option<String>,
    pub api_reachable: bool,
    pub version: Option<String>,
    pub tenant_valid: bool,
    pub tenant_id: Option<String>,
    pub tenant_error: Option<String>,
    pub kms_key_configured: bool,
    pub role_configured: bool,
    pub kms_key_error: Option<String>,
    pub role_error: Option<String>,
}

/// GET /api/status/aws
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AwsStatus {
    pub configured: bool,
    pub account: Option<String>,
    pub arn: Option<String>,
    pub error: Option<String>,
}

/// A job as returned by the platform; unknown fields land in `extra`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub job_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub plugin_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// Query filters for GET /api/jobs
#[derive(Debug, Clone, PartialEq)]
pub struct JobFilter {
    pub limit: u32,
    pub status: Option<String>,
    pub plugin: Option<String>,
}

impl JobFilter {
    pub const MIN_LIMIT: u32 = 1;
    pub const MAX_LIMIT: u32 = 200;

    /// Query pairs, with limit clamped to the server's accepted range
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let limit = self.limit.clamp(Self::MIN_LIMIT, Self::MAX_LIMIT);
        let mut query = vec![("limit", limit.to_string())];
        if let Some(status) = self.status.as_ref().filter(|s| !s.is_empty()) {
            query.push(("status", status.clone()));
        }
        if let Some(plugin) = self.plugin.as_ref().filter(|p| !p.is_empty()) {
            query.push(("plugin", plugin.clone()));
        }
        query
    }
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            limit: 50,
            status: None,
            plugin: None,
        }
    }
}

/// One declared plugin input
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PluginInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub formats: Vec<String>,
    pub pattern: Option<String>,
    pub description: Option<String>,
}

impl PluginInput {
    pub fn is_file(&self) -> bool {
        self.kind.as_deref() == Some("file")
    }
}

/// GET /api/plugins entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plugin {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inputs: Vec<PluginInput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One decrypted result file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultFile {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub mime: String,
}

/// GET /api/jobs/{id}/results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultListing {
    pub files: Vec<ResultFile>,
    pub output_dir: String,
}

/// GET /api/settings/profiles entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub has_api_key: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: Map<String, Value>,
}

/// POST /api/settings/profiles/{name}/activate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveProfile {
    pub active: String,
}

/// GET /api/settings/config
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigInfo {
    pub config_path: Option<String>,
    pub active_profile: Option<String>,
    pub api_url: Option<String>,
    pub api_key_set: bool,
}

/// GET /api/setup/status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SetupStatus {
    pub authenticated: bool,
    pub aws_configured: bool,
    pub aws_account_id: Option<String>,
    pub tenant_valid: bool,
    pub tenant_id: Option<String>,
    pub tenant_error: Option<String>,
    pub kms_key_configured: bool,
    pub kms_key_arn: Option<String>,
    pub kms_key_error: Option<String>,
    pub role_configured: bool,
    pub role_arn: Option<String>,
    pub role_error: Option<String>,
    pub registered: bool,
}

/// Body of POST /api/setup/run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetupRequest {
    pub region: String,
    pub force_new: bool,
}

impl Default for SetupRequest {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            force_new: false,
        }
    }
}

/// A file to upload with a submission
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content: bytes::Bytes,
}

/// Form fields of POST /api/submit
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub plugin: String,
    pub description: String,
    /// Plugin config, sent as a JSON string form field
    pub config: Map<String, Value>,
    pub files: Vec<UploadFile>,
}
