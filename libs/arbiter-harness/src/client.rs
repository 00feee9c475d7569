/// Submission Client - Judge0-compatible sandbox over HTTPS
///
/// **Responsibility:**
/// Encode a program, hand it to the sandbox, and fetch its status record.
/// Knows nothing about test cases or scoring.
///
/// **Failure Modes:**
/// - Missing credential: rejected before any network call
/// - Non-success HTTP status: wrapped with status and body
use arbiter_common::config::{HarnessConfig, ResourceLimits};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{HarnessError, Result};

const RECORD_FIELDS: &str = "token,stdout,stderr,compile_output,message,status,time,memory";

/// Backend status ids
pub mod status_id {
    pub const IN_QUEUE: u32 = 1;
    pub const PROCESSING: u32 = 2;
    pub const ACCEPTED: u32 = 3;
    pub const WRONG_ANSWER: u32 = 4;
    pub const TIME_LIMIT_EXCEEDED: u32 = 5;
    pub const COMPILATION_ERROR: u32 = 6;
    pub const INTERNAL_ERROR: u32 = 13;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub id: u32,
    pub description: String,
}

impl BackendStatus {
    pub fn new(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }

    /// Queued or processing; polling should continue
    pub fn is_pending(&self) -> bool {
        matches!(self.id, status_id::IN_QUEUE | status_id::PROCESSING)
    }

    pub fn is_accepted(&self) -> bool {
        self.id == status_id::ACCEPTED
    }

    pub fn is_compilation_error(&self) -> bool {
        self.id == status_id::COMPILATION_ERROR
    }
}

/// Status record of one submission; streams are base64 encoded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: BackendStatus,
    /// Seconds, as text
    #[serde(default)]
    pub time: Option<String>,
    /// Kilobytes
    #[serde(default)]
    pub memory: Option<u64>,
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self::new(status_id::IN_QUEUE, "In Queue")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendLanguage {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Serialize)]
struct SubmissionPayload {
    source_code: String,
    language_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
    cpu_time_limit: f64,
    wall_time_limit: f64,
    memory_limit: u64,
}

#[derive(Debug, Deserialize)]
struct SubmissionToken {
    token: String,
}

/// The sandbox as seen by the orchestrator; swapped for a scripted fake in tests
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Fail fast when the backend cannot be used at all (e.g. no credential)
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn submit(&self, source_code: &str, language_id: u32, stdin: Option<&str>) -> Result<String>;

    async fn fetch(&self, token: &str) -> Result<SubmissionRecord>;

    async fn languages(&self) -> Result<Vec<BackendLanguage>>;
}

pub struct Judge0Client {
    base_url: String,
    api_key: Option<String>,
    api_host: Option<String>,
    limits: ResourceLimits,
    http: reqwest::Client,
    timeout: Duration,
}

impl Judge0Client {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HarnessError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_host: config.api_host.clone(),
            limits: config.limits,
            http,
            timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| HarnessError::Configuration("JUDGE0_API_KEY is not set".to_string()))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let mut builder = builder
            .header("X-RapidAPI-Key", self.api_key()?)
            .timeout(self.timeout);
        if let Some(host) = &self.api_host {
            builder = builder.header("X-RapidAPI-Host", host);
        }
        Ok(builder)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarnessError::BackendRequest {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ExecutionBackend for Judge0Client {
    fn ensure_ready(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    #[instrument(skip(self, source_code, stdin), fields(source_size = source_code.len()))]
    async fn submit(&self, source_code: &str, language_id: u32, stdin: Option<&str>) -> Result<String> {
        let payload = SubmissionPayload {
            source_code: general_purpose::STANDARD.encode(source_code),
            language_id,
            stdin: stdin.map(|s| general_purpose::STANDARD.encode(s)),
            cpu_time_limit: self.limits.cpu_time_limit,
            wall_time_limit: self.limits.wall_time_limit,
            memory_limit: self.limits.memory_limit_kb,
        };

        let request = self.authorized(
            self.http
                .post(format!("{}/submissions", self.base_url))
                .query(&[("base64_encoded", "true"), ("wait", "false")])
                .json(&payload),
        )?;

        let token: SubmissionToken = self.send(request).await?.json().await?;
        debug!(token = %token.token, "Submission accepted");
        Ok(token.token)
    }

    async fn fetch(&self, token: &str) -> Result<SubmissionRecord> {
        let request = self.authorized(
            self.http
                .get(format!("{}/submissions/{}", self.base_url, token))
                .query(&[("base64_encoded", "true"), ("fields", RECORD_FIELDS)]),
        )?;
        Ok(self.send(request).await?.json().await?)
    }

    async fn languages(&self) -> Result<Vec<BackendLanguage>> {
        let request = self.authorized(self.http.get(format!("{}/languages", self.base_url)))?;
        Ok(self.send(request).await?.json().await?)
    }
}
