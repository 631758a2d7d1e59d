// File: convosync-core/src/platforms/voiceflow/client.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::Error;
use super::{TranscriptSource, TranscriptSummary};

const DEFAULT_BASE_URL: &str = "https://api.voiceflow.com";

/// Encapsulates the Voiceflow transcript REST calls.
pub struct VoiceflowClient {
    http_client: Client,
    api_key: String,
    project_id: String,
    base_url: String,
    environment: Option<String>,
}

impl VoiceflowClient {
    /// Missing credentials are fatal for a whole pass, so they are rejected
    /// here rather than surfacing per-request.
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        let project_id = project_id.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("missing Voiceflow API key".to_string()));
        }
        if project_id.trim().is_empty() {
            return Err(Error::Config("missing Voiceflow project id".to_string()));
        }
        Ok(Self {
            http_client: Client::new(),
            api_key,
            project_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            environment: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Restrict listings to one environment tag (e.g. "production").
    pub fn with_environment(mut self, environment: Option<String>) -> Self {
        self.environment = environment;
        self
    }
}

#[async_trait]
impl TranscriptSource for VoiceflowClient {
    async fn list_transcripts(
        &self,
        offset: u32,
        limit: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TranscriptSummary>, Error> {
        let url = format!("{}/v2/transcripts/{}", self.base_url, self.project_id);
        let mut query: Vec<(&str, String)> = vec![
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            query.push(("startDate", since.to_rfc3339()));
        }
        if let Some(tag) = &self.environment {
            query.push(("tag", tag.clone()));
        }

        debug!("Listing transcripts offset={} limit={}", offset, limit);
        let resp = self
            .http_client
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Transcript listing returned HTTP {}", status);
            return Err(Error::Platform(format!(
                "transcript listing failed: HTTP {} => {}",
                status,
                snippet(&body)
            )));
        }

        // Some API versions wrap the page in an object.
        let body: Value = resp.json().await?;
        let items = match &body {
            Value::Array(_) => body.clone(),
            Value::Object(obj) => obj
                .get("items")
                .or_else(|| obj.get("transcripts"))
                .cloned()
                .unwrap_or(Value::Array(vec![])),
            _ => Value::Array(vec![]),
        };
        let summaries: Vec<TranscriptSummary> = serde_json::from_value(items)?;
        Ok(summaries)
    }

    async fn fetch_transcript(&self, transcript_id: &str) -> Result<Value, Error> {
        let url = format!(
            "{}/v2/transcripts/{}/{}",
            self.base_url, self.project_id, transcript_id
        );

        debug!("Fetching transcript body id={}", transcript_id);
        let resp = self
            .http_client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Platform(format!(
                "transcript fetch failed for '{}': HTTP {} => {}",
                transcript_id,
                status,
                snippet(&body)
            )));
        }

        let body: Value = resp.json().await?;
        Ok(body)
    }
}

fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}
