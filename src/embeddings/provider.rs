//! HTTP embedding provider.
//!
//! Speaks the OpenAI-compatible `/embeddings` API:
//! `POST {base_url}/embeddings` with `{"model": ..., "input": [...]}` and a
//! bearer token, answered by `{"data": [{"index": n, "embedding": [...]}]}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, TrendError};

/// Longest provider error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for a remote embedding endpoint.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpEmbeddingProvider {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(TrendError::Config(
                "embedding base_url is empty; set [embedding].base_url".to_string(),
            ));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{base_url}/embeddings"),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build a provider from config. `Ok(None)` when no API key is set,
    /// which callers treat as "embeddings unavailable".
    pub fn from_config(config: &EmbeddingConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
        else {
            return Ok(None);
        };
        Self::new(
            &config.base_url,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_many(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(endpoint = %self.endpoint, inputs = inputs.len(), model = %self.model, "requesting embeddings");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(TrendError::Provider(format!(
                "embedding request failed with status {status}: {body}"
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        parsed.data.sort_by_key(|datum| datum.index);
        Ok(parsed.data.into_iter().map(|datum| datum.embedding).collect())
    }
}
