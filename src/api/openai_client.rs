//! Implements the `ChatModel` trait with `reqwest` against an OpenAI-compatible endpoint.

use crate::api::{ChatModel, ChatRequest, ChatResponse};
use crate::error::Res;
use anyhow::Context;
use std::time::Duration;
use tracing::trace;
use url::Url;

pub(super) struct OpenAiModel {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl OpenAiModel {
    pub(super) fn new(endpoint: Url, api_key: String, timeout: Option<Duration>) -> Res<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl ChatModel for OpenAiModel {
    async fn complete(&mut self, request: &ChatRequest) -> Res<Option<ChatResponse>> {
        trace!("POST {} with model {}", self.endpoint, request.model);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        // The reqwest error stays the root cause so that the status can be recovered by callers.
        let status_error = response.error_for_status_ref().err();
        if let Some(e) = status_error {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(anyhow::Error::new(e).context(format!(
                "Chat completion request failed with response body: {body}"
            )));
        }

        let body = response.text().await?;
        parse_body(&body)
    }
}

/// An empty or `null` body means the endpoint returned nothing.
fn parse_body(body: &str) -> Res<Option<ChatResponse>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let response = serde_json::from_str(trimmed)
        .context("Unable to parse the chat completion response body")?;
    Ok(Some(response))
}
