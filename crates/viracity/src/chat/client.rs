use anyhow::Context;
use reqwest::redirect::Policy;
use reqwest::Client;
use risk_report::Citation;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::config::{AuthScheme, ServiceConfig};
use crate::http_utils::{join_base_path, with_api_version};

use super::types::{ChatCompletion, ChatRequest};

const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const USER_AGENT: &str = "viracity";

pub(crate) struct ChatClient {
    service: ServiceConfig,
    api_key: String,
    http_client: Client,
}

impl ChatClient {
    pub(crate) fn new(service: ServiceConfig, api_key: String) -> anyhow::Result<Self> {
        let timeout_ms = service.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        let http_client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            service,
            api_key,
            http_client,
        })
    }

    pub(crate) fn model(&self) -> &str {
        &self.service.model
    }

    pub(crate) fn endpoint(&self) -> anyhow::Result<String> {
        let url = join_base_path(&self.service.base_url, &self.service.chat_path)?;
        Ok(with_api_version(url, self.service.api_version.as_deref()))
    }

    pub(crate) async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatCompletion> {
        let url = self.endpoint()?;
        let prompt_len: usize = request.messages.iter().map(|msg| msg.content.len()).sum();
        tracing::info!(
            url = %url,
            model = %request.model,
            prompt_len,
            data_sources = request.data_sources.len(),
            "chat completion request"
        );

        let builder = self.http_client.post(&url).json(request);
        let builder = match self.service.auth {
            AuthScheme::ApiKey => builder.header("api-key", &self.api_key),
            AuthScheme::Bearer => builder.bearer_auth(&self.api_key),
        };
        let started = Instant::now();
        let response = builder.send().await.map_err(|err| {
            tracing::warn!(
                is_timeout = err.is_timeout(),
                is_connect = err.is_connect(),
                error = %err,
                "chat completion request failed"
            );
            anyhow::anyhow!("chat completion request failed: {err}")
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read chat completion body")?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(status = %status, body_len = body.len(), elapsed_ms, "chat completion response");
        if !status.is_success() {
            anyhow::bail!("chat completion failed status={} body={}", status, body);
        }
        parse_completion(&body)
    }
}

fn parse_completion(body: &str) -> anyhow::Result<ChatCompletion> {
    let value: Value = serde_json::from_str(body).context("chat completion body is not json")?;
    let content = value
        .pointer("/choices/0/message/content")
        .and_then(|val| val.as_str())
        .or_else(|| value.pointer("/choices/0/text").and_then(|val| val.as_str()))
        .unwrap_or("")
        .trim();
    if content.is_empty() {
        anyhow::bail!("chat completion response missing content");
    }
    let citations = match value.pointer("/choices/0/message/context/citations") {
        Some(raw) if !raw.is_null() => serde_json::from_value::<Vec<Citation>>(raw.clone())
            .context("chat completion citations are malformed")?,
        _ => Vec::new(),
    };
    tracing::debug!(citations = citations.len(), "chat completion parsed");
    Ok(ChatCompletion {
        content: content.to_string(),
        citations,
    })
}
