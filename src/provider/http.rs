use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::gateway::{arena_err, LLMProvider, ProviderReply};
use super::kind::ProviderKind;
use crate::config::ProvidersConfig;
use crate::context::{ChatRole, ContextArena};
use crate::error::{ProviderError, Result, SolverError};

/// Chat-completion client for one (kind, model) pair.
///
/// All supported backends expose the same `POST {base}/chat/completions`
/// surface with bearer auth, so a single implementation covers them.
pub struct HttpChatProvider {
    kind: ProviderKind,
    model: String,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
    contexts: ContextArena,
}

impl HttpChatProvider {
    /// Fails with a configuration error when no API key is available; a
    /// provider is never constructed half-usable.
    pub fn new(kind: ProviderKind, model: &str, config: &ProvidersConfig) -> Result<Self> {
        let api_key = config
            .api_keys
            .get(kind.as_str())
            .cloned()
            .or_else(|| std::env::var(kind.env_key()).ok())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                SolverError::Config(format!(
                    "Missing API key for provider '{}' (set {} or providers.api_keys.{})",
                    kind,
                    kind.env_key(),
                    kind
                ))
            })?;

        let base_url = config
            .base_urls
            .get(kind.as_str())
            .cloned()
            .unwrap_or_else(|| kind.default_base_url().to_string());

        Ok(Self {
            kind,
            model: model.to_string(),
            api_key,
            base_url,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: reqwest::Client::new(),
            contexts: ContextArena::new(kind.as_str(), model),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LLMProvider for HttpChatProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn contexts(&self) -> &ContextArena {
        &self.contexts
    }

    async fn call(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> std::result::Result<ProviderReply, ProviderError> {
        self.contexts
            .append(session_id, ChatRole::User, user_message)
            .map_err(arena_err)?;

        let messages = self
            .contexts
            .render_for_call(session_id)
            .map_err(arena_err)?;

        debug!(
            session_id,
            model = %self.model,
            message_count = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.request_timeout)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let reply = shape_reply(&payload)?;

        self.contexts
            .append(session_id, ChatRole::Assistant, &reply.persisted_text)
            .map_err(arena_err)?;

        Ok(reply)
    }
}

/// Extract the completion from a chat response body. Reasoning-capable
/// models return a `reasoning_content` field next to `content`; only
/// `content` may re-enter the conversation history.
fn shape_reply(payload: &serde_json::Value) -> std::result::Result<ProviderReply, ProviderError> {
    let message = &payload["choices"][0]["message"];

    let content = message["content"].as_str().ok_or_else(|| {
        ProviderError::MalformedResponse("missing choices[0].message.content".to_string())
    })?;

    match message["reasoning_content"].as_str().filter(|r| !r.is_empty()) {
        Some(reasoning) => Ok(ProviderReply::with_reasoning(reasoning, content)),
        None => Ok(ProviderReply::plain(content)),
    }
}
