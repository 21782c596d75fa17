mod client;
pub(crate) mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AiError;
use crate::schema::StructuredOutput;
use crate::traits::{ChatModel, Completion};
use crate::util::extract_json;

use client::{GatewayClient, DEFAULT_BASE_URL};
use types::{ChatRequest, ResponseFormat};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Gateway
// =============================================================================

/// An OpenAI-compatible chat-completions endpoint bound to one model id.
///
/// Build one per model tier; the struct is cheap to clone behind an `Arc`.
pub struct Gateway {
    model: String,
    temperature: Option<f32>,
    client: GatewayClient,
}

impl Gateway {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AiError> {
        Self::build(api_key.into(), model.into(), DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self, AiError> {
        let api_key = std::env::var("GATEWAY_API_KEY")
            .map_err(|_| AiError::Config("GATEWAY_API_KEY environment variable not set".into()))?;
        let base_url =
            std::env::var("GATEWAY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::build(api_key, model.into(), &base_url, DEFAULT_TIMEOUT)
    }

    /// Full construction: the HTTP client is rebuilt because the timeout
    /// lives on it.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        Self::build(api_key.into(), model.into(), base_url, timeout)
    }

    fn build(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        if api_key.trim().is_empty() {
            return Err(AiError::Config("Gateway API key is empty".into()));
        }
        Ok(Self {
            model,
            temperature: None,
            client: GatewayClient::new(&api_key, base_url, timeout)?,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask for a `T` and parse it out of whatever the model sends back.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<T, AiError> {
        let request = Completion::new(system, user).schema(T::type_name(), T::strict_schema());
        let text = self.complete(request).await?;
        extract_json(&text)
    }
}

#[async_trait]
impl ChatModel for Gateway {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: Completion) -> Result<String, AiError> {
        let Completion {
            messages,
            temperature,
            max_tokens,
            schema,
        } = request;

        let wire = ChatRequest {
            model: self.model.clone(),
            messages: messages.into_iter().map(Into::into).collect(),
            temperature: temperature.or(self.temperature),
            max_tokens,
            response_format: schema.map(|(name, schema)| ResponseFormat::json_schema(name, schema)),
        };

        let text = self.client.chat(&wire).await?;
        debug!(model = %self.model, reply_len = text.len(), "Gateway reply");
        Ok(text)
    }
}
