use async_trait::async_trait;

use crate::error::AiError;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Completion Request
// =============================================================================

/// A single request to a chat model: messages plus sampling knobs.
///
/// `schema` carries a `(name, json_schema)` pair when the caller wants the
/// provider to constrain output; providers that ignore it still have their
/// reply run through [`crate::extract_json`] by the caller.
#[derive(Debug, Clone)]
pub struct Completion {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub schema: Option<(String, serde_json::Value)>,
}

impl Completion {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
            temperature: None,
            max_tokens: None,
            schema: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn schema(mut self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        self.schema = Some((name.into(), schema));
        self
    }
}

// =============================================================================
// ChatModel Trait
// =============================================================================

/// Anything that can turn a [`Completion`] into reply text.
///
/// The gateway implements this; tests substitute canned replies.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identity, for logs and reports.
    fn model(&self) -> &str;

    async fn complete(&self, request: Completion) -> Result<String, AiError>;
}
