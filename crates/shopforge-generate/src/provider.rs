use crate::errors::GenerateError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One chat completion to run against a provider.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// Correlates provider logs with the generation that issued them.
    pub request_id: uuid::Uuid,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Model backend contract used by the generation handler.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Runs the completion and returns its full text. An empty string means
    /// the model produced nothing.
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError>;
}
