/// Raw model output held no recognizable component boundary.
///
/// Fatal to one generation attempt; the host shows it as a generic failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExtractionError {
    message: String,
}

impl ExtractionError {
    pub(crate) fn not_component_code() -> Self {
        Self {
            message: "doesn't look like valid component code".to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by a [`crate::PreviewRuntime`] while starting an isolated
/// context. The supervisor turns these into a `Failed` display state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The runner program could not be started.
    #[error("failed to spawn preview runner `{program}`: {message}")]
    Spawn { program: String, message: String },
    /// I/O with the running context failed before it was established.
    #[error("preview runner i/o error: {0}")]
    Io(String),
    /// The runtime is not configured for launching contexts.
    #[error("preview runtime unavailable: {0}")]
    Unavailable(String),
}

impl RuntimeError {
    pub fn spawn(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            program: program.into(),
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }
}

/// Invalid preview configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
