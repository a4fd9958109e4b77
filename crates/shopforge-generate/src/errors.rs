use shopforge_preview::ExtractionError;

/// Errors returned while turning a generation request into component source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateError {
    /// The request itself was unusable.
    #[error("{0}")]
    Validation(String),
    /// Provider configuration is missing or invalid.
    #[error("config error: {0}")]
    Config(String),
    /// The provider answered with an application-level failure.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status_code: Option<u16>,
    },
    /// Request or stream I/O failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The provider's response could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The completion was empty.
    #[error("No code generated")]
    NoCompletion,
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl GenerateError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn provider(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Provider {
            message: message.into(),
            status_code,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// HTTP-style status for hosts that answer over HTTP: `400` for a bad
    /// request, `500` for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            _ => 500,
        }
    }
}
