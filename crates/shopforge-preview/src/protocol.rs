//! Message schema for the one-way fault channel from an isolated context to
//! the host.

/// `type` tag carried by every fault notification.
pub const ERROR_MESSAGE_TYPE: &str = "iframe-error";

/// A serialized notification crossing the isolation boundary.
///
/// Wire form: `{"type":"iframe-error","message":"..."}`. Anything else is not
/// a boundary message and must be ignored by the host.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum BoundaryMessage {
    #[serde(rename = "iframe-error")]
    Error { message: String },
}

impl BoundaryMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Parses one line of runner output. Returns `None` for anything lacking
    /// the boundary shape, including non-JSON text.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Error { message } => message,
        }
    }

    pub fn into_message(self) -> String {
        match self {
            Self::Error { message } => message,
        }
    }
}
