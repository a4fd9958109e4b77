use std::fmt;

/// Component source believed to hold exactly one default-exported component,
/// with markdown fencing and leading prose already removed.
///
/// Only [`crate::extract`] produces values of this type from raw model output.
/// Nothing guarantees the body is syntactically valid.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CandidateSource(String);

impl CandidateSource {
    pub(crate) fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Wraps code that has already been through extraction elsewhere (for
    /// example a previously exported file).
    pub fn from_trusted(code: impl Into<String>) -> Self {
        Self::new(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CandidateSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A standalone HTML document that mounts one candidate component together
/// with its runtime libraries and error-capture harness.
///
/// Built fresh for every render attempt and never cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewDocument(String);

impl PreviewDocument {
    pub(crate) fn new(html: String) -> Self {
        Self(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for PreviewDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
