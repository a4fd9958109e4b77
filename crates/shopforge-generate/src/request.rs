use std::fmt;

use shopforge_preview::CandidateSource;

use crate::errors::GenerateError;

/// Kind of storefront page to generate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Landing,
    Product,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Product => "product",
        }
    }

    /// Sections every generated page of this type must include, in order.
    pub fn required_sections(self) -> &'static [&'static str] {
        match self {
            Self::Landing => &[
                "navbar",
                "hero section",
                "features section",
                "pricing section",
                "testimonials",
                "CTA",
                "footer",
            ],
            Self::Product => &[
                "navbar",
                "product gallery",
                "title/description",
                "price",
                "add to cart button",
                "product details",
                "footer",
            ],
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PageType {
    type Err = GenerateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "landing" => Ok(Self::Landing),
            "product" => Ok(Self::Product),
            other => Err(GenerateError::validation(format!(
                "unknown page type `{other}` (expected landing or product)"
            ))),
        }
    }
}

/// A request to generate a new page, or to refine one when `previous_code`
/// is set.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub description: String,
    #[serde(default)]
    pub page_type: PageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_code: Option<String>,
}

impl GenerationRequest {
    pub fn new(description: impl Into<String>, page_type: PageType) -> Self {
        Self {
            description: description.into(),
            page_type,
            reference_url: None,
            previous_code: None,
        }
    }

    pub fn reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = Some(url.into());
        self
    }

    pub fn previous_code(mut self, code: impl Into<String>) -> Self {
        self.previous_code = Some(code.into());
        self
    }

    pub(crate) fn reference(&self) -> Option<&str> {
        self.reference_url.as_deref().filter(|url| !url.is_empty())
    }

    pub(crate) fn refining(&self) -> Option<&str> {
        self.previous_code.as_deref().filter(|code| !code.is_empty())
    }
}

/// Response shape handed back to a host: either `code` or `error` is
/// meaningful.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResponse {
    pub fn success(source: &CandidateSource) -> Self {
        Self {
            code: source.as_str().to_string(),
            error: None,
        }
    }

    pub fn failure(err: &GenerateError) -> Self {
        Self {
            code: String::new(),
            error: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
