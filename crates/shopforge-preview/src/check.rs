//! Advisory plausibility heuristics for extracted component source.
//!
//! A failing verdict is logged by callers and never stops a render.

use tracing::warn;

use crate::source::CandidateSource;

/// Outcome of [`check`]. `reason` is set only when `valid` is false.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationVerdict {
    pub fn pass() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// One named heuristic: the source passes when `holds` returns true.
pub struct Rule {
    pub name: &'static str,
    pub reason: &'static str,
    pub holds: fn(&str) -> bool,
}

/// Rules in evaluation order; the first failing rule decides the verdict.
pub const RULES: &[Rule] = &[
    Rule {
        name: "default_export",
        reason: "missing default export",
        holds: has_default_export_marker,
    },
    Rule {
        name: "utility_classes",
        reason: "no tailwind classes found",
        holds: uses_class_attribute,
    },
    Rule {
        name: "no_inline_styles",
        reason: "has inline styles, should use tailwind",
        holds: avoids_inline_style_object,
    },
];

pub fn has_default_export_marker(code: &str) -> bool {
    code.contains("export default")
}

pub fn uses_class_attribute(code: &str) -> bool {
    code.contains("className")
}

pub fn avoids_inline_style_object(code: &str) -> bool {
    !code.contains("style={{")
}

/// Evaluates [`RULES`] against the source. Pure; never fails.
pub fn check(source: &CandidateSource) -> ValidationVerdict {
    check_str(source.as_str())
}

pub fn check_str(code: &str) -> ValidationVerdict {
    RULES
        .iter()
        .find(|rule| !(rule.holds)(code))
        .map_or_else(ValidationVerdict::pass, |rule| {
            ValidationVerdict::fail(rule.reason)
        })
}

/// Runs [`check`] and emits a warning for a failing verdict.
pub fn check_and_log(source: &CandidateSource) -> ValidationVerdict {
    let verdict = check(source);
    if let Some(reason) = verdict.reason.as_deref() {
        warn!(
            event = "preview.validation_warning",
            domain = "preview",
            reason = reason,
            code_len = source.len() as u64,
            "validation issue"
        );
    }
    verdict
}
