//! Turns a raw model completion into a [`CandidateSource`].
//!
//! The completion format is only loosely honored by the model, so extraction
//! is a fixed sequence of cheap textual rules rather than a parse:
//!
//! 1. trim surrounding whitespace;
//! 2. drop an opening markdown fence line and a closing fence line;
//! 3. re-trim;
//! 4. drop any prose preceding the first `export default function`;
//! 5. accept only if a default-export marker and a function definition remain.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::errors::ExtractionError;
use crate::source::CandidateSource;

const FENCE: &str = "```";

static DEFAULT_EXPORT_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+default\s+function\b").expect("valid regex"));
static DEFAULT_EXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+default\b").expect("valid regex"));
static FUNCTION_DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\b|=>").expect("valid regex"));
static FENCE_INFO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_+.#-]*$").expect("valid regex"));

/// Extracts the component body from a raw completion.
pub fn extract(raw: &str) -> Result<CandidateSource, ExtractionError> {
    let code = strip_fences(raw.trim()).trim();
    let code = drop_preamble(code);
    let code = strip_closing_fence(code).trim();

    if !has_default_export(code) || !has_function_definition(code) {
        debug!(
            event = "preview.extraction_rejected",
            domain = "preview",
            raw_len = raw.len() as u64
        );
        return Err(ExtractionError::not_component_code());
    }

    debug!(
        event = "preview.extracted",
        domain = "preview",
        raw_len = raw.len() as u64,
        code_len = code.len() as u64
    );
    Ok(CandidateSource::new(code))
}

/// Removes an opening fence (with or without a language hint) and, if present,
/// the closing fence. Text that does not start with a fence is returned as is.
pub fn strip_fences(text: &str) -> &str {
    match strip_opening_fence(text) {
        Some(rest) => strip_closing_fence(rest),
        None => text,
    }
}

fn strip_opening_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE)?;
    let (info, body) = match rest.split_once('\n') {
        Some((info, body)) => (info.trim_end_matches('\r'), body),
        None => (rest, ""),
    };
    if FENCE_INFO.is_match(info.trim()) {
        return Some(body);
    }
    // Code started on the fence line itself; strip a known hint only.
    let lead = info.len() - info.trim_start().len();
    let line = &rest[lead..];
    for hint in ["typescript", "javascript", "tsx", "jsx", "ts", "js"] {
        let tagged = line
            .get(..hint.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(hint));
        let separated = line
            .get(hint.len()..)
            .is_some_and(|tail| tail.starts_with(char::is_whitespace));
        if tagged && separated {
            return Some(&line[hint.len()..]);
        }
    }
    Some(rest)
}

/// Cuts the text at its first line consisting solely of a fence marker,
/// dropping trailing commentary the model may add after the code block.
pub fn strip_closing_fence(text: &str) -> &str {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim() == FENCE {
            return &text[..offset];
        }
        offset += line.len();
    }
    text.trim_end().strip_suffix(FENCE).unwrap_or(text)
}

/// Drops everything before the first `export default function` declaration.
pub fn drop_preamble(text: &str) -> &str {
    match DEFAULT_EXPORT_FUNCTION.find(text) {
        Some(found) if found.start() > 0 => &text[found.start()..],
        _ => text,
    }
}

pub fn has_default_export(text: &str) -> bool {
    DEFAULT_EXPORT.is_match(text)
}

pub fn has_function_definition(text: &str) -> bool {
    FUNCTION_DEFINITION.is_match(text)
}
