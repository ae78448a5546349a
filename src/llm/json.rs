//! Lenient JSON extraction from model output.
//!
//! Models asked for JSON still wrap it in Markdown fences or add a sentence
//! before and after. [`extract_json`] tries the raw text first, then a
//! fenced block, then the outermost object or array.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{AppError, Result};

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        // The pattern is a literal; compilation cannot fail.
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap()
    })
}

/// Parse the first JSON value embedded in `raw` into `T`.
///
/// # Errors
///
/// Returns `AppError::Llm` if no candidate fragment deserializes into `T`.
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    for captures in fence_pattern().captures_iter(trimmed) {
        if let Some(body) = captures.get(1) {
            if let Ok(value) = serde_json::from_str(body.as_str().trim()) {
                return Ok(value);
            }
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                    return Ok(value);
                }
            }
        }
    }

    let preview: String = trimmed.chars().take(120).collect();
    Err(AppError::Llm(format!(
        "model response did not contain the expected json: {preview}"
    )))
}
