//! Parsing of model corrections and diff rendering.

use serde::Deserialize;

use crate::llm::json::extract_json;
use crate::models::journal::{Correction, CorrectionCategory};
use crate::{AppError, Result};

#[derive(Debug, Deserialize)]
struct CorrectionPayload {
    corrected_text: Option<String>,
    #[serde(default)]
    corrections: Vec<RawCorrection>,
}

#[derive(Debug, Deserialize)]
struct RawCorrection {
    original: Option<String>,
    corrected: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Corrected text and the individual corrections behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionResult {
    /// Full corrected text.
    pub corrected_text: String,
    /// Individual corrections; entries without a change are dropped.
    pub corrections: Vec<Correction>,
}

/// Parse the model's correction JSON.
///
/// # Errors
///
/// Returns `AppError::Llm` when no JSON object is present or it lacks a
/// non-empty `corrected_text`.
pub fn parse_corrections(raw: &str) -> Result<CorrectionResult> {
    let payload: CorrectionPayload = extract_json(raw)?;
    let corrected_text = payload
        .corrected_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Llm("correction response lacks corrected_text".into()))?;

    let corrections = payload
        .corrections
        .into_iter()
        .filter_map(|c| {
            let original = c.original?.trim().to_owned();
            let corrected = c.corrected?.trim().to_owned();
            if original == corrected {
                return None;
            }
            Some(Correction {
                original,
                corrected,
                explanation: c.explanation.unwrap_or_default().trim().to_owned(),
                category: c
                    .category
                    .as_deref()
                    .map_or(CorrectionCategory::Other, CorrectionCategory::from_label),
            })
        })
        .collect();

    Ok(CorrectionResult {
        corrected_text,
        corrections,
    })
}

fn with_trailing_newline(text: &str) -> String {
    let mut owned = text.to_owned();
    if !owned.ends_with('\n') {
        owned.push('\n');
    }
    owned
}

/// Line-based unified diff from `original` to `corrected`; `None` when identical.
#[must_use]
pub fn unified_diff(original: &str, corrected: &str) -> Option<String> {
    let original = with_trailing_newline(original);
    let corrected = with_trailing_newline(corrected);
    if original == corrected {
        return None;
    }
    Some(diffy::create_patch(&original, &corrected).to_string())
}
