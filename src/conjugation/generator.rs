//! Conversion of model-generated drills into validated [`Drill`] records.

use serde::Deserialize;
use tracing::warn;

use crate::llm::json::extract_json;
use crate::models::conjugation::{Drill, VerbRule};
use crate::{AppError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DrillPayload {
    Wrapped { drills: Vec<GeneratedDrill> },
    Bare(Vec<GeneratedDrill>),
}

/// Drill as emitted by the model; every field may be missing or blank.
#[derive(Debug, Deserialize)]
struct GeneratedDrill {
    rule_id: Option<String>,
    prompt: Option<String>,
    infinitive: Option<String>,
    pronoun: Option<String>,
    answer: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parse the model response into at most `limit` drills for `session_id`.
///
/// Drills naming a rule outside `rules` or missing a field are dropped.
///
/// # Errors
///
/// Returns `AppError::Llm` if the response holds no JSON drill list or no
/// usable drill survives validation.
pub fn parse_drills(
    raw: &str,
    session_id: &str,
    rules: &[&VerbRule],
    limit: usize,
) -> Result<Vec<Drill>> {
    let generated = match extract_json::<DrillPayload>(raw)? {
        DrillPayload::Wrapped { drills } | DrillPayload::Bare(drills) => drills,
    };

    let mut drills = Vec::with_capacity(limit.min(generated.len()));
    let mut dropped = 0usize;
    for item in generated {
        if drills.len() == limit {
            break;
        }
        let rule_id = non_blank(item.rule_id);
        let known = rule_id
            .as_deref()
            .is_some_and(|id| rules.iter().any(|rule| rule.id == id));
        let fields = (
            rule_id,
            non_blank(item.prompt),
            non_blank(item.infinitive),
            non_blank(item.pronoun),
            non_blank(item.answer),
        );
        match fields {
            (Some(rule_id), Some(prompt), Some(infinitive), Some(pronoun), Some(answer))
                if known =>
            {
                let position = u32::try_from(drills.len()).unwrap_or(u32::MAX);
                drills.push(Drill::new(
                    session_id.to_owned(),
                    rule_id,
                    position,
                    prompt,
                    infinitive,
                    pronoun,
                    answer,
                ));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, kept = drills.len(), "discarded malformed generated drills");
    }
    if drills.is_empty() {
        return Err(AppError::Llm("model produced no usable drills".into()));
    }
    Ok(drills)
}
