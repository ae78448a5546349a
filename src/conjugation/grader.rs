//! Answer grading for conjugation drills.

use serde::Serialize;

/// Outcome of grading one answer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Grade {
    /// Whether the answer counts as correct.
    pub correct: bool,
    /// Whether the answer matched except for written accents.
    pub accent_only: bool,
}

fn is_edge_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '¡' | '¿' | '"' | '\'' | '«' | '»'
    )
}

/// Trim, lowercase, drop edge punctuation and collapse inner whitespace.
#[must_use]
pub fn normalize(answer: &str) -> String {
    answer
        .trim()
        .trim_matches(is_edge_punctuation)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace accented vowels with their plain forms. `ñ` is kept.
#[must_use]
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// Grade `answer` against `expected`.
///
/// An answer that differs only in accents is flagged `accent_only` and
/// counts as correct only when `accept_missing_accents` is set.
#[must_use]
pub fn grade(answer: &str, expected: &str, accept_missing_accents: bool) -> Grade {
    let given = normalize(answer);
    let wanted = normalize(expected);

    if given == wanted {
        return Grade {
            correct: true,
            accent_only: false,
        };
    }

    let accent_only = !given.is_empty() && strip_accents(&given) == strip_accents(&wanted);
    Grade {
        correct: accent_only && accept_missing_accents,
        accent_only,
    }
}
