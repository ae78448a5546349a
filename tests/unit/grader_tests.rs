use hablemos::conjugation::grader::{grade, normalize, strip_accents, Grade};

const EXACT: Grade = Grade {
    correct: true,
    accent_only: false,
};

#[test]
fn normalize_trims_lowercases_and_collapses_whitespace() {
    assert_eq!(normalize("  Hablo  "), "hablo");
    assert_eq!(normalize("Nos   Levantamos"), "nos levantamos");
    assert_eq!(normalize("¡Habla!"), "habla");
    assert_eq!(normalize("¿comes?"), "comes");
}

#[test]
fn edge_punctuation_is_ignored_when_grading() {
    assert_eq!(normalize("«Vamos.»"), "vamos");
    assert_eq!(normalize("\"comieron\","), "comieron");
    assert_eq!(normalize("nos vemos;"), "nos vemos");
    assert_eq!(grade("¡Hablad!", "hablad", false), EXACT);
    assert_eq!(grade("estudió.", "estudió", false), EXACT);
    // Inner punctuation is kept.
    assert!(!grade("ha-blo", "hablo", false).correct);
}

#[test]
fn strip_accents_keeps_enye() {
    assert_eq!(strip_accents("habló"), "hablo");
    assert_eq!(strip_accents("pingüino"), "pinguino");
    assert_eq!(strip_accents("año"), "año");
}

#[test]
fn exact_match_is_correct() {
    assert_eq!(grade("hablo", "hablo", false), EXACT);
    assert_eq!(grade(" Hablo ", "hablo", false), EXACT);
    assert_eq!(grade("HABLÓ", "habló", false), EXACT);
}

#[test]
fn missing_accent_is_flagged() {
    let strict = grade("hablo", "habló", false);
    assert!(!strict.correct);
    assert!(strict.accent_only);

    let lenient = grade("hablo", "habló", true);
    assert!(lenient.correct);
    assert!(lenient.accent_only);
}

#[test]
fn enye_is_not_an_accent() {
    let result = grade("ano", "año", true);
    assert!(!result.correct);
    assert!(!result.accent_only);
}

#[test]
fn wrong_answer_is_incorrect() {
    let result = grade("hablas", "hablo", true);
    assert!(!result.correct);
    assert!(!result.accent_only);
}

#[test]
fn blank_answer_is_never_accent_only() {
    let result = grade("   ", "hablo", true);
    assert!(!result.correct);
    assert!(!result.accent_only);
}
