//! Prompt builders for the chat, journal and conjugation services.

use std::fmt::Write as _;

use super::{ChatTurn, CompletionRequest};
use crate::models::chat::MessageRole;
use crate::models::conjugation::VerbRule;

const TUTOR_PERSONA: &str = "Eres un tutor de español amable y paciente. \
Responde siempre en español, con frases naturales y de nivel intermedio. \
Mantén las respuestas breves (dos a cuatro frases) y termina con una pregunta \
que invite al estudiante a seguir conversando. Si el estudiante comete un error \
importante, corrígelo de forma sutil repitiendo la frase correcta.";

/// Request for the tutor's next reply in a chat.
#[must_use]
pub fn tutor_reply(topic: Option<&str>, history: Vec<ChatTurn>) -> CompletionRequest {
    let mut system = TUTOR_PERSONA.to_owned();
    if let Some(topic) = topic {
        let _ = write!(system, " El tema de la conversación es: {topic}.");
    }
    CompletionRequest {
        system: Some(system),
        messages: history,
        json: false,
        temperature: None,
    }
}

/// Request for short replies the learner could send next.
#[must_use]
pub fn reply_suggestions(
    topic: Option<&str>,
    history: &[ChatTurn],
    count: usize,
) -> CompletionRequest {
    let mut transcript = String::new();
    for turn in history {
        let speaker = match turn.role {
            MessageRole::User => "Estudiante",
            _ => "Tutor",
        };
        let _ = writeln!(transcript, "{speaker}: {}", turn.content);
    }

    let mut instruction = format!(
        "Sugiere {count} respuestas cortas y distintas que el estudiante podría enviar a \
continuación. Devuelve únicamente JSON con la forma {{\"suggestions\": [\"...\"]}}."
    );
    if let Some(topic) = topic {
        let _ = write!(instruction, " Tema: {topic}.");
    }

    CompletionRequest {
        system: Some(instruction),
        messages: vec![ChatTurn::user(transcript)],
        json: true,
        temperature: Some(0.9),
    }
}

/// Request for grammar corrections of a journal entry.
#[must_use]
pub fn journal_corrections(title: &str, content: &str) -> CompletionRequest {
    let system = "Eres un corrector de textos en español para estudiantes. \
Corrige la gramática, ortografía, acentos, vocabulario y puntuación sin cambiar el estilo \
ni el significado. Devuelve únicamente JSON con la forma \
{\"corrected_text\": \"...\", \"corrections\": [{\"original\": \"...\", \"corrected\": \"...\", \
\"explanation\": \"...\", \"category\": \"grammar|spelling|accent|vocabulary|punctuation|other\"}]}. \
Las explicaciones deben ser breves y en inglés.";

    CompletionRequest {
        system: Some(system.to_owned()),
        messages: vec![ChatTurn::user(format!("Título: {title}\n\n{content}"))],
        json: true,
        temperature: Some(0.2),
    }
}

/// Request for `count` fill-in-the-blank drills spread over `rules`.
#[must_use]
pub fn conjugation_drills(rules: &[VerbRule], count: u32) -> CompletionRequest {
    let mut catalog = String::new();
    for rule in rules {
        let _ = writeln!(
            catalog,
            "- rule_id: {} | {} ({}, {}) | {} | ejemplos: {}",
            rule.id,
            rule.name,
            rule.tense,
            rule.mood.as_str(),
            rule.description,
            rule.example_verbs.join(", ")
        );
    }

    let system = format!(
        "Genera {count} ejercicios de conjugación en español repartidos entre las reglas \
indicadas. Cada ejercicio es una frase con un hueco (___) y el infinitivo entre paréntesis. \
Devuelve únicamente JSON con la forma {{\"drills\": [{{\"rule_id\": \"...\", \
\"prompt\": \"...\", \"infinitive\": \"...\", \"pronoun\": \"...\", \"answer\": \"...\"}}]}}. \
Usa exactamente los rule_id proporcionados."
    );

    CompletionRequest {
        system: Some(system),
        messages: vec![ChatTurn::user(catalog)],
        json: true,
        temperature: Some(0.8),
    }
}
