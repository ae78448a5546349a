//! Conjugation rule, drill session and attempt models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Grammatical mood a rule belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Statements of fact.
    Indicative,
    /// Wishes, doubt, emotion.
    Subjunctive,
    /// Commands.
    Imperative,
}

impl Mood {
    /// Database and wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indicative => "indicative",
            Self::Subjunctive => "subjunctive",
            Self::Imperative => "imperative",
        }
    }
}

/// A conjugation pattern the learner practices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerbRule {
    /// Stable slug, e.g. `present-regular-ar`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Tense name, e.g. `present`, `preterite`.
    pub tense: String,
    /// Grammatical mood.
    pub mood: Mood,
    /// Short explanation of the pattern.
    pub description: String,
    /// Verbs that follow the pattern, used to seed drill generation.
    pub example_verbs: Vec<String>,
    /// Position in the unlock sequence; lower unlocks first.
    pub unlock_order: i64,
    /// When the rule became available; `None` while locked.
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl VerbRule {
    /// Whether the selector may draw from this rule.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// Aggregated attempt statistics for one rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleStats {
    /// Rule identifier.
    pub rule_id: String,
    /// Graded attempts.
    pub attempts: u32,
    /// Correct attempts.
    pub correct: u32,
    /// Most recent attempt timestamp.
    pub last_practiced_at: Option<DateTime<Utc>>,
}

impl RuleStats {
    /// Statistics for a rule with no attempts yet.
    #[must_use]
    pub fn empty(rule_id: String) -> Self {
        Self {
            rule_id,
            attempts: 0,
            correct: 0,
            last_practiced_at: None,
        }
    }

    /// Share of correct attempts; zero when there are no attempts.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.attempts)
        }
    }
}

/// Lifecycle status of a drill session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrillSessionStatus {
    /// Accepting attempts.
    InProgress,
    /// Finished by the learner.
    Completed,
    /// Left unfinished past the staleness window.
    Abandoned,
}

impl DrillSessionStatus {
    /// Database and wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

/// A practice session drawing drills from a set of rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrillSession {
    /// Unique record identifier.
    pub id: String,
    /// Current lifecycle status.
    pub status: DrillSessionStatus,
    /// Rules chosen by the selector, in selection order.
    pub rule_ids: Vec<String>,
    /// Number of drills in the session.
    pub total: u32,
    /// Number of correctly answered attempts.
    pub correct_count: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

impl DrillSession {
    /// Construct a new in-progress session.
    #[must_use]
    pub fn new(rule_ids: Vec<String>, total: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: DrillSessionStatus::InProgress,
            rule_ids,
            total,
            correct_count: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// A single fill-in-the-blank exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Drill {
    /// Unique record identifier.
    pub id: String,
    /// Owning session identifier.
    pub session_id: String,
    /// Rule exercised by this drill.
    pub rule_id: String,
    /// Zero-based order within the session.
    pub position: u32,
    /// Sentence with a blank, e.g. `Ayer nosotros ___ (comer) paella.`
    pub prompt: String,
    /// Infinitive to conjugate.
    pub infinitive: String,
    /// Subject pronoun.
    pub pronoun: String,
    /// Expected conjugated form.
    pub answer: String,
}

impl Drill {
    /// Construct a drill belonging to `session_id`.
    #[must_use]
    pub fn new(
        session_id: String,
        rule_id: String,
        position: u32,
        prompt: String,
        infinitive: String,
        pronoun: String,
        answer: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            rule_id,
            position,
            prompt,
            infinitive,
            pronoun,
            answer,
        }
    }
}

/// A graded answer to a drill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrillAttempt {
    /// Unique record identifier.
    pub id: String,
    /// Session the attempt belongs to.
    pub session_id: String,
    /// Drill answered.
    pub drill_id: String,
    /// Rule exercised, denormalized for statistics.
    pub rule_id: String,
    /// Answer as typed.
    pub answer: String,
    /// Whether the attempt was graded correct.
    pub correct: bool,
    /// Whether the answer differed only in written accents.
    pub accent_only: bool,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl DrillAttempt {
    /// Construct an attempt stamped with the current time.
    #[must_use]
    pub fn new(drill: &Drill, answer: String, correct: bool, accent_only: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: drill.session_id.clone(),
            drill_id: drill.id.clone(),
            rule_id: drill.rule_id.clone(),
            answer,
            correct,
            accent_only,
            created_at: Utc::now(),
        }
    }
}
