//! Adaptive conjugation drills.
//!
//! [`ConjugationService`] ties the rule catalog, the adaptive
//! [`selector`], model-driven drill generation and answer [`grader`]
//! together over the rule and drill repositories.

pub mod catalog;
pub mod generator;
pub mod grader;
pub mod selector;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::DrillConfig;
use crate::llm::{prompts, LlmClient};
use crate::models::conjugation::{
    Drill, DrillAttempt, DrillSession, DrillSessionStatus, RuleStats, VerbRule,
};
use crate::persistence::db::Database;
use crate::persistence::drill_repo::DrillRepo;
use crate::persistence::rule_repo::RuleRepo;
use crate::{AppError, Result};

use self::selector::{index_stats, next_unlock, select_rules, SelectionParams};

/// Largest session a client may request.
pub const MAX_SESSION_SIZE: u32 = 50;

/// A rule together with the learner's statistics for it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuleOverview {
    /// The rule.
    #[serde(flatten)]
    pub rule: VerbRule,
    /// Whether the rule is available for drills.
    pub unlocked: bool,
    /// Graded attempts.
    pub attempts: u32,
    /// Correct attempts.
    pub correct: u32,
    /// Share of correct attempts.
    pub accuracy: f64,
    /// Most recent attempt timestamp.
    pub last_practiced_at: Option<DateTime<Utc>>,
}

impl RuleOverview {
    fn new(rule: VerbRule, stats: Option<&RuleStats>) -> Self {
        let stats = stats
            .cloned()
            .unwrap_or_else(|| RuleStats::empty(rule.id.clone()));
        Self {
            unlocked: rule.is_unlocked(),
            attempts: stats.attempts,
            correct: stats.correct,
            accuracy: stats.accuracy(),
            last_practiced_at: stats.last_practiced_at,
            rule,
        }
    }
}

/// Overall conjugation progress.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressReport {
    /// Per-rule breakdown in unlock order.
    pub rules: Vec<RuleOverview>,
    /// Attempts across every rule.
    pub total_attempts: u32,
    /// Correct attempts across every rule.
    pub total_correct: u32,
    /// Share of correct attempts across every rule.
    pub overall_accuracy: f64,
    /// Number of unlocked rules.
    pub unlocked_rules: usize,
    /// Number of rules in the catalog.
    pub total_rules: usize,
}

/// Attempt details shown alongside a drill.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttemptView {
    /// Answer as typed.
    pub answer: String,
    /// Whether it was graded correct.
    pub correct: bool,
    /// Whether it differed only in accents.
    pub accent_only: bool,
}

/// A drill as presented to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DrillView {
    /// Drill identifier.
    pub id: String,
    /// Rule exercised.
    pub rule_id: String,
    /// Order within the session.
    pub position: u32,
    /// Sentence with a blank.
    pub prompt: String,
    /// Infinitive to conjugate.
    pub infinitive: String,
    /// Subject pronoun.
    pub pronoun: String,
    /// Expected answer, revealed once answered or when the session is over.
    pub answer: Option<String>,
    /// The learner's attempt, if any.
    pub attempt: Option<AttemptView>,
}

/// A session with its drills.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    /// The session record.
    #[serde(flatten)]
    pub session: DrillSession,
    /// Drills in position order.
    pub drills: Vec<DrillView>,
}

impl SessionView {
    fn new(session: DrillSession, drills: Vec<Drill>, attempts: Vec<DrillAttempt>) -> Self {
        let mut by_drill: HashMap<String, DrillAttempt> = attempts
            .into_iter()
            .map(|a| (a.drill_id.clone(), a))
            .collect();
        let reveal_all = session.status != DrillSessionStatus::InProgress;
        let drills = drills
            .into_iter()
            .map(|drill| {
                let attempt = by_drill.remove(&drill.id).map(|a| AttemptView {
                    answer: a.answer,
                    correct: a.correct,
                    accent_only: a.accent_only,
                });
                let answer = (reveal_all || attempt.is_some()).then_some(drill.answer);
                DrillView {
                    id: drill.id,
                    rule_id: drill.rule_id,
                    position: drill.position,
                    prompt: drill.prompt,
                    infinitive: drill.infinitive,
                    pronoun: drill.pronoun,
                    answer,
                    attempt,
                }
            })
            .collect();
        Self { session, drills }
    }
}

/// Result of grading one submitted answer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttemptResult {
    /// Stored attempt identifier.
    pub attempt_id: String,
    /// Drill answered.
    pub drill_id: String,
    /// Whether the answer was graded correct.
    pub correct: bool,
    /// Whether the answer differed only in accents.
    pub accent_only: bool,
    /// Expected conjugated form.
    pub expected: String,
}

/// Summary returned when a session is completed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionSummary {
    /// The completed session.
    pub session: DrillSession,
    /// Drills answered.
    pub answered: usize,
    /// Correct answers divided by drills in the session.
    pub score: f64,
    /// Rule unlocked as a result of this session, if any.
    pub unlocked_rule: Option<VerbRule>,
}

/// Orchestrates drill sessions over the rule and drill repositories.
#[derive(Clone)]
pub struct ConjugationService {
    rules: RuleRepo,
    drills: DrillRepo,
    llm: Arc<dyn LlmClient>,
    config: DrillConfig,
}

impl ConjugationService {
    /// Create a service backed by `db` and `llm`.
    #[must_use]
    pub fn new(db: Arc<Database>, llm: Arc<dyn LlmClient>, config: DrillConfig) -> Self {
        Self {
            rules: RuleRepo::new(Arc::clone(&db)),
            drills: DrillRepo::new(db),
            llm,
            config,
        }
    }

    async fn stats(&self) -> Result<HashMap<String, RuleStats>> {
        Ok(index_stats(self.rules.stats().await?))
    }

    /// Every rule with its unlock state and statistics.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a query fails.
    pub async fn rules_overview(&self) -> Result<Vec<RuleOverview>> {
        let stats = self.stats().await?;
        Ok(self
            .rules
            .list_all()
            .await?
            .into_iter()
            .map(|rule| {
                let rule_stats = stats.get(&rule.id);
                RuleOverview::new(rule, rule_stats)
            })
            .collect())
    }

    /// Aggregate progress across all rules.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a query fails.
    pub async fn progress(&self) -> Result<ProgressReport> {
        let rules = self.rules_overview().await?;
        let total_attempts: u32 = rules.iter().map(|r| r.attempts).sum();
        let total_correct: u32 = rules.iter().map(|r| r.correct).sum();
        let overall_accuracy = if total_attempts == 0 {
            0.0
        } else {
            f64::from(total_correct) / f64::from(total_attempts)
        };
        Ok(ProgressReport {
            total_attempts,
            total_correct,
            overall_accuracy,
            unlocked_rules: rules.iter().filter(|r| r.unlocked).count(),
            total_rules: rules.len(),
            rules,
        })
    }

    /// Select rules, generate drills and persist a new session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an out-of-range `size` or when no
    /// rule is unlocked, `AppError::Llm` if generation fails.
    pub async fn start_session(&self, size: Option<u32>) -> Result<SessionView> {
        let size = size.unwrap_or(self.config.session_size);
        if size == 0 || size > MAX_SESSION_SIZE {
            return Err(AppError::Validation(format!(
                "size must be between 1 and {MAX_SESSION_SIZE}"
            )));
        }

        let unlocked = self.rules.list_unlocked().await?;
        if unlocked.is_empty() {
            return Err(AppError::Validation(
                "no conjugation rules are unlocked".into(),
            ));
        }
        let stats = self.stats().await?;
        let selected = select_rules(&unlocked, &stats, &SelectionParams::from(&self.config));
        let owned: Vec<VerbRule> = selected.iter().map(|rule| (*rule).clone()).collect();

        let raw = self
            .llm
            .complete(prompts::conjugation_drills(&owned, size))
            .await?;

        let mut session = DrillSession::new(owned.iter().map(|r| r.id.clone()).collect(), 0);
        let limit = usize::try_from(size).unwrap_or(usize::MAX);
        let drills = generator::parse_drills(&raw, &session.id, &selected, limit)?;
        session.total = u32::try_from(drills.len()).unwrap_or(u32::MAX);

        self.drills.create_session(&session, &drills).await?;
        info!(
            session_id = %session.id,
            rules = ?session.rule_ids,
            drills = drills.len(),
            "drill session started"
        );
        Ok(SessionView::new(session, drills, Vec::new()))
    }

    /// Load a session with its drills and attempts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the session does not exist.
    pub async fn get_session(&self, id: &str) -> Result<SessionView> {
        let session = self.require_session(id).await?;
        let drills = self.drills.list_drills(id).await?;
        let attempts = self.drills.list_attempts(id).await?;
        Ok(SessionView::new(session, drills, attempts))
    }

    /// Grade and record an answer to one drill.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown session or drill, and
    /// `AppError::Validation` if the session is closed, the drill belongs
    /// to another session, the answer is blank, or the drill was answered.
    pub async fn submit_attempt(
        &self,
        session_id: &str,
        drill_id: &str,
        answer: &str,
    ) -> Result<AttemptResult> {
        let session = self.require_session(session_id).await?;
        if session.status != DrillSessionStatus::InProgress {
            return Err(AppError::Validation(format!(
                "drill session {session_id} is {}",
                session.status.as_str()
            )));
        }
        if answer.trim().is_empty() {
            return Err(AppError::Validation("answer must not be empty".into()));
        }

        let drill = self
            .drills
            .get_drill(drill_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("drill {drill_id} not found")))?;
        if drill.session_id != session_id {
            return Err(AppError::Validation(format!(
                "drill {drill_id} does not belong to session {session_id}"
            )));
        }
        if let Some(previous) = self.drills.get_attempt_for_drill(drill_id).await? {
            return Err(AppError::Validation(format!(
                "drill {drill_id} already answered with \"{}\"",
                previous.answer
            )));
        }

        let grade = grader::grade(answer, &drill.answer, self.config.accept_missing_accents);
        let attempt = DrillAttempt::new(
            &drill,
            answer.trim().to_owned(),
            grade.correct,
            grade.accent_only,
        );
        self.drills.record_attempt(&attempt).await?;

        Ok(AttemptResult {
            attempt_id: attempt.id,
            drill_id: drill.id,
            correct: grade.correct,
            accent_only: grade.accent_only,
            expected: drill.answer,
        })
    }

    /// Complete a session and unlock the next rule if every unlocked rule is mastered.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the session does not exist and
    /// `AppError::Validation` if it is not in progress.
    pub async fn complete_session(&self, id: &str) -> Result<CompletionSummary> {
        let session = self
            .drills
            .finish_session(id, DrillSessionStatus::Completed, Utc::now())
            .await?;
        let answered = self.drills.list_attempts(id).await?.len();
        let score = if session.total == 0 {
            0.0
        } else {
            f64::from(session.correct_count) / f64::from(session.total)
        };

        let rules = self.rules.list_all().await?;
        let stats = self.stats().await?;
        let unlocked_rule = match next_unlock(
            &rules,
            &stats,
            self.config.min_attempts,
            self.config.unlock_accuracy_threshold,
        ) {
            Some(rule) => {
                let rule = self.rules.unlock(&rule.id, Utc::now()).await?;
                info!(rule_id = %rule.id, "conjugation rule unlocked");
                Some(rule)
            }
            None => None,
        };

        info!(session_id = %id, answered, score, "drill session completed");
        Ok(CompletionSummary {
            session,
            answered,
            score,
            unlocked_rule,
        })
    }

    async fn require_session(&self, id: &str) -> Result<DrillSession> {
        self.drills
            .get_session(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("drill session {id} not found")))
    }
}
