//! Verb rule repository and attempt statistics for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::conjugation::{Mood, RuleStats, VerbRule};
use crate::models::{parse_optional_timestamp, parse_timestamp};
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for verb rules.
#[derive(Clone)]
pub struct RuleRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct RuleRow {
    id: String,
    name: String,
    tense: String,
    mood: String,
    description: String,
    example_verbs: String,
    unlock_order: i64,
    unlocked_at: Option<String>,
}

impl RuleRow {
    fn into_rule(self) -> Result<VerbRule> {
        Ok(VerbRule {
            id: self.id,
            name: self.name,
            tense: self.tense,
            mood: parse_mood(&self.mood)?,
            description: self.description,
            example_verbs: serde_json::from_str(&self.example_verbs)?,
            unlock_order: self.unlock_order,
            unlocked_at: parse_optional_timestamp("unlocked_at", self.unlocked_at.as_deref())?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    rule_id: String,
    attempts: i64,
    correct: i64,
    last_practiced_at: Option<String>,
}

impl StatsRow {
    fn into_stats(self) -> Result<RuleStats> {
        let to_u32 = |column: &str, value: i64| {
            u32::try_from(value).map_err(|_| AppError::Db(format!("invalid {column}: {value}")))
        };
        Ok(RuleStats {
            attempts: to_u32("attempts", self.attempts)?,
            correct: to_u32("correct", self.correct)?,
            last_practiced_at: self
                .last_practiced_at
                .as_deref()
                .map(|s| parse_timestamp("last_practiced_at", s))
                .transpose()?,
            rule_id: self.rule_id,
        })
    }
}

fn parse_mood(s: &str) -> Result<Mood> {
    match s {
        "indicative" => Ok(Mood::Indicative),
        "subjunctive" => Ok(Mood::Subjunctive),
        "imperative" => Ok(Mood::Imperative),
        other => Err(AppError::Db(format!("invalid mood: {other}"))),
    }
}

impl RuleRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// List every rule in unlock order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<VerbRule>> {
        let rows: Vec<RuleRow> = sqlx::query_as("SELECT * FROM verb_rule ORDER BY unlock_order")
            .fetch_all(self.db.as_ref())
            .await?;

        rows.into_iter().map(RuleRow::into_rule).collect()
    }

    /// List unlocked rules in unlock order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_unlocked(&self) -> Result<Vec<VerbRule>> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            "SELECT * FROM verb_rule WHERE unlocked_at IS NOT NULL ORDER BY unlock_order",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(RuleRow::into_rule).collect()
    }

    /// Retrieve a rule by slug.
    ///
    /// Returns `Ok(None)` if the rule does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<VerbRule>> {
        let row: Option<RuleRow> = sqlx::query_as("SELECT * FROM verb_rule WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(RuleRow::into_rule).transpose()
    }

    /// Unlock a rule at `at`. Already unlocked rules keep their original timestamp.
    ///
    /// Returns the rule as stored after the update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the rule does not exist.
    pub async fn unlock(&self, id: &str, at: DateTime<Utc>) -> Result<VerbRule> {
        sqlx::query("UPDATE verb_rule SET unlocked_at = ?1 WHERE id = ?2 AND unlocked_at IS NULL")
            .bind(at.to_rfc3339())
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("verb rule {id} not found")))
    }

    /// Aggregate attempt statistics for every rule that has at least one attempt.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn stats(&self) -> Result<Vec<RuleStats>> {
        let rows: Vec<StatsRow> = sqlx::query_as(
            "SELECT rule_id,
                    COUNT(*) AS attempts,
                    COALESCE(SUM(correct), 0) AS correct,
                    MAX(created_at) AS last_practiced_at
             FROM drill_attempt
             GROUP BY rule_id",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(StatsRow::into_stats).collect()
    }
}
