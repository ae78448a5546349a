//! Drill session, drill and attempt repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::conjugation::{Drill, DrillAttempt, DrillSession, DrillSessionStatus};
use crate::models::{parse_optional_timestamp, parse_timestamp};
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for drill sessions and their children.
#[derive(Clone)]
pub struct DrillRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    status: String,
    rule_ids: String,
    total: i64,
    correct_count: i64,
    created_at: String,
    completed_at: Option<String>,
}

impl SessionRow {
    fn into_session(self) -> Result<DrillSession> {
        Ok(DrillSession {
            id: self.id,
            status: parse_status(&self.status)?,
            rule_ids: serde_json::from_str(&self.rule_ids)?,
            total: to_u32("total", self.total)?,
            correct_count: to_u32("correct_count", self.correct_count)?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            completed_at: parse_optional_timestamp("completed_at", self.completed_at.as_deref())?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DrillRow {
    id: String,
    session_id: String,
    rule_id: String,
    position: i64,
    prompt: String,
    infinitive: String,
    pronoun: String,
    answer: String,
}

impl DrillRow {
    fn into_drill(self) -> Result<Drill> {
        Ok(Drill {
            id: self.id,
            session_id: self.session_id,
            rule_id: self.rule_id,
            position: to_u32("position", self.position)?,
            prompt: self.prompt,
            infinitive: self.infinitive,
            pronoun: self.pronoun,
            answer: self.answer,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    id: String,
    session_id: String,
    drill_id: String,
    rule_id: String,
    answer: String,
    correct: bool,
    accent_only: bool,
    created_at: String,
}

impl AttemptRow {
    fn into_attempt(self) -> Result<DrillAttempt> {
        Ok(DrillAttempt {
            id: self.id,
            session_id: self.session_id,
            drill_id: self.drill_id,
            rule_id: self.rule_id,
            answer: self.answer,
            correct: self.correct,
            accent_only: self.accent_only,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

fn to_u32(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| AppError::Db(format!("invalid {column}: {value}")))
}

fn parse_status(s: &str) -> Result<DrillSessionStatus> {
    match s {
        "in_progress" => Ok(DrillSessionStatus::InProgress),
        "completed" => Ok(DrillSessionStatus::Completed),
        "abandoned" => Ok(DrillSessionStatus::Abandoned),
        other => Err(AppError::Db(format!("invalid drill session status: {other}"))),
    }
}

impl DrillRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a session together with its drills in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any insert fails; nothing is persisted then.
    pub async fn create_session(&self, session: &DrillSession, drills: &[Drill]) -> Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO drill_session (id, status, rule_ids, total, correct_count,
             created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&session.id)
        .bind(session.status.as_str())
        .bind(serde_json::to_string(&session.rule_ids)?)
        .bind(i64::from(session.total))
        .bind(i64::from(session.correct_count))
        .bind(session.created_at.to_rfc3339())
        .bind(session.completed_at.map(|dt| dt.to_rfc3339()))
        .execute(&mut *tx)
        .await?;

        for drill in drills {
            sqlx::query(
                "INSERT INTO drill (id, session_id, rule_id, position, prompt, infinitive,
                 pronoun, answer)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&drill.id)
            .bind(&drill.session_id)
            .bind(&drill.rule_id)
            .bind(i64::from(drill.position))
            .bind(&drill.prompt)
            .bind(&drill.infinitive)
            .bind(&drill.pronoun)
            .bind(&drill.answer)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Retrieve a session by identifier.
    ///
    /// Returns `Ok(None)` if the session does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_session(&self, id: &str) -> Result<Option<DrillSession>> {
        let row: Option<SessionRow> = sqlx::query_as("SELECT * FROM drill_session WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(SessionRow::into_session).transpose()
    }

    /// List a session's drills in position order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_drills(&self, session_id: &str) -> Result<Vec<Drill>> {
        let rows: Vec<DrillRow> =
            sqlx::query_as("SELECT * FROM drill WHERE session_id = ?1 ORDER BY position")
                .bind(session_id)
                .fetch_all(self.db.as_ref())
                .await?;

        rows.into_iter().map(DrillRow::into_drill).collect()
    }

    /// Retrieve a drill by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_drill(&self, id: &str) -> Result<Option<Drill>> {
        let row: Option<DrillRow> = sqlx::query_as("SELECT * FROM drill WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(DrillRow::into_drill).transpose()
    }

    /// Retrieve the attempt recorded for a drill, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_attempt_for_drill(&self, drill_id: &str) -> Result<Option<DrillAttempt>> {
        let row: Option<AttemptRow> =
            sqlx::query_as("SELECT * FROM drill_attempt WHERE drill_id = ?1")
                .bind(drill_id)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(AttemptRow::into_attempt).transpose()
    }

    /// List a session's attempts in submission order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_attempts(&self, session_id: &str) -> Result<Vec<DrillAttempt>> {
        let rows: Vec<AttemptRow> = sqlx::query_as(
            "SELECT * FROM drill_attempt WHERE session_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(session_id)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(AttemptRow::into_attempt).collect()
    }

    /// Persist a graded attempt and bump the session's correct count.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the drill was already answered or the
    /// session no longer accepts attempts, `AppError::Db` on other failures.
    pub async fn record_attempt(&self, attempt: &DrillAttempt) -> Result<DrillAttempt> {
        let mut tx = self.db.begin().await?;

        let insert = sqlx::query(
            "INSERT INTO drill_attempt (id, session_id, drill_id, rule_id, answer, correct,
             accent_only, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&attempt.id)
        .bind(&attempt.session_id)
        .bind(&attempt.drill_id)
        .bind(&attempt.rule_id)
        .bind(&attempt.answer)
        .bind(attempt.correct)
        .bind(attempt.accent_only)
        .bind(attempt.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await;

        if let Err(sqlx::Error::Database(ref db_err)) = insert {
            if db_err.is_unique_violation() {
                return Err(AppError::Validation(format!(
                    "drill {} already answered",
                    attempt.drill_id
                )));
            }
        }
        insert?;

        let updated = sqlx::query(
            "UPDATE drill_session SET correct_count = correct_count + ?1
             WHERE id = ?2 AND status = 'in_progress'",
        )
        .bind(i64::from(attempt.correct))
        .bind(&attempt.session_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "drill session {} is not in progress",
                attempt.session_id
            )));
        }

        tx.commit().await?;
        Ok(attempt.clone())
    }

    /// Move an in-progress session to `status`, stamping `completed_at` on completion.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the session is not in progress,
    /// `AppError::NotFound` if it does not exist.
    pub async fn finish_session(
        &self,
        id: &str,
        status: DrillSessionStatus,
        at: DateTime<Utc>,
    ) -> Result<DrillSession> {
        let completed_at = (status == DrillSessionStatus::Completed).then(|| at.to_rfc3339());
        let result = sqlx::query(
            "UPDATE drill_session SET status = ?1, completed_at = ?2
             WHERE id = ?3 AND status = 'in_progress'",
        )
        .bind(status.as_str())
        .bind(completed_at)
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        let session = self
            .get_session(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("drill session {id} not found")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "drill session {id} is already {}",
                session.status.as_str()
            )));
        }
        Ok(session)
    }

    /// Mark sessions still in progress and created before `cutoff` as abandoned.
    ///
    /// Returns the number of sessions updated.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn abandon_started_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE drill_session SET status = 'abandoned'
             WHERE status = 'in_progress' AND created_at < ?1",
        )
        .bind(cutoff.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected())
    }
}
