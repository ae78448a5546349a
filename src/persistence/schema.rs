//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` and the verb rule
//! catalog is inserted with `INSERT OR IGNORE`, so bootstrap is safe to
//! re-run on every server startup.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::conjugation::catalog::CATALOG;
use crate::Result;

/// Apply all table definitions and seed the verb rule catalog.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL or seed statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS chat (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    topic           TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS message (
    id              TEXT PRIMARY KEY NOT NULL,
    chat_id         TEXT NOT NULL REFERENCES chat(id) ON DELETE CASCADE,
    role            TEXT NOT NULL CHECK(role IN ('user','assistant','system')),
    content         TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS journal_entry (
    id                  TEXT PRIMARY KEY NOT NULL,
    title               TEXT NOT NULL,
    content             TEXT NOT NULL,
    status              TEXT NOT NULL CHECK(status IN ('draft','corrected')),
    corrected_content   TEXT,
    corrections         TEXT NOT NULL DEFAULT '[]',
    diff                TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS verb_rule (
    id              TEXT PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL,
    tense           TEXT NOT NULL,
    mood            TEXT NOT NULL CHECK(mood IN ('indicative','subjunctive','imperative')),
    description     TEXT NOT NULL,
    example_verbs   TEXT NOT NULL DEFAULT '[]',
    unlock_order    INTEGER NOT NULL UNIQUE,
    unlocked_at     TEXT
);

CREATE TABLE IF NOT EXISTS drill_session (
    id              TEXT PRIMARY KEY NOT NULL,
    status          TEXT NOT NULL CHECK(status IN ('in_progress','completed','abandoned')),
    rule_ids        TEXT NOT NULL DEFAULT '[]',
    total           INTEGER NOT NULL,
    correct_count   INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    completed_at    TEXT
);

CREATE TABLE IF NOT EXISTS drill (
    id              TEXT PRIMARY KEY NOT NULL,
    session_id      TEXT NOT NULL REFERENCES drill_session(id) ON DELETE CASCADE,
    rule_id         TEXT NOT NULL REFERENCES verb_rule(id),
    position        INTEGER NOT NULL,
    prompt          TEXT NOT NULL,
    infinitive      TEXT NOT NULL,
    pronoun         TEXT NOT NULL,
    answer          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS drill_attempt (
    id              TEXT PRIMARY KEY NOT NULL,
    session_id      TEXT NOT NULL REFERENCES drill_session(id) ON DELETE CASCADE,
    drill_id        TEXT NOT NULL UNIQUE REFERENCES drill(id) ON DELETE CASCADE,
    rule_id         TEXT NOT NULL REFERENCES verb_rule(id),
    answer          TEXT NOT NULL,
    correct         INTEGER NOT NULL,
    accent_only     INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS book (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    author          TEXT,
    file_name       TEXT NOT NULL,
    file_size       INTEGER NOT NULL,
    sha256          TEXT NOT NULL UNIQUE,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reading_progress (
    book_id         TEXT PRIMARY KEY NOT NULL REFERENCES book(id) ON DELETE CASCADE,
    location        TEXT,
    percentage      REAL NOT NULL CHECK(percentage >= 0 AND percentage <= 100),
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_message_chat ON message(chat_id, created_at);
CREATE INDEX IF NOT EXISTS idx_drill_session ON drill(session_id, position);
CREATE INDEX IF NOT EXISTS idx_attempt_rule ON drill_attempt(rule_id);
CREATE INDEX IF NOT EXISTS idx_attempt_session ON drill_attempt(session_id);
CREATE INDEX IF NOT EXISTS idx_drill_session_status ON drill_session(status, created_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    seed_verb_rules(pool).await
}

/// Insert the built-in rule catalog and unlock the first rule on a fresh database.
async fn seed_verb_rules(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (index, rule) in CATALOG.iter().enumerate() {
        let unlock_order = i64::try_from(index).unwrap_or(i64::MAX - 1) + 1;
        let example_verbs = serde_json::to_string(rule.example_verbs)?;
        sqlx::query(
            "INSERT OR IGNORE INTO verb_rule
             (id, name, tense, mood, description, example_verbs, unlock_order, unlocked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
        )
        .bind(rule.id)
        .bind(rule.name)
        .bind(rule.tense)
        .bind(rule.mood.as_str())
        .bind(rule.description)
        .bind(&example_verbs)
        .bind(unlock_order)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "UPDATE verb_rule SET unlocked_at = ?1
         WHERE unlock_order = (SELECT MIN(unlock_order) FROM verb_rule)
           AND NOT EXISTS (SELECT 1 FROM verb_rule WHERE unlocked_at IS NOT NULL)",
    )
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
