//! Domain model module declarations.

use chrono::{DateTime, Utc};

use crate::{AppError, Result};

pub mod book;
pub mod chat;
pub mod conjugation;
pub mod journal;

/// Parse an RFC 3339 timestamp column into UTC.
pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {column}: {e}")))
}

/// Parse an optional RFC 3339 timestamp column into UTC.
pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(column, v)).transpose()
}
