//! Row -> wire-model conversions shared by the handlers.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use parley_db::models::{MessageRow, UserRow};
use parley_types::models::{Message, User};

/// SQLite stores column defaults as "YYYY-MM-DD HH:MM:SS" without a
/// timezone, while rows we insert ourselves carry RFC 3339. Accept both.
pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

/// A stored id that fails to parse is a corrupt row, not something to
/// paper over: defaulting would alias distinct rows to the nil id on the
/// wire. Callers surface this as an internal error.
pub(crate) fn parse_id(raw: &str, context: &str) -> Result<Uuid> {
    raw.parse()
        .with_context(|| format!("corrupt id '{}' on {}", raw, context))
}

pub(crate) fn user_from_row(row: UserRow) -> Result<User> {
    Ok(User {
        id: parse_id(&row.id, "user")?,
        email: row.email,
        username: row.username,
        profile_pic: row.profile_pic,
        bio: row.bio,
        created_at: parse_timestamp(&row.created_at, "user"),
        updated_at: parse_timestamp(&row.updated_at, "user"),
    })
}

pub(crate) fn message_from_row(row: MessageRow) -> Result<Message> {
    let context = format!("message '{}'", row.id);
    Ok(Message {
        id: parse_id(&row.id, &context)?,
        sender_id: parse_id(&row.sender_id, &context)?,
        receiver_id: parse_id(&row.receiver_id, &context)?,
        text: row.text,
        image: row.image,
        seen: row.seen,
        created_at: parse_timestamp(&row.created_at, &context),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_db::models::UserRow;

    #[test]
    fn accepts_both_timestamp_formats() {
        let rfc = parse_timestamp("2026-01-01T10:00:00Z", "test");
        let sqlite = parse_timestamp("2026-01-01 10:00:00", "test");
        assert_eq!(rfc, sqlite);
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_default() {
        assert_eq!(parse_timestamp("not-a-date", "test"), DateTime::<Utc>::default());
    }

    #[test]
    fn corrupt_id_is_an_error_not_a_nil_alias() {
        assert!(parse_id("not-a-uuid", "test").is_err());

        let row = UserRow {
            id: "not-a-uuid".into(),
            email: "a@b.c".into(),
            username: "a".into(),
            password: "h".into(),
            profile_pic: String::new(),
            bio: None,
            created_at: "2026-01-01 10:00:00".into(),
            updated_at: "2026-01-01 10:00:00".into(),
        };
        assert!(user_from_row(row).is_err());
    }
}
