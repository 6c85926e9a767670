use crate::Database;
use crate::models::{MessageRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        username: &str,
        password_hash: &str,
        bio: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, username, password, bio) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, email, username, password_hash, bio],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, email, username, password, profile_pic, bio, created_at, updated_at FROM users WHERE email = ?1", email)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, email, username, password, profile_pic, bio, created_at, updated_at FROM users WHERE id = ?1", id)
        })
    }

    /// Update only the provided fields; NULL params leave a column as-is.
    /// Returns the updated row.
    pub fn update_profile(
        &self,
        id: &str,
        username: Option<&str>,
        bio: Option<&str>,
        profile_pic: Option<&str>,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET
                    username    = COALESCE(?2, username),
                    bio         = COALESCE(?3, bio),
                    profile_pic = COALESCE(?4, profile_pic),
                    updated_at  = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, username, bio, profile_pic],
            )?;
            query_user(conn, "SELECT id, email, username, password, profile_pic, bio, created_at, updated_at FROM users WHERE id = ?1", id)
        })
    }

    /// Everyone except the given user, oldest account first.
    pub fn list_users_except(&self, id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, username, password, profile_pic, bio, created_at, updated_at
                 FROM users WHERE id != ?1 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        text: Option<&str>,
        image: Option<&str>,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, text, image, seen, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                rusqlite::params![id, sender_id, receiver_id, text, image, created_at],
            )?;
            Ok(())
        })
    }

    /// All messages between the two users, in storage order.
    pub fn get_conversation(&self, user_a: &str, user_b: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, receiver_id, text, image, seen, created_at
                 FROM messages
                 WHERE (sender_id = ?1 AND receiver_id = ?2)
                    OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([user_a, user_b], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Unseen messages from `sender_id` addressed to `receiver_id`.
    pub fn count_unseen(&self, sender_id: &str, receiver_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: u64 = conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE sender_id = ?1 AND receiver_id = ?2 AND seen = 0",
                [sender_id, receiver_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Flip every sender -> receiver message to seen. Idempotent.
    /// Returns the number of rows that actually changed.
    pub fn mark_conversation_seen(&self, sender_id: &str, receiver_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET seen = 1
                 WHERE sender_id = ?1 AND receiver_id = ?2 AND seen = 0",
                [sender_id, receiver_id],
            )?;
            Ok(changed)
        })
    }

    pub fn mark_message_seen(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE messages SET seen = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, sql: &str, param: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let row = stmt.query_row([param], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        profile_pic: row.get(4)?,
        bio: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        text: row.get(3)?,
        image: row.get(4)?,
        seen: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn seed_users(db: &Database) -> (String, String) {
        let a = uuid::Uuid::new_v4().to_string();
        let b = uuid::Uuid::new_v4().to_string();
        db.create_user(&a, "alice@example.com", "alice", "hash-a", None)
            .unwrap();
        db.create_user(&b, "bob@example.com", "bob", "hash-b", Some("hi there"))
            .unwrap();
        (a, b)
    }

    fn send(db: &Database, from: &str, to: &str, text: &str, at: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        db.insert_message(&id, from, to, Some(text), None, at).unwrap();
        id
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed_users(&db);
        let dup = uuid::Uuid::new_v4().to_string();
        assert!(
            db.create_user(&dup, "alice@example.com", "alice2", "h", None)
                .is_err()
        );
    }

    #[test]
    fn update_profile_leaves_absent_fields_untouched() {
        let db = Database::open_in_memory().unwrap();
        let (a, _) = seed_users(&db);

        let updated = db
            .update_profile(&a, None, Some("new bio"), None)
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.bio.as_deref(), Some("new bio"));

        let updated = db
            .update_profile(&a, Some("alicia"), None, Some("https://cdn/pic.png"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.bio.as_deref(), Some("new bio"));
        assert_eq!(updated.profile_pic, "https://cdn/pic.png");
    }

    #[test]
    fn unseen_count_matches_persisted_unseen_messages() {
        let db = Database::open_in_memory().unwrap();
        let (a, b) = seed_users(&db);

        send(&db, &a, &b, "one", "2026-01-01T10:00:00Z");
        send(&db, &a, &b, "two", "2026-01-01T10:00:01Z");
        send(&db, &b, &a, "reply", "2026-01-01T10:00:02Z");

        assert_eq!(db.count_unseen(&a, &b).unwrap(), 2);
        assert_eq!(db.count_unseen(&b, &a).unwrap(), 1);
    }

    #[test]
    fn marking_a_conversation_seen_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let (a, b) = seed_users(&db);

        send(&db, &a, &b, "one", "2026-01-01T10:00:00Z");
        send(&db, &a, &b, "two", "2026-01-01T10:00:01Z");

        assert_eq!(db.mark_conversation_seen(&a, &b).unwrap(), 2);
        assert_eq!(db.count_unseen(&a, &b).unwrap(), 0);
        // Second pass finds nothing left to flip
        assert_eq!(db.mark_conversation_seen(&a, &b).unwrap(), 0);
    }

    #[test]
    fn conversation_includes_both_directions_in_order() {
        let db = Database::open_in_memory().unwrap();
        let (a, b) = seed_users(&db);

        send(&db, &a, &b, "first", "2026-01-01T10:00:00Z");
        send(&db, &b, &a, "second", "2026-01-01T10:00:01Z");
        send(&db, &a, &b, "third", "2026-01-01T10:00:02Z");

        let msgs = db.get_conversation(&a, &b).unwrap();
        let texts: Vec<_> = msgs.iter().filter_map(|m| m.text.as_deref()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);

        // Symmetric regardless of argument order
        let msgs = db.get_conversation(&b, &a).unwrap();
        assert_eq!(msgs.len(), 3);
    }

    #[test]
    fn mark_single_message_seen() {
        let db = Database::open_in_memory().unwrap();
        let (a, b) = seed_users(&db);

        let id = send(&db, &a, &b, "one", "2026-01-01T10:00:00Z");
        send(&db, &a, &b, "two", "2026-01-01T10:00:01Z");

        db.mark_message_seen(&id).unwrap();
        assert_eq!(db.count_unseen(&a, &b).unwrap(), 1);
    }

    #[test]
    fn list_users_excludes_the_requester() {
        let db = Database::open_in_memory().unwrap();
        let (a, b) = seed_users(&db);

        let others = db.list_users_except(&a).unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].id, b);
    }
}
