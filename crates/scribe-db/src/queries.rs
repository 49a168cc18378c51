use rusqlite::{Connection, OptionalExtension};

use crate::models::{NoteChanges, NoteRow, UserRow};
use crate::{Database, StoreError};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, full_name, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, full_name, email, password_hash, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Notes --
    //
    // Every note query below takes the owning user id as a filter.
    // A note id on its own is never enough to reach a row.

    pub fn insert_note(&self, note: &NoteRow) -> Result<(), StoreError> {
        let tags = encode_tags(&note.tags)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (id, user_id, title, content, tags, pinned, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    note.id,
                    note.user_id,
                    note.title,
                    note.content,
                    tags,
                    note.pinned,
                    note.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_note(&self, note_id: &str, user_id: &str) -> Result<Option<NoteRow>, StoreError> {
        self.with_conn(|conn| query_note(conn, note_id, user_id))
    }

    /// Read-modify-write under a single connection lock. SQLite's
    /// single-writer model makes this atomic per note; two edits from
    /// the same owner are last-write-wins.
    pub fn update_note(
        &self,
        note_id: &str,
        user_id: &str,
        changes: &NoteChanges,
    ) -> Result<Option<NoteRow>, StoreError> {
        self.with_conn(|conn| {
            let Some(existing) = query_note(conn, note_id, user_id)? else {
                return Ok(None);
            };

            let title = changes.title.as_deref().unwrap_or(&existing.title);
            let content = changes.content.as_deref().unwrap_or(&existing.content);
            let tags = encode_tags(changes.tags.as_ref().unwrap_or(&existing.tags))?;
            let pinned = changes.pinned.unwrap_or(existing.pinned);

            conn.execute(
                "UPDATE notes SET title = ?1, content = ?2, tags = ?3, pinned = ?4
                 WHERE id = ?5 AND user_id = ?6",
                rusqlite::params![title, content, tags, pinned, note_id, user_id],
            )?;

            query_note(conn, note_id, user_id)
        })
    }

    /// All of a user's notes, pinned ones first. Within each group the
    /// order is insertion order (rowid), which is stable.
    pub fn list_notes(&self, user_id: &str) -> Result<Vec<NoteRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, content, tags, pinned, created_at
                 FROM notes
                 WHERE user_id = ?1
                 ORDER BY pinned DESC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([user_id], note_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns true when a row was removed. A second call for the same
    /// id returns false.
    pub fn delete_note(&self, note_id: &str, user_id: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
                (note_id, user_id),
            )?;
            Ok(affected > 0)
        })
    }

    /// Case-insensitive substring match on title or content, scoped to
    /// the owner. LIKE metacharacters in the query match literally.
    pub fn search_notes(&self, user_id: &str, query: &str) -> Result<Vec<NoteRow>, StoreError> {
        let pattern = like_pattern(query);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, content, tags, pinned, created_at
                 FROM notes
                 WHERE user_id = ?1
                   AND (title LIKE ?2 ESCAPE '\\' OR content LIKE ?2 ESCAPE '\\')
                 ORDER BY pinned DESC, rowid ASC",
            )?;
            let rows = stmt
                .query_map((user_id, &pattern), note_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, email, password, created_at FROM users WHERE email = ?1",
    )?;
    let row = stmt.query_row([email], user_from_row).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, email, password, created_at FROM users WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], user_from_row).optional()?;
    Ok(row)
}

fn query_note(conn: &Connection, note_id: &str, user_id: &str) -> Result<Option<NoteRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, content, tags, pinned, created_at
         FROM notes
         WHERE id = ?1 AND user_id = ?2",
    )?;
    let row = stmt
        .query_row((note_id, user_id), note_from_row)
        .optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn note_from_row(row: &rusqlite::Row) -> rusqlite::Result<NoteRow> {
    let tags: String = row.get(4)?;
    let tags = serde_json::from_str(&tags).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(NoteRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        tags,
        pinned: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn encode_tags(tags: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(tags)
        .map_err(|e| StoreError::Other(anyhow::anyhow!("tags encoding failed: {e}")))
}

/// Builds a `%query%` LIKE pattern, escaping `%`, `_` and `\` so they
/// match literally. SQLite LIKE is case-insensitive for ASCII.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, id: &str, email: &str) {
        db.create_user(id, "Test User", email, "$argon2$fake", "2026-01-01T00:00:00Z")
            .unwrap();
    }

    fn seed_note(db: &Database, id: &str, user_id: &str, title: &str, content: &str) {
        db.insert_note(&NoteRow {
            id: id.into(),
            user_id: user_id.into(),
            title: title.into(),
            content: content.into(),
            tags: vec![],
            pinned: false,
            created_at: "2026-01-01T00:00:00Z".into(),
        })
        .unwrap();
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\dir"), "%c:\\\\dir%");
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let db = test_db();
        seed_user(&db, "u1", "dup@example.com");
        let err = db
            .create_user("u2", "Other", "dup@example.com", "$argon2$fake", "2026-01-01T00:00:00Z")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn update_keeps_omitted_fields() {
        let db = test_db();
        seed_user(&db, "u1", "a@example.com");
        seed_note(&db, "n1", "u1", "Groceries", "milk, eggs");

        let updated = db
            .update_note(
                "n1",
                "u1",
                &NoteChanges {
                    tags: Some(vec!["home".into()]),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Groceries");
        assert_eq!(updated.content, "milk, eggs");
        assert_eq!(updated.tags, vec!["home".to_string()]);
    }

    #[test]
    fn update_with_wrong_owner_touches_nothing() {
        let db = test_db();
        seed_user(&db, "u1", "a@example.com");
        seed_user(&db, "u2", "b@example.com");
        seed_note(&db, "n1", "u1", "Mine", "private");

        let result = db
            .update_note(
                "n1",
                "u2",
                &NoteChanges {
                    title: Some("stolen".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(result.is_none());

        let original = db.get_note("n1", "u1").unwrap().unwrap();
        assert_eq!(original.title, "Mine");
    }

    #[test]
    fn delete_reports_whether_a_row_went_away() {
        let db = test_db();
        seed_user(&db, "u1", "a@example.com");
        seed_note(&db, "n1", "u1", "t", "c");

        assert!(!db.delete_note("n1", "someone-else").unwrap());
        assert!(db.delete_note("n1", "u1").unwrap());
        assert!(!db.delete_note("n1", "u1").unwrap());
    }

    #[test]
    fn list_puts_pinned_first_in_insertion_order() {
        let db = test_db();
        seed_user(&db, "u1", "a@example.com");
        seed_note(&db, "n1", "u1", "first", "c");
        seed_note(&db, "n2", "u1", "second", "c");
        seed_note(&db, "n3", "u1", "third", "c");
        db.update_note(
            "n3",
            "u1",
            &NoteChanges {
                pinned: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let ids: Vec<String> = db.list_notes("u1").unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["n3", "n1", "n2"]);
    }

    #[test]
    fn search_is_case_insensitive_and_literal() {
        let db = test_db();
        seed_user(&db, "u1", "a@example.com");
        seed_note(&db, "n1", "u1", "Groceries", "milk, eggs");
        seed_note(&db, "n2", "u1", "Progress", "100% done");
        seed_note(&db, "n3", "u1", "Misc", "aXb");

        let hits = db.search_notes("u1", "MILK").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "n1");

        // `%` must not act as a wildcard
        let hits = db.search_notes("u1", "100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "n2");

        // `_` must not match an arbitrary character
        assert!(db.search_notes("u1", "a_b").unwrap().is_empty());
    }
}
