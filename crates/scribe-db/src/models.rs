/// Database row types — these map directly to SQLite rows.
/// Distinct from the scribe-types API models to keep the storage
/// layer independent.

pub struct UserRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    /// Argon2 PHC hash string, never plaintext.
    pub password: String,
    pub created_at: String,
}

pub struct NoteRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub created_at: String,
}

/// Partial update for a note. `None` fields keep their stored value;
/// `Some` fields are written exactly as supplied.
#[derive(Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub pinned: Option<bool>,
}
