use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Note, User};

// -- JWT Claims --

/// JWT claims shared between the auth handlers and the REST
/// middleware. Canonical definition lives here in scribe-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by both registration and login: the public user record
/// plus a freshly minted session token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

// -- Notes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tags: Option<Vec<String>>,
}

/// Partial update. `None` means the field was omitted and keeps its
/// stored value; `Some` sets it. Supplying an empty tag list clears
/// the tags — omission and clearing are distinct.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetPinnedRequest {
    pub is_pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub note: Note,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<Note>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_request_distinguishes_omitted_from_cleared() {
        let omitted: EditNoteRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(omitted.title.as_deref(), Some("x"));
        assert!(omitted.tags.is_none());

        let cleared: EditNoteRequest = serde_json::from_str(r#"{"tags":[]}"#).unwrap();
        assert_eq!(cleared.tags, Some(vec![]));
    }

    #[test]
    fn note_serializes_with_client_field_names() {
        let note = Note {
            id: Uuid::nil(),
            title: "t".into(),
            content: "c".into(),
            tags: vec![],
            is_pinned: true,
            user_id: Uuid::nil(),
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("isPinned").is_some());
        assert!(json.get("userId").is_some());
        assert!(json.get("createdOn").is_some());
    }

    #[test]
    fn add_request_without_tags_deserializes_to_none() {
        let req: AddNoteRequest =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(req.tags.is_none());

        let req: AddNoteRequest =
            serde_json::from_str(r#"{"title":"t","content":"c","tags":["a"]}"#).unwrap();
        assert_eq!(req.tags, Some(vec!["a".into()]));
    }

    #[test]
    fn register_request_defaults_missing_fields_to_empty() {
        let req: RegisterRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(req.email, "a@b.c");
        assert!(req.full_name.is_empty());
        assert!(req.password.is_empty());
    }
}
