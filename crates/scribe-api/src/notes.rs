use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use scribe_db::{
    Database,
    models::{NoteChanges, NoteRow},
};
use scribe_types::api::{
    AddNoteRequest, Claims, EditNoteRequest, NoteResponse, NotesResponse, SetPinnedRequest,
};
use scribe_types::models::Note;

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

// -- Handlers --

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = crate::run_blocking(move || add_note(&state.db, claims.sub, req)).await?;
    Ok((StatusCode::CREATED, Json(NoteResponse { note })))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EditNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = crate::run_blocking(move || edit_note(&state.db, claims.sub, note_id, req)).await?;
    Ok(Json(NoteResponse { note }))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = crate::run_blocking(move || list_notes(&state.db, claims.sub)).await?;
    Ok(Json(NotesResponse { notes }))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    crate::run_blocking(move || delete_note(&state.db, claims.sub, note_id)).await?;
    Ok(Json(serde_json::json!({ "message": "note deleted" })))
}

pub async fn pin(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetPinnedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note =
        crate::run_blocking(move || set_pinned(&state.db, claims.sub, note_id, req.is_pinned))
            .await?;
    Ok(Json(NoteResponse { note }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let notes =
        crate::run_blocking(move || search_notes(&state.db, claims.sub, &params.query)).await?;
    Ok(Json(NotesResponse { notes }))
}

// -- Core operations --
//
// Each takes the authenticated owner as an explicit parameter; no
// operation can reach a note without it.

pub fn add_note(db: &Database, owner: Uuid, req: AddNoteRequest) -> Result<Note, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("content is required".into()));
    }

    let note = Note {
        id: Uuid::new_v4(),
        title: req.title,
        content: req.content,
        tags: req.tags.unwrap_or_default(),
        is_pinned: false,
        user_id: owner,
        created_at: Utc::now(),
    };

    db.insert_note(&NoteRow {
        id: note.id.to_string(),
        user_id: note.user_id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        tags: note.tags.clone(),
        pinned: note.is_pinned,
        created_at: note.created_at.to_rfc3339(),
    })?;

    Ok(note)
}

pub fn edit_note(
    db: &Database,
    owner: Uuid,
    note_id: Uuid,
    req: EditNoteRequest,
) -> Result<Note, ApiError> {
    if req.title.is_none() && req.content.is_none() && req.tags.is_none() {
        return Err(ApiError::Validation("no changes provided".into()));
    }
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("title cannot be empty".into()));
        }
    }
    if let Some(content) = &req.content {
        if content.trim().is_empty() {
            return Err(ApiError::Validation("content cannot be empty".into()));
        }
    }

    let changes = NoteChanges {
        title: req.title,
        content: req.content,
        tags: req.tags,
        pinned: req.is_pinned,
    };

    let row = db
        .update_note(&note_id.to_string(), &owner.to_string(), &changes)?
        .ok_or_else(note_not_found)?;
    note_from_row(row)
}

pub fn list_notes(db: &Database, owner: Uuid) -> Result<Vec<Note>, ApiError> {
    db.list_notes(&owner.to_string())?
        .into_iter()
        .map(note_from_row)
        .collect()
}

pub fn delete_note(db: &Database, owner: Uuid, note_id: Uuid) -> Result<(), ApiError> {
    if db.delete_note(&note_id.to_string(), &owner.to_string())? {
        Ok(())
    } else {
        Err(note_not_found())
    }
}

/// Sets the pinned flag to exactly the supplied value — the caller
/// computes the new state, this is not a toggle.
pub fn set_pinned(db: &Database, owner: Uuid, note_id: Uuid, pinned: bool) -> Result<Note, ApiError> {
    let changes = NoteChanges {
        pinned: Some(pinned),
        ..Default::default()
    };
    let row = db
        .update_note(&note_id.to_string(), &owner.to_string(), &changes)?
        .ok_or_else(note_not_found)?;
    note_from_row(row)
}

pub fn search_notes(db: &Database, owner: Uuid, query: &str) -> Result<Vec<Note>, ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::Validation("search query is required".into()));
    }
    db.search_notes(&owner.to_string(), query)?
        .into_iter()
        .map(note_from_row)
        .collect()
}

/// A nonexistent note and another user's note get the same answer.
fn note_not_found() -> ApiError {
    ApiError::NotFound("note not found".into())
}

fn note_from_row(row: NoteRow) -> Result<Note, ApiError> {
    Ok(Note {
        id: row
            .id
            .parse()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt note id '{}': {e}", row.id)))?,
        user_id: row.user_id.parse().map_err(|e| {
            ApiError::Internal(anyhow::anyhow!("corrupt note owner '{}': {e}", row.user_id))
        })?,
        title: row.title,
        content: row.content,
        tags: row.tags,
        is_pinned: row.pinned,
        created_at: chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                ApiError::Internal(anyhow::anyhow!("corrupt timestamp '{}': {e}", row.created_at))
            })?,
    })
}
