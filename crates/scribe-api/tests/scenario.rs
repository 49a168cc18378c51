//! End-to-end walk through the core operations, the way a client
//! session would drive them.

use std::sync::Arc;

use scribe_api::auth::{self, AppState, AppStateInner};
use scribe_api::error::ApiError;
use scribe_api::notes;
use scribe_db::Database;
use scribe_types::api::{AddNoteRequest, LoginRequest, RegisterRequest};

fn test_state() -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
        token_ttl_secs: 3600,
    })
}

#[test]
fn full_session() {
    let state = test_state();

    // Register and log in
    auth::register_user(
        &state,
        RegisterRequest {
            full_name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "secret123".into(),
        },
    )
    .unwrap();

    let session = auth::login_user(
        &state,
        LoginRequest {
            email: "alice@example.com".into(),
            password: "secret123".into(),
        },
    )
    .unwrap();

    // Every subsequent call acts as the identity the token asserts
    let identity = auth::authenticate(&session.access_token, &state.jwt_secret)
        .unwrap()
        .sub;
    assert_eq!(identity, session.user.id);

    // Add a note; defaults apply
    let note = notes::add_note(
        &state.db,
        identity,
        AddNoteRequest {
            title: "Groceries".into(),
            content: "milk, eggs".into(),
            tags: None,
        },
    )
    .unwrap();
    assert!(!note.is_pinned);
    assert!(note.tags.is_empty());
    assert_eq!(note.user_id, identity);

    // Pin it; it moves to the front of the list
    notes::set_pinned(&state.db, identity, note.id, true).unwrap();
    let listed = notes::list_notes(&state.db, identity).unwrap();
    assert_eq!(listed[0].id, note.id);
    assert!(listed[0].is_pinned);

    // Search hits and misses
    let hits = notes::search_notes(&state.db, identity, "milk").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, note.id);
    assert!(notes::search_notes(&state.db, identity, "bread").unwrap().is_empty());

    // Delete is permanent; a repeat attempt reports not-found
    notes::delete_note(&state.db, identity, note.id).unwrap();
    let err = notes::delete_note(&state.db, identity, note.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(notes::list_notes(&state.db, identity).unwrap().is_empty());
}
