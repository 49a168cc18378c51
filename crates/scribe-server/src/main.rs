use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use scribe_api::auth::{self, AppState, AppStateInner};
use scribe_api::middleware::require_auth;
use scribe_api::notes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribe=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("SCRIBE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("SCRIBE_DB_PATH").unwrap_or_else(|_| "scribe.db".into());
    let host = std::env::var("SCRIBE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SCRIBE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let token_ttl_secs: i64 = std::env::var("SCRIBE_TOKEN_TTL_SECS")
        .unwrap_or_else(|_| "3600".into())
        .parse()?;

    // Open the store once; the handle is passed through state, never
    // held as a global. Dropping it at shutdown closes the connection.
    let db = scribe_db::Database::open(&PathBuf::from(&db_path))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        token_ttl_secs,
    });

    let app = router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!("Scribe server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health))
        .route("/create-account", post(auth::register))
        .route("/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/get-user", get(auth::get_user))
        .route("/add-note", post(notes::create))
        .route("/edit-note/{note_id}", put(notes::edit))
        .route("/get-all-notes", get(notes::list))
        .route("/delete-note/{note_id}", delete(notes::remove))
        .route("/update-note-pinned/{note_id}", put(notes::pin))
        .route("/search-notes", get(notes::search))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "scribe"
    }))
}
