use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use scribe_db::{Database, models::UserRow};
use scribe_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserResponse};
use scribe_types::models::User;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Server-held signing secret. Never serialized, never logged.
    pub jwt_secret: String,
    /// Session token validity window in seconds.
    pub token_ttl_secs: i64,
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = crate::run_blocking(move || register_user(&state, req)).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = crate::run_blocking(move || login_user(&state, req)).await?;
    Ok(Json(resp))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = crate::run_blocking(move || fetch_current_user(&state.db, claims.sub)).await?;
    Ok(Json(UserResponse { user }))
}

// -- Core operations --

/// Creates an account and mints a session token for it. The password
/// is stored only as an Argon2id hash with a per-call random salt.
pub fn register_user(state: &AppStateInner, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
    if req.full_name.trim().is_empty() {
        return Err(ApiError::Validation("fullName is required".into()));
    }
    if req.email.trim().is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }

    // The UNIQUE constraint on email backs this check against races.
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict("a user with this email already exists".into()));
    }

    let password_hash = hash_password(&req.password)?;

    let user = User {
        id: Uuid::new_v4(),
        full_name: req.full_name,
        email: req.email,
        created_at: Utc::now(),
    };

    state.db.create_user(
        &user.id.to_string(),
        &user.full_name,
        &user.email,
        &password_hash,
        &user.created_at.to_rfc3339(),
    )?;

    let access_token = mint_token(&state.jwt_secret, state.token_ttl_secs, user.id, &user.email)?;
    Ok(AuthResponse { user, access_token })
}

/// Verifies credentials and mints a session token. An unknown email
/// and a wrong password produce the same failure, so a caller cannot
/// probe which addresses have accounts.
pub fn login_user(state: &AppStateInner, req: LoginRequest) -> Result<AuthResponse, ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }

    let Some(row) = state.db.get_user_by_email(&req.email)? else {
        return Err(invalid_credentials());
    };

    verify_password(&req.password, &row.password)?;

    let user = user_from_row(row)?;
    let access_token = mint_token(&state.jwt_secret, state.token_ttl_secs, user.id, &user.email)?;
    Ok(AuthResponse { user, access_token })
}

/// Re-fetches the authenticated user's current attributes. The token
/// claim alone is trusted for identity; anything fresher comes from
/// here.
pub fn fetch_current_user(db: &Database, identity: Uuid) -> Result<User, ApiError> {
    let row = db
        .get_user_by_id(&identity.to_string())?
        .ok_or_else(|| ApiError::Authentication("unknown user".into()))?;
    user_from_row(row)
}

// -- Token primitives --

pub fn mint_token(
    secret: &str,
    ttl_secs: i64,
    user_id: Uuid,
    email: &str,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (Utc::now() + chrono::Duration::seconds(ttl_secs)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token signing failed: {e}")))
}

/// Pure token verification: signature and expiry only, no store
/// access. Callers needing fresh user attributes must re-query via
/// `fetch_current_user`.
pub fn authenticate(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Authentication("invalid or expired token".into()))
}

// -- Password primitives --

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unparseable: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| invalid_credentials())
}

fn invalid_credentials() -> ApiError {
    ApiError::Authentication("invalid credentials".into())
}

fn user_from_row(row: UserRow) -> Result<User, ApiError> {
    Ok(User {
        id: row
            .id
            .parse()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {e}", row.id)))?,
        full_name: row.full_name,
        email: row.email,
        created_at: chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                ApiError::Internal(anyhow::anyhow!("corrupt timestamp '{}': {e}", row.created_at))
            })?,
    })
}
