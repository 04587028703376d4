use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::AdminInfo;
use crate::models::{Account, AccountStatus};

const SESSION_USER_KEY: &str = "user";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub role: crate::models::Role,
}

/// The administrator account resolved by the auth middleware, made
/// available to handlers through request extensions for display only.
#[derive(Clone)]
pub struct CurrentAdmin(pub Account);

// ============================================================================
// Middleware
// ============================================================================

/// Gate over every admin route.
///
/// Resolves the caller's username from the session, then re-resolves the
/// account against the current store snapshot on every request. A session
/// value is never trusted for role: the role can change between requests,
/// so only the freshly loaded account decides.
///
/// No session → 401. Session but no matching account, or a non-admin
/// role → 403.
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let username = session
        .get::<String>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let accounts = state.accounts().load().await?;
    let account = accounts.into_iter().find(|a| a.username == username);

    match account {
        Some(account) if account.is_admin() => {
            tracing::Span::current().record("user_id", &username);
            request.extensions_mut().insert(CurrentAdmin(account));
            Ok(next.run(request).await)
        }
        _ => Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        )),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, establishes a session on success.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let accounts = state.accounts().load().await?;
    let Some(account) = accounts.into_iter().find(|a| a.username == payload.username) else {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    let is_valid = verify_password(account.password_hash.clone(), payload.password).await?;
    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if account.status == AccountStatus::Inactive {
        return Err(ApiError::Forbidden("Account is deactivated".to_string()));
    }

    session
        .insert(SESSION_USER_KEY, &account.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!("User logged in: {}", account.username);

    Ok(Json(ApiResponse::success(LoginResponse {
        username: account.username,
        role: account.role,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Current account information (requires an authenticated session)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<AdminInfo>>, ApiError> {
    let username = session
        .get::<String>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let accounts = state.accounts().load().await?;
    let account = accounts
        .iter()
        .find(|a| a.username == username)
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(ApiResponse::success(AdminInfo::from(account))))
}

// ============================================================================
// Password helpers
// ============================================================================

/// Verify a password against a stored hash.
/// Runs on a blocking thread because Argon2 is CPU-intensive and would
/// stall the async runtime if run directly.
async fn verify_password(password_hash: String, password: String) -> Result<bool, ApiError> {
    task::spawn_blocking(move || {
        let Ok(parsed_hash) = PasswordHash::new(&password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    })
    .await
    .map_err(|e| ApiError::internal(format!("Password verification task panicked: {e}")))
}

/// Hash a password with Argon2id. Used by seeding tooling and tests;
/// account registration itself lives outside this service.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}
