//! Authentication routes: login and refresh-token rotation.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;
use crate::routes::{app_error, error_response};
use tala_core::auth::verify_password;
use tala_db::repositories::{SessionRepository, UserRepository, user::role_as_str};
use tala_shared::TokenPair;

/// Creates the auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token issued at login.
    pub refresh_token: String,
}

/// Response carrying a token pair.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        }
    }
}

/// POST `/auth/login`
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let users = UserRepository::new((*state.db).clone());

    let user = match users.find_by_email(&payload.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error_response(401, "INVALID_CREDENTIALS", "Unknown email or wrong password");
        }
        Err(e) => return app_error(&e),
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(email = %payload.email, "failed login attempt");
            return error_response(401, "INVALID_CREDENTIALS", "Unknown email or wrong password");
        }
        Err(_) => {
            return error_response(500, "INTERNAL_ERROR", "Could not verify credentials");
        }
    }

    let role = role_as_str(&user.role);
    let pair = match state.jwt_service.generate_token_pair(user.id, role) {
        Ok(pair) => pair,
        Err(_) => return error_response(500, "INTERNAL_ERROR", "Could not issue tokens"),
    };

    let sessions = SessionRepository::new((*state.db).clone());
    let expires_at = chrono::Utc::now() + chrono::Duration::days(7);
    if let Err(e) = sessions
        .create(user.id, &pair.refresh_token, None, expires_at)
        .await
    {
        return app_error(&e);
    }

    info!(user_id = %user.id, "user logged in");
    (StatusCode::OK, Json(TokenResponse::from(pair))).into_response()
}

/// POST `/auth/refresh`
///
/// Rotates the refresh token: the presented token's session is revoked and
/// a new pair is issued.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse {
    // The token itself must still be valid...
    let claims = match state.jwt_service.validate_token(&payload.refresh_token) {
        Ok(claims) => claims,
        Err(_) => return error_response(401, "INVALID_TOKEN", "Refresh token is invalid"),
    };

    // ...and backed by a live, unrevoked session.
    let sessions = SessionRepository::new((*state.db).clone());
    let session = match sessions.find_live(&payload.refresh_token).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return error_response(401, "SESSION_REVOKED", "Session is expired or revoked");
        }
        Err(e) => return app_error(&e),
    };

    let pair = match state
        .jwt_service
        .generate_token_pair(claims.user_id(), &claims.role)
    {
        Ok(pair) => pair,
        Err(_) => return error_response(500, "INTERNAL_ERROR", "Could not issue tokens"),
    };

    if let Err(e) = sessions.revoke(session.id).await {
        return app_error(&e);
    }
    let expires_at = chrono::Utc::now() + chrono::Duration::days(7);
    if let Err(e) = sessions
        .create(claims.user_id(), &pair.refresh_token, None, expires_at)
        .await
    {
        return app_error(&e);
    }

    (StatusCode::OK, Json(TokenResponse::from(pair))).into_response()
}
