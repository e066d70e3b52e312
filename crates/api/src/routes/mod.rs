//! API route definitions.

use axum::{Json, Router, http::StatusCode, middleware, response::IntoResponse, response::Response};
use serde_json::json;

use crate::{AppState, middleware::auth::auth_middleware};

pub mod attachments;
pub mod auth;
pub mod cash_advances;
pub mod health;
pub mod liquidations;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(cash_advances::routes())
        .merge(liquidations::routes())
        .merge(attachments::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Map a liquidation error onto an HTTP response.
pub(crate) fn liquidation_error(err: &tala_core::liquidation::LiquidationError) -> Response {
    error_response(err.status_code(), err.error_code(), &err.to_string())
}

/// Map an attachment error onto an HTTP response.
pub(crate) fn attachment_error(err: &tala_core::attachment::AttachmentError) -> Response {
    error_response(err.status_code(), err.error_code(), &err.to_string())
}

/// Map a shared application error onto an HTTP response.
pub(crate) fn app_error(err: &tala_shared::AppError) -> Response {
    error_response(err.status_code(), err.error_code(), &err.to_string())
}

/// Build a JSON error response.
pub(crate) fn error_response(status: u16, code: &str, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}
