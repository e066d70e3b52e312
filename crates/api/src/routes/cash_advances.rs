//! Cash advance routes (read-only surface).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::{error_response, liquidation_error};
use tala_core::liquidation::CashAdvance;
use tala_db::repositories::CashAdvanceRepository;
use tala_shared::types::{CashAdvanceId, PageRequest, UserId};

/// Creates the cash advance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cash-advances", get(list_cash_advances))
        .route("/cash-advances/{id}", get(get_cash_advance))
}

/// Query parameters for the listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict to one employee (admins/reviewers only in practice; others
    /// are scoped to themselves regardless).
    pub employee_id: Option<Uuid>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 25, max: 100).
    pub per_page: Option<u32>,
}

impl ListQuery {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Response body for a cash advance.
#[derive(Debug, Serialize)]
pub struct CashAdvanceResponse {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee the advance was issued to.
    pub employee_id: Uuid,
    /// Advance amount in pesos.
    pub amount: Decimal,
    /// Status.
    pub status: String,
    /// Classification.
    pub advance_type: String,
    /// What the advance was issued for.
    pub purpose: String,
    /// When the advance was issued.
    pub advance_date: String,
}

impl From<CashAdvance> for CashAdvanceResponse {
    fn from(advance: CashAdvance) -> Self {
        Self {
            id: advance.id.into_inner(),
            employee_id: advance.employee_id.into_inner(),
            amount: advance.amount.amount(),
            status: advance.status.to_string(),
            advance_type: advance.advance_type.to_string(),
            purpose: advance.purpose,
            advance_date: advance.advance_date.to_string(),
        }
    }
}

/// GET `/cash-advances`
async fn list_cash_advances(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let repo = CashAdvanceRepository::new((*state.db).clone());

    // Plain employees only ever see their own advances.
    let employee_filter = if auth.role() == "employee" {
        Some(UserId::from_uuid(auth.user_id()))
    } else {
        query.employee_id.map(UserId::from_uuid)
    };

    let page = query.page_request();
    match repo.list(employee_filter, &page).await {
        Ok((advances, total)) => {
            let data: Vec<CashAdvanceResponse> =
                advances.into_iter().map(CashAdvanceResponse::from).collect();
            let body = tala_shared::types::PageResponse::new(data, &page, total);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => liquidation_error(&e),
    }
}

/// GET `/cash-advances/{id}`
async fn get_cash_advance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CashAdvanceRepository::new((*state.db).clone());

    match repo.find_by_id(CashAdvanceId::from_uuid(id)).await {
        Ok(Some(advance)) => {
            if auth.role() == "employee" && advance.employee_id.into_inner() != auth.user_id() {
                return error_response(403, "FORBIDDEN", "Not your cash advance");
            }
            (StatusCode::OK, Json(CashAdvanceResponse::from(advance))).into_response()
        }
        Ok(None) => error_response(404, "CASH_ADVANCE_NOT_FOUND", "Cash advance not found"),
        Err(e) => liquidation_error(&e),
    }
}
