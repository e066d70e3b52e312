//! Liquidation routes: file, list, fetch, edit, decide.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::routes::attachments::AttachmentResponse;
use crate::routes::{error_response, liquidation_error};
use crate::{AppState, middleware::AuthUser};
use tala_core::attachment::{BindingSpec, KeepInstruction, NewReceipt, ReconcilePlan};
use tala_core::liquidation::{
    ApprovalLevel, ApprovalRecord, DecisionAction, EditLiquidationInput, FileLiquidationInput,
    ItemDraft, Liquidation, LiquidationFilter, LiquidationItem, LiquidationService,
    LiquidationStatus, LiquidationSummary,
};
use tala_core::reconcile::ExpenseAmounts;
use tala_db::repositories::{CapabilityChecker, LiquidationRepository};
use tala_shared::types::{
    AttachmentId, CashAdvanceId, LiquidationId, Money, PageRequest, StoreId, TicketId, UserId,
};

/// Creates the liquidation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/liquidations", post(file_liquidation))
        .route("/liquidations", get(list_liquidations))
        .route("/liquidations/{id}", get(get_liquidation))
        .route("/liquidations/{id}", put(edit_liquidation))
        .route("/liquidations/{id}/decision", post(decide_liquidation))
}

fn service(state: &AppState) -> LiquidationService<LiquidationRepository, CapabilityChecker> {
    LiquidationService::new(
        Arc::new(LiquidationRepository::new((*state.db).clone())),
        Arc::new(CapabilityChecker::new((*state.db).clone())),
        state.storage.clone(),
    )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// One expense line in a file/edit payload.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    /// When the expense was incurred.
    pub expense_date: NaiveDate,
    /// Trip origin.
    pub from_destination: String,
    /// Trip destination.
    pub to_destination: String,
    /// Jeepney fare.
    #[serde(default)]
    pub jeep: Decimal,
    /// Bus fare.
    #[serde(default)]
    pub bus: Decimal,
    /// FX / van fare.
    #[serde(default)]
    pub fx_van: Decimal,
    /// Fuel.
    #[serde(default)]
    pub gas: Decimal,
    /// Toll fees.
    #[serde(default)]
    pub toll: Decimal,
    /// Meals.
    #[serde(default)]
    pub meals: Decimal,
    /// Lodging.
    #[serde(default)]
    pub lodging: Decimal,
    /// Everything else.
    #[serde(default)]
    pub others: Decimal,
    /// Free-form remarks.
    #[serde(default)]
    pub remarks: Option<String>,
}

impl From<ItemRequest> for ItemDraft {
    fn from(req: ItemRequest) -> Self {
        Self {
            expense_date: req.expense_date,
            from_destination: req.from_destination,
            to_destination: req.to_destination,
            amounts: ExpenseAmounts {
                jeep: Money::new(req.jeep),
                bus: Money::new(req.bus),
                fx_van: Money::new(req.fx_van),
                gas: Money::new(req.gas),
                toll: Money::new(req.toll),
                meals: Money::new(req.meals),
                lodging: Money::new(req.lodging),
                others: Money::new(req.others),
            },
            remarks: req.remarks,
        }
    }
}

/// Request body for filing a liquidation.
#[derive(Debug, Deserialize)]
pub struct FileRequest {
    /// The cash advance to reconcile.
    pub cash_advance_id: Uuid,
    /// Store the expenses were incurred for.
    pub store_id: Uuid,
    /// Related ticket, if any.
    #[serde(default)]
    pub ticket_id: Option<Uuid>,
    /// Reporting date.
    pub liquidation_date: NaiveDate,
    /// Free-form remarks.
    #[serde(default)]
    pub remarks: Option<String>,
    /// Expense lines.
    pub items: Vec<ItemRequest>,
}

/// Carry-over instruction for one existing receipt.
#[derive(Debug, Deserialize)]
pub struct KeepRequest {
    /// The receipt to carry over.
    pub attachment_id: Uuid,
    /// Its binding against the edited item set.
    pub target: BindingSpec,
}

/// A receipt uploaded ahead of the edit.
#[derive(Debug, Deserialize)]
pub struct AddReceiptRequest {
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Storage key the client uploaded to.
    pub storage_key: String,
    /// Requested binding.
    pub target: BindingSpec,
}

/// Receipt reconciliation instructions of an edit.
#[derive(Debug, Default, Deserialize)]
pub struct AttachmentPlanRequest {
    /// Receipts to carry over with new bindings.
    #[serde(default)]
    pub keep: Vec<KeepRequest>,
    /// Receipts to delete.
    #[serde(default)]
    pub remove: Vec<Uuid>,
    /// Freshly uploaded receipts to append.
    #[serde(default)]
    pub add: Vec<AddReceiptRequest>,
}

/// Request body for editing a liquidation.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    /// New reporting date.
    pub liquidation_date: NaiveDate,
    /// New remarks.
    #[serde(default)]
    pub remarks: Option<String>,
    /// Replacement expense lines.
    pub items: Vec<ItemRequest>,
    /// Receipt keep/remove/add instructions.
    #[serde(default)]
    pub attachments: AttachmentPlanRequest,
}

/// Request body for a decision.
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    /// Review level: 1 or 2.
    pub level: u8,
    /// `approve` or `reject`.
    pub action: String,
    /// Reviewer comment (required for rejections).
    #[serde(default)]
    pub comment: Option<String>,
}

/// Query parameters for the listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict to a status.
    pub status: Option<String>,
    /// Restrict to a store.
    pub store_id: Option<Uuid>,
    /// Restrict to a filing employee.
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

/// One expense line in a response.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Unique identifier.
    pub id: Uuid,
    /// When the expense was incurred.
    pub expense_date: String,
    /// Trip origin.
    pub from_destination: String,
    /// Trip destination.
    pub to_destination: String,
    /// Jeepney fare.
    pub jeep: Decimal,
    /// Bus fare.
    pub bus: Decimal,
    /// FX / van fare.
    pub fx_van: Decimal,
    /// Fuel.
    pub gas: Decimal,
    /// Toll fees.
    pub toll: Decimal,
    /// Meals.
    pub meals: Decimal,
    /// Lodging.
    pub lodging: Decimal,
    /// Everything else.
    pub others: Decimal,
    /// Line total.
    pub total: Decimal,
    /// Free-form remarks.
    pub remarks: Option<String>,
}

impl From<&LiquidationItem> for ItemResponse {
    fn from(item: &LiquidationItem) -> Self {
        Self {
            id: item.id.into_inner(),
            expense_date: item.expense_date.to_string(),
            from_destination: item.from_destination.clone(),
            to_destination: item.to_destination.clone(),
            jeep: item.amounts.jeep.amount(),
            bus: item.amounts.bus.amount(),
            fx_van: item.amounts.fx_van.amount(),
            gas: item.amounts.gas.amount(),
            toll: item.amounts.toll.amount(),
            meals: item.amounts.meals.amount(),
            lodging: item.amounts.lodging.amount(),
            others: item.amounts.others.amount(),
            total: item.total().amount(),
            remarks: item.remarks.clone(),
        }
    }
}

/// One level's decision audit in a response.
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    /// The reviewer.
    pub decided_by: Uuid,
    /// When the decision was made (ISO 8601).
    pub decided_at: String,
    /// `approve` or `reject`.
    pub action: String,
    /// Reviewer comment.
    pub comment: Option<String>,
}

impl From<&ApprovalRecord> for ApprovalResponse {
    fn from(record: &ApprovalRecord) -> Self {
        Self {
            decided_by: record.decided_by.into_inner(),
            decided_at: record.decided_at.to_rfc3339(),
            action: record.action.to_string(),
            comment: record.comment.clone(),
        }
    }
}

/// Full liquidation response.
#[derive(Debug, Serialize)]
pub struct LiquidationResponse {
    /// Unique identifier.
    pub id: Uuid,
    /// The cash advance being reconciled.
    pub cash_advance_id: Uuid,
    /// The employee who filed.
    pub employee_id: Uuid,
    /// Store the expenses were incurred for.
    pub store_id: Uuid,
    /// Related ticket, if any.
    pub ticket_id: Option<Uuid>,
    /// Reporting date.
    pub liquidation_date: String,
    /// Free-form remarks.
    pub remarks: Option<String>,
    /// Workflow status.
    pub status: String,
    /// Advance amount the split is computed against.
    pub advance_amount: Decimal,
    /// Sum of all line totals.
    pub total_amount: Decimal,
    /// Amount the employee must remit back.
    pub return_to_company: Decimal,
    /// Amount owed to the employee.
    pub reimbursement: Decimal,
    /// Level-1 decision audit.
    pub level1: Option<ApprovalResponse>,
    /// Level-2 decision audit.
    pub level2: Option<ApprovalResponse>,
    /// Expense lines.
    pub items: Vec<ItemResponse>,
    /// Receipt attachments.
    pub attachments: Vec<AttachmentResponse>,
    /// Optimistic concurrency version.
    pub version: i32,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Last mutation timestamp (ISO 8601).
    pub updated_at: String,
}

impl From<&Liquidation> for LiquidationResponse {
    fn from(liquidation: &Liquidation) -> Self {
        Self {
            id: liquidation.id.into_inner(),
            cash_advance_id: liquidation.cash_advance_id.into_inner(),
            employee_id: liquidation.employee_id.into_inner(),
            store_id: liquidation.store_id.into_inner(),
            ticket_id: liquidation.ticket_id.map(TicketId::into_inner),
            liquidation_date: liquidation.liquidation_date.to_string(),
            remarks: liquidation.remarks.clone(),
            status: liquidation.status.to_string(),
            advance_amount: liquidation.advance_amount.amount(),
            total_amount: liquidation.total_amount.amount(),
            return_to_company: liquidation.return_to_company.amount(),
            reimbursement: liquidation.reimbursement.amount(),
            level1: liquidation.level1.as_ref().map(ApprovalResponse::from),
            level2: liquidation.level2.as_ref().map(ApprovalResponse::from),
            items: liquidation.items.iter().map(ItemResponse::from).collect(),
            attachments: liquidation
                .attachments
                .iter()
                .map(AttachmentResponse::from)
                .collect(),
            version: liquidation.version,
            created_at: liquidation.created_at.to_rfc3339(),
            updated_at: liquidation.updated_at.to_rfc3339(),
        }
    }
}

/// Listing row response.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Unique identifier.
    pub id: Uuid,
    /// The cash advance being reconciled.
    pub cash_advance_id: Uuid,
    /// The employee who filed.
    pub employee_id: Uuid,
    /// Store the expenses were incurred for.
    pub store_id: Uuid,
    /// Reporting date.
    pub liquidation_date: String,
    /// Workflow status.
    pub status: String,
    /// Sum of all line totals.
    pub total_amount: Decimal,
    /// Amount the employee must remit back.
    pub return_to_company: Decimal,
    /// Amount owed to the employee.
    pub reimbursement: Decimal,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

impl From<LiquidationSummary> for SummaryResponse {
    fn from(summary: LiquidationSummary) -> Self {
        Self {
            id: summary.id.into_inner(),
            cash_advance_id: summary.cash_advance_id.into_inner(),
            employee_id: summary.employee_id.into_inner(),
            store_id: summary.store_id.into_inner(),
            liquidation_date: summary.liquidation_date.to_string(),
            status: summary.status.to_string(),
            total_amount: summary.total_amount.amount(),
            return_to_company: summary.return_to_company.amount(),
            reimbursement: summary.reimbursement.amount(),
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/liquidations`
async fn file_liquidation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<FileRequest>,
) -> impl IntoResponse {
    let input = FileLiquidationInput {
        cash_advance_id: CashAdvanceId::from_uuid(payload.cash_advance_id),
        store_id: StoreId::from_uuid(payload.store_id),
        ticket_id: payload.ticket_id.map(TicketId::from_uuid),
        liquidation_date: payload.liquidation_date,
        remarks: payload.remarks,
        items: payload.items.into_iter().map(ItemDraft::from).collect(),
    };

    let actor = UserId::from_uuid(auth.user_id());
    match service(&state).file(actor, input).await {
        Ok(liquidation) => {
            info!(
                liquidation_id = %liquidation.id,
                cash_advance_id = %liquidation.cash_advance_id,
                total = %liquidation.total_amount,
                "liquidation filed"
            );
            (StatusCode::CREATED, Json(LiquidationResponse::from(&liquidation))).into_response()
        }
        Err(e) => liquidation_error(&e),
    }
}

/// GET `/liquidations`
async fn list_liquidations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => match LiquidationStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return error_response(400, "VALIDATION_ERROR", "unknown status filter");
            }
        },
    };

    let filter = LiquidationFilter {
        status,
        store_id: query.store_id.map(StoreId::from_uuid),
        employee_id: query.employee_id.map(UserId::from_uuid),
    };

    let actor = UserId::from_uuid(auth.user_id());
    match service(&state).list(actor, filter, query.page_request()).await {
        Ok(page) => {
            let body = page.map(SummaryResponse::from);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => liquidation_error(&e),
    }
}

/// GET `/liquidations/{id}`
async fn get_liquidation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = UserId::from_uuid(auth.user_id());
    match service(&state)
        .get(actor, LiquidationId::from_uuid(id))
        .await
    {
        Ok(liquidation) => {
            (StatusCode::OK, Json(LiquidationResponse::from(&liquidation))).into_response()
        }
        Err(e) => liquidation_error(&e),
    }
}

/// PUT `/liquidations/{id}`
async fn edit_liquidation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditRequest>,
) -> impl IntoResponse {
    // Fresh receipts were uploaded against the configured store; without
    // one there is nothing for `add` to reference.
    if !payload.attachments.add.is_empty() && state.storage.is_none() {
        return error_response(503, "STORAGE_NOT_CONFIGURED", "File storage is not configured");
    }

    let actor = UserId::from_uuid(auth.user_id());
    let plan = ReconcilePlan {
        keep: payload
            .attachments
            .keep
            .into_iter()
            .map(|keep| KeepInstruction {
                attachment_id: AttachmentId::from_uuid(keep.attachment_id),
                target: keep.target,
            })
            .collect(),
        remove: payload
            .attachments
            .remove
            .into_iter()
            .map(AttachmentId::from_uuid)
            .collect(),
        add: payload
            .attachments
            .add
            .into_iter()
            .map(|add| NewReceipt {
                file_name: add.file_name,
                file_type: add.file_type,
                file_size: add.file_size,
                storage_provider: state
                    .storage
                    .as_ref()
                    .map_or_else(String::new, |s| s.provider_name().to_string()),
                storage_bucket: state
                    .storage
                    .as_ref()
                    .map_or_else(String::new, |s| s.bucket().to_string()),
                storage_key: add.storage_key,
                uploaded_by: actor,
                target: add.target,
            })
            .collect(),
    };

    let input = EditLiquidationInput {
        liquidation_date: payload.liquidation_date,
        remarks: payload.remarks,
        items: payload.items.into_iter().map(ItemDraft::from).collect(),
        attachments: plan,
    };

    match service(&state)
        .edit(actor, LiquidationId::from_uuid(id), input)
        .await
    {
        Ok(liquidation) => {
            info!(liquidation_id = %liquidation.id, version = liquidation.version, "liquidation edited");
            (StatusCode::OK, Json(LiquidationResponse::from(&liquidation))).into_response()
        }
        Err(e) => liquidation_error(&e),
    }
}

/// POST `/liquidations/{id}/decision`
async fn decide_liquidation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideRequest>,
) -> impl IntoResponse {
    let Some(level) = ApprovalLevel::from_number(payload.level) else {
        return error_response(400, "VALIDATION_ERROR", "level must be 1 or 2");
    };
    let Some(action) = DecisionAction::parse(&payload.action) else {
        return error_response(400, "VALIDATION_ERROR", "action must be approve or reject");
    };

    let actor = UserId::from_uuid(auth.user_id());
    match service(&state)
        .decide(actor, LiquidationId::from_uuid(id), level, action, payload.comment)
        .await
    {
        Ok(liquidation) => {
            info!(
                liquidation_id = %liquidation.id,
                status = %liquidation.status,
                level = level.number(),
                action = %action,
                "liquidation decided"
            );
            (StatusCode::OK, Json(LiquidationResponse::from(&liquidation))).into_response()
        }
        Err(e) => liquidation_error(&e),
    }
}
