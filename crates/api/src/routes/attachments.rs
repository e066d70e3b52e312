//! Receipt attachment routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::routes::{attachment_error, error_response, liquidation_error};
use crate::{AppState, middleware::AuthUser};
use tala_core::attachment::{
    Attachment, AttachmentBinding, ConfirmReceiptUpload, ReceiptService, RequestReceiptUpload,
};
use tala_core::liquidation::service::LiquidationRepository as _;
use tala_core::liquidation::{Capability, PermissionChecker as _};
use tala_db::repositories::{
    AttachmentRepository, CapabilityChecker, LiquidationRepository,
};
use tala_shared::types::{AttachmentId, LiquidationId, LiquidationItemId, UserId};

/// Creates the attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/liquidations/{liquidation_id}/attachments/upload",
            post(request_upload),
        )
        .route(
            "/liquidations/{liquidation_id}/attachments",
            post(confirm_upload),
        )
        .route(
            "/liquidations/{liquidation_id}/attachments",
            get(list_attachments),
        )
        .route("/attachments/{attachment_id}", get(get_attachment))
        .route("/attachments/{attachment_id}", delete(delete_attachment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for requesting an upload URL.
#[derive(Debug, Deserialize)]
pub struct RequestUploadRequest {
    /// Original filename.
    pub file_name: String,
    /// MIME type of the file.
    pub content_type: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Expense line to bind to; omit for a general receipt.
    #[serde(default)]
    pub item_id: Option<Uuid>,
}

/// Response for an upload URL request.
#[derive(Debug, Serialize)]
pub struct RequestUploadResponse {
    /// Generated attachment ID.
    pub attachment_id: Uuid,
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub upload_method: String,
    /// Required headers for the upload.
    pub upload_headers: std::collections::HashMap<String, String>,
    /// When the URL expires (ISO 8601).
    pub expires_at: String,
    /// Storage key for the confirmation call.
    pub storage_key: String,
}

/// Request body for confirming an upload.
#[derive(Debug, Deserialize)]
pub struct ConfirmUploadRequest {
    /// Attachment ID from the upload request.
    pub attachment_id: Uuid,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Storage key from the upload request.
    pub storage_key: String,
    /// Expense line to bind to; omit for a general receipt.
    #[serde(default)]
    pub item_id: Option<Uuid>,
}

/// Response for a receipt attachment.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// Attachment ID.
    pub id: Uuid,
    /// Binding kind: `general` or `item_level`.
    pub binding: String,
    /// Bound expense line for item-level receipts.
    pub item_id: Option<Uuid>,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Uploaded by user ID.
    pub uploaded_by: Uuid,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
    /// Presigned download URL, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl From<&Attachment> for AttachmentResponse {
    fn from(attachment: &Attachment) -> Self {
        let (binding, item_id) = match attachment.binding {
            AttachmentBinding::General { .. } => ("general", None),
            AttachmentBinding::ItemLevel { item_id } => {
                ("item_level", Some(item_id.into_inner()))
            }
        };

        Self {
            id: attachment.id.into_inner(),
            binding: binding.to_string(),
            item_id,
            file_name: attachment.file_name.clone(),
            file_type: attachment.file_type.clone(),
            file_size: attachment.file_size,
            uploaded_by: attachment.uploaded_by.into_inner(),
            created_at: attachment.created_at.to_rfc3339(),
            download_url: None,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn receipt_service(
    state: &AppState,
) -> Result<ReceiptService<AttachmentRepository>, Response> {
    let Some(storage) = &state.storage else {
        return Err(error_response(
            503,
            "STORAGE_NOT_CONFIGURED",
            "File storage is not configured",
        ));
    };

    let repo = Arc::new(AttachmentRepository::new((*state.db).clone()));
    Ok(ReceiptService::new(Arc::clone(storage), repo))
}

/// Receipts can only be touched by the filing employee or a privileged
/// actor, and only while their liquidation is still editable.
async fn check_can_modify(
    state: &AppState,
    actor: UserId,
    liquidation_id: LiquidationId,
) -> Result<(), Response> {
    let repo = LiquidationRepository::new((*state.db).clone());
    let liquidation = match repo.fetch(liquidation_id).await {
        Ok(Some(liquidation)) => liquidation,
        Ok(None) => {
            return Err(error_response(
                404,
                "LIQUIDATION_NOT_FOUND",
                "Liquidation not found",
            ));
        }
        Err(e) => return Err(liquidation_error(&e)),
    };

    if !liquidation.is_owned_by(actor) {
        let permissions = CapabilityChecker::new((*state.db).clone());
        match permissions
            .has_capability(actor, Capability::ManageLiquidation)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return Err(error_response(
                    403,
                    "FORBIDDEN",
                    "Not your liquidation",
                ));
            }
            Err(e) => return Err(liquidation_error(&e)),
        }
    }

    if !liquidation.status.is_editable() {
        return Err(error_response(
            422,
            "INVALID_STATE",
            "Receipts can only change while the liquidation is pending",
        ));
    }

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/liquidations/{liquidation_id}/attachments/upload`
///
/// Request a presigned upload URL for a receipt.
async fn request_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(liquidation_id): Path<Uuid>,
    Json(payload): Json<RequestUploadRequest>,
) -> impl IntoResponse {
    let actor = UserId::from_uuid(auth.user_id());
    let liquidation_id = LiquidationId::from_uuid(liquidation_id);

    if let Err(response) = check_can_modify(&state, actor, liquidation_id).await {
        return response;
    }

    let svc = match receipt_service(&state) {
        Ok(svc) => svc,
        Err(response) => return response,
    };

    let input = RequestReceiptUpload {
        liquidation_id,
        item_id: payload.item_id.map(LiquidationItemId::from_uuid),
        file_name: payload.file_name,
        content_type: payload.content_type,
        file_size: payload.file_size,
        user_id: actor,
    };

    match svc.request_upload(input).await {
        Ok(slot) => {
            info!(
                liquidation_id = %liquidation_id,
                attachment_id = %slot.attachment_id,
                "receipt upload URL issued"
            );

            let response = RequestUploadResponse {
                attachment_id: slot.attachment_id.into_inner(),
                upload_url: slot.upload_url,
                upload_method: slot.upload_method,
                upload_headers: slot.upload_headers,
                expires_at: slot.expires_at.to_rfc3339(),
                storage_key: slot.storage_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => attachment_error(&e),
    }
}

/// POST `/liquidations/{liquidation_id}/attachments`
///
/// Confirm an upload and record the receipt.
async fn confirm_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(liquidation_id): Path<Uuid>,
    Json(payload): Json<ConfirmUploadRequest>,
) -> impl IntoResponse {
    let actor = UserId::from_uuid(auth.user_id());
    let liquidation_id = LiquidationId::from_uuid(liquidation_id);

    if let Err(response) = check_can_modify(&state, actor, liquidation_id).await {
        return response;
    }

    let svc = match receipt_service(&state) {
        Ok(svc) => svc,
        Err(response) => return response,
    };

    let input = ConfirmReceiptUpload {
        attachment_id: AttachmentId::from_uuid(payload.attachment_id),
        liquidation_id,
        item_id: payload.item_id.map(LiquidationItemId::from_uuid),
        file_name: payload.file_name,
        content_type: payload.content_type,
        file_size: payload.file_size,
        storage_key: payload.storage_key,
        uploaded_by: actor,
    };

    match svc.confirm_upload(input).await {
        Ok(attachment) => {
            info!(
                liquidation_id = %liquidation_id,
                attachment_id = %attachment.id,
                "receipt recorded"
            );
            (StatusCode::CREATED, Json(AttachmentResponse::from(&attachment))).into_response()
        }
        Err(e) => attachment_error(&e),
    }
}

/// GET `/liquidations/{liquidation_id}/attachments`
async fn list_attachments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(liquidation_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = Arc::new(AttachmentRepository::new((*state.db).clone()));
    let liquidation_id = LiquidationId::from_uuid(liquidation_id);

    use tala_core::attachment::AttachmentRepository as _;
    match repo.list_by_liquidation(liquidation_id).await {
        Ok(attachments) => {
            let body: Vec<AttachmentResponse> =
                attachments.iter().map(AttachmentResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => attachment_error(&e),
    }
}

/// GET `/attachments/{attachment_id}`
///
/// Attachment metadata plus a presigned download URL.
async fn get_attachment(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(attachment_id): Path<Uuid>,
) -> impl IntoResponse {
    let svc = match receipt_service(&state) {
        Ok(svc) => svc,
        Err(response) => return response,
    };
    let attachment_id = AttachmentId::from_uuid(attachment_id);

    let attachment = match svc.get_by_id(attachment_id).await {
        Ok(attachment) => attachment,
        Err(e) => return attachment_error(&e),
    };

    let mut response = AttachmentResponse::from(&attachment);
    match svc.download_url(attachment_id).await {
        Ok(presigned) => response.download_url = Some(presigned.url),
        Err(e) => return attachment_error(&e),
    }

    (StatusCode::OK, Json(response)).into_response()
}

/// DELETE `/attachments/{attachment_id}`
async fn delete_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(attachment_id): Path<Uuid>,
) -> impl IntoResponse {
    let svc = match receipt_service(&state) {
        Ok(svc) => svc,
        Err(response) => return response,
    };
    let actor = UserId::from_uuid(auth.user_id());
    let attachment_id = AttachmentId::from_uuid(attachment_id);

    // Resolve the owning liquidation to enforce the modification rules.
    let attachment = match svc.get_by_id(attachment_id).await {
        Ok(attachment) => attachment,
        Err(e) => return attachment_error(&e),
    };
    let liquidation_id = match attachment.binding {
        AttachmentBinding::General { liquidation_id } => liquidation_id,
        AttachmentBinding::ItemLevel { item_id } => {
            match owning_liquidation_of_item(&state.db, item_id).await {
                Ok(id) => id,
                Err(response) => return response,
            }
        }
    };

    if let Err(response) = check_can_modify(&state, actor, liquidation_id).await {
        return response;
    }

    match svc.delete(attachment_id).await {
        Ok(()) => {
            info!(attachment_id = %attachment_id, "receipt deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => attachment_error(&e),
    }
}

/// Find the liquidation an expense line belongs to.
async fn owning_liquidation_of_item(
    db: &sea_orm::DatabaseConnection,
    item_id: LiquidationItemId,
) -> Result<LiquidationId, Response> {
    use sea_orm::EntityTrait;
    use tala_db::entities::liquidation_items;

    match liquidation_items::Entity::find_by_id(item_id.into_inner())
        .one(db)
        .await
    {
        Ok(Some(item)) => Ok(LiquidationId::from_uuid(item.liquidation_id)),
        Ok(None) => Err(error_response(
            404,
            "LIQUIDATION_NOT_FOUND",
            "Liquidation not found",
        )),
        Err(e) => Err(error_response(500, "DATABASE_ERROR", &e.to_string())),
    }
}
