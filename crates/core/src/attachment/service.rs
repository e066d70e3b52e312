//! Receipt upload service.
//!
//! Orchestrates the upload lifecycle against object storage. The ordering
//! invariant is upload-then-record: an attachment row is committed only
//! after the store confirms the object exists.

use std::sync::Arc;

use tala_shared::types::{AttachmentId, LiquidationId, LiquidationItemId};

use super::error::AttachmentError;
use super::ledger::AttachmentLedger;
use super::types::{
    Attachment, AttachmentBinding, ConfirmReceiptUpload, NewAttachmentRecord, ReceiptUploadSlot,
    RequestReceiptUpload,
};
use crate::storage::{PresignedUrl, ReceiptLocation, ReceiptStore};

/// Repository trait for attachment persistence.
///
/// Implemented by the db crate to provide actual database operations.
pub trait AttachmentRepository: Send + Sync {
    /// Create a new attachment record.
    fn create(
        &self,
        record: NewAttachmentRecord,
    ) -> impl std::future::Future<Output = Result<Attachment, AttachmentError>> + Send;

    /// Find an attachment by ID.
    fn find_by_id(
        &self,
        id: AttachmentId,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;

    /// List all attachments of a liquidation (general and item-level).
    fn list_by_liquidation(
        &self,
        liquidation_id: LiquidationId,
    ) -> impl std::future::Future<Output = Result<Vec<Attachment>, AttachmentError>> + Send;

    /// Delete an attachment record.
    fn delete(
        &self,
        id: AttachmentId,
    ) -> impl std::future::Future<Output = Result<bool, AttachmentError>> + Send;

    /// Check that a liquidation exists.
    fn liquidation_exists(
        &self,
        liquidation_id: LiquidationId,
    ) -> impl std::future::Future<Output = Result<bool, AttachmentError>> + Send;

    /// The ids of the liquidation's current expense lines.
    fn item_ids(
        &self,
        liquidation_id: LiquidationId,
    ) -> impl std::future::Future<Output = Result<Vec<LiquidationItemId>, AttachmentError>> + Send;
}

/// Service for managing receipt attachments.
pub struct ReceiptService<R: AttachmentRepository> {
    store: Arc<ReceiptStore>,
    repo: Arc<R>,
}

impl<R: AttachmentRepository> ReceiptService<R> {
    /// Create a new receipt service.
    #[must_use]
    pub fn new(store: Arc<ReceiptStore>, repo: Arc<R>) -> Self {
        Self { store, repo }
    }

    /// Request an upload URL for a new receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The liquidation does not exist
    /// - The requested item binding is invalid
    /// - The file violates size/MIME constraints
    /// - Presigning fails
    pub async fn request_upload(
        &self,
        input: RequestReceiptUpload,
    ) -> Result<ReceiptUploadSlot, AttachmentError> {
        if !self.repo.liquidation_exists(input.liquidation_id).await? {
            return Err(AttachmentError::LiquidationNotFound(input.liquidation_id));
        }

        if let Some(item_id) = input.item_id {
            let items = self.repo.item_ids(input.liquidation_id).await?;
            AttachmentLedger::bind_to_item(item_id, &items)?;
        }

        let attachment_id = AttachmentId::new();
        let location = ReceiptLocation {
            liquidation_id: input.liquidation_id,
            attachment_id,
            file_name: input.file_name.clone(),
        };

        let presigned = self
            .store
            .presign_upload(&location, &input.content_type, input.file_size)
            .await?;

        let storage_key = ReceiptStore::receipt_key(&location);

        Ok(ReceiptUploadSlot {
            attachment_id,
            upload_url: presigned.url,
            upload_method: presigned.method,
            upload_headers: presigned.headers,
            expires_at: presigned.expires_at,
            storage_key,
        })
    }

    /// Confirm an upload and create the attachment record.
    ///
    /// Verifies the object exists in storage before committing metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The object is missing from storage (`UploadNotVerified`)
    /// - The stored size differs from the declared size
    /// - The item binding is invalid
    /// - The database operation fails
    pub async fn confirm_upload(
        &self,
        input: ConfirmReceiptUpload,
    ) -> Result<Attachment, AttachmentError> {
        let binding = match input.item_id {
            Some(item_id) => {
                let items = self.repo.item_ids(input.liquidation_id).await?;
                AttachmentLedger::bind_to_item(item_id, &items)?;
                AttachmentBinding::ItemLevel { item_id }
            }
            None => AttachmentBinding::General {
                liquidation_id: input.liquidation_id,
            },
        };

        let stat = self
            .store
            .stat(&input.storage_key)
            .await
            .map_err(|_| AttachmentError::UploadNotVerified)?;

        let expected_size = u64::try_from(input.file_size).unwrap_or(0);
        if stat.file_size != expected_size {
            return Err(AttachmentError::FileSizeMismatch {
                expected: expected_size,
                actual: stat.file_size,
            });
        }

        let record = NewAttachmentRecord {
            id: input.attachment_id,
            binding,
            file_name: input.file_name,
            file_type: input.content_type,
            file_size: input.file_size,
            storage_provider: self.store.provider_name().to_string(),
            storage_bucket: self.store.bucket().to_string(),
            storage_key: input.storage_key,
            uploaded_by: input.uploaded_by,
        };

        self.repo.create(record).await
    }

    /// Get a presigned download URL for a receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment is not found or presigning fails.
    pub async fn download_url(
        &self,
        attachment_id: AttachmentId,
    ) -> Result<PresignedUrl, AttachmentError> {
        let attachment = self
            .repo
            .find_by_id(attachment_id)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))?;

        Ok(self.store.presign_download(&attachment.storage_key).await?)
    }

    /// Delete a receipt: object first, then the metadata row.
    ///
    /// A missing object is tolerated so that a retried delete converges.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment is not found or the row delete
    /// fails.
    pub async fn delete(&self, attachment_id: AttachmentId) -> Result<(), AttachmentError> {
        let attachment = self
            .repo
            .find_by_id(attachment_id)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))?;

        let _ = self.store.delete(&attachment.storage_key).await;

        self.repo.delete(attachment_id).await?;

        Ok(())
    }

    /// List all receipts of a liquidation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_by_liquidation(
        &self,
        liquidation_id: LiquidationId,
    ) -> Result<Vec<Attachment>, AttachmentError> {
        self.repo.list_by_liquidation(liquidation_id).await
    }

    /// Get an attachment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if not found or the database operation fails.
    pub async fn get_by_id(
        &self,
        attachment_id: AttachmentId,
    ) -> Result<Attachment, AttachmentError> {
        self.repo
            .find_by_id(attachment_id)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))
    }
}
