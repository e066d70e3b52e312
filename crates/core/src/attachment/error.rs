//! Attachment error types.

use thiserror::Error;

use tala_shared::types::{AttachmentId, LiquidationId, LiquidationItemId};

use crate::storage::StorageError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Attachment does not exist or does not belong to this liquidation.
    #[error("attachment not found: {0}")]
    NotFound(AttachmentId),

    /// Liquidation not found.
    #[error("liquidation not found: {0}")]
    LiquidationNotFound(LiquidationId),

    /// Binding references an expense line outside the current item set.
    #[error("invalid binding: item {item_id} is not part of this liquidation")]
    InvalidBinding {
        /// The item that was referenced.
        item_id: LiquidationItemId,
    },

    /// Binding references an expense line index outside the edited item set.
    #[error("invalid binding: no expense line at index {index}")]
    InvalidItemIndex {
        /// The out-of-range index.
        index: usize,
    },

    /// An item-level receipt would be orphaned by an item-set replacement.
    ///
    /// The caller must either re-bind the receipt to a row of the new item
    /// set or list it for removal; the ledger never drops files silently.
    #[error("attachment {attachment_id} is bound to removed item {item_id} and was neither re-bound nor removed")]
    DanglingAttachment {
        /// The orphaned attachment.
        attachment_id: AttachmentId,
        /// The item it was bound to.
        item_id: LiquidationItemId,
    },

    /// Upload not verified: the object is missing from storage.
    #[error("upload not verified: object not found in storage")]
    UploadNotVerified,

    /// File size mismatch between the confirmation and the stored object.
    #[error("file size mismatch: expected {expected}, got {actual}")]
    FileSizeMismatch {
        /// Size the client declared.
        expected: u64,
        /// Size the store reports.
        actual: u64,
    },

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::LiquidationNotFound(_) => 404,
            Self::InvalidBinding { .. }
            | Self::InvalidItemIndex { .. }
            | Self::DanglingAttachment { .. } => 422,
            Self::UploadNotVerified | Self::FileSizeMismatch { .. } => 400,
            Self::Storage(_) | Self::Repository(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ATTACHMENT_NOT_FOUND",
            Self::LiquidationNotFound(_) => "LIQUIDATION_NOT_FOUND",
            Self::InvalidBinding { .. } | Self::InvalidItemIndex { .. } => "INVALID_BINDING",
            Self::DanglingAttachment { .. } => "DANGLING_ATTACHMENT",
            Self::UploadNotVerified => "UPLOAD_NOT_VERIFIED",
            Self::FileSizeMismatch { .. } => "FILE_SIZE_MISMATCH",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AttachmentError::NotFound(AttachmentId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "ATTACHMENT_NOT_FOUND");
    }

    #[test]
    fn test_binding_errors_map_to_422() {
        let err = AttachmentError::InvalidBinding {
            item_id: LiquidationItemId::new(),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INVALID_BINDING");

        let err = AttachmentError::DanglingAttachment {
            attachment_id: AttachmentId::new(),
            item_id: LiquidationItemId::new(),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "DANGLING_ATTACHMENT");
    }

    #[test]
    fn test_upload_errors_map_to_400() {
        assert_eq!(AttachmentError::UploadNotVerified.status_code(), 400);
        assert_eq!(
            AttachmentError::FileSizeMismatch {
                expected: 100,
                actual: 90
            }
            .status_code(),
            400
        );
    }
}
