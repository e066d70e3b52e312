//! Attachment types and data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tala_shared::types::{AttachmentId, LiquidationId, LiquidationItemId, UserId};

/// What a receipt is bound to.
///
/// A receipt either supports the liquidation as a whole or one specific
/// expense line. The two cases are a discriminated pair, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentBinding {
    /// Bound to the liquidation header.
    General {
        /// The owning liquidation.
        liquidation_id: LiquidationId,
    },
    /// Bound to one expense line.
    ItemLevel {
        /// The expense line the receipt supports.
        item_id: LiquidationItemId,
    },
}

impl AttachmentBinding {
    /// The bound item, if this is an item-level binding.
    #[must_use]
    pub const fn item_id(&self) -> Option<LiquidationItemId> {
        match self {
            Self::General { .. } => None,
            Self::ItemLevel { item_id } => Some(*item_id),
        }
    }

    /// Returns true for item-level bindings.
    #[must_use]
    pub const fn is_item_level(&self) -> bool {
        matches!(self, Self::ItemLevel { .. })
    }
}

/// Receipt attachment metadata.
///
/// The bytes live in object storage; this is the row the core owns.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Unique identifier.
    pub id: AttachmentId,
    /// What the receipt is bound to.
    pub binding: AttachmentBinding,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Storage provider name.
    pub storage_provider: String,
    /// Storage bucket/container.
    pub storage_bucket: String,
    /// Storage key.
    pub storage_key: String,
    /// User who uploaded the receipt.
    pub uploaded_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Binding requested for a receipt in an edit payload.
///
/// Edited item sets are replaced wholesale and get fresh ids, so edit
/// payloads address expense lines by their position in the new set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingSpec {
    /// Bind to the liquidation header.
    General,
    /// Bind to the expense line at this index of the new item set.
    Item {
        /// Zero-based row index.
        index: usize,
    },
}

/// Instruction to carry an existing receipt across an edit.
#[derive(Debug, Clone)]
pub struct KeepInstruction {
    /// The receipt to carry over.
    pub attachment_id: AttachmentId,
    /// Its binding against the new item set.
    pub target: BindingSpec,
}

/// A receipt uploaded during an edit, to be recorded with the new item set.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Storage provider name.
    pub storage_provider: String,
    /// Storage bucket/container.
    pub storage_bucket: String,
    /// Storage key the client uploaded to.
    pub storage_key: String,
    /// User who uploaded the receipt.
    pub uploaded_by: UserId,
    /// Requested binding.
    pub target: BindingSpec,
}

/// The keep/remove/add reconciliation requested by an edit.
///
/// Receipts not mentioned anywhere are left untouched (their item binding
/// permitting); receipts in `remove` are deleted; `keep` re-binds receipts
/// against the replacement item set; `add` appends freshly uploaded ones.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Existing receipts to carry over, with their new bindings.
    pub keep: Vec<KeepInstruction>,
    /// Existing receipts to delete.
    pub remove: Vec<AttachmentId>,
    /// Freshly uploaded receipts to append.
    pub add: Vec<NewReceipt>,
}

impl ReconcilePlan {
    /// A plan that touches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Input for requesting a receipt upload URL.
#[derive(Debug, Clone)]
pub struct RequestReceiptUpload {
    /// Liquidation the receipt belongs to.
    pub liquidation_id: LiquidationId,
    /// Expense line to bind to; `None` binds to the liquidation header.
    pub item_id: Option<LiquidationItemId>,
    /// Original filename.
    pub file_name: String,
    /// MIME type of the file.
    pub content_type: String,
    /// File size in bytes.
    pub file_size: u64,
    /// User requesting the upload.
    pub user_id: UserId,
}

/// Result of requesting a receipt upload URL.
#[derive(Debug, Clone)]
pub struct ReceiptUploadSlot {
    /// Generated attachment ID.
    pub attachment_id: AttachmentId,
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub upload_method: String,
    /// Required headers for the upload.
    pub upload_headers: std::collections::HashMap<String, String>,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Storage key for the confirmation call.
    pub storage_key: String,
}

/// Input for confirming a receipt upload.
#[derive(Debug, Clone)]
pub struct ConfirmReceiptUpload {
    /// Attachment ID from the upload request.
    pub attachment_id: AttachmentId,
    /// Liquidation the receipt belongs to.
    pub liquidation_id: LiquidationId,
    /// Expense line to bind to; `None` binds to the liquidation header.
    pub item_id: Option<LiquidationItemId>,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File size in bytes as declared by the client.
    pub file_size: i64,
    /// Storage key from the upload request.
    pub storage_key: String,
    /// User who uploaded.
    pub uploaded_by: UserId,
}

/// Input for creating an attachment record.
#[derive(Debug, Clone)]
pub struct NewAttachmentRecord {
    /// Attachment ID.
    pub id: AttachmentId,
    /// What the receipt is bound to.
    pub binding: AttachmentBinding,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Storage provider name.
    pub storage_provider: String,
    /// Storage bucket/container.
    pub storage_bucket: String,
    /// Storage key.
    pub storage_key: String,
    /// User who uploaded.
    pub uploaded_by: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_item_id() {
        let item = LiquidationItemId::new();
        assert_eq!(
            AttachmentBinding::ItemLevel { item_id: item }.item_id(),
            Some(item)
        );
        assert_eq!(
            AttachmentBinding::General {
                liquidation_id: LiquidationId::new()
            }
            .item_id(),
            None
        );
    }

    #[test]
    fn test_binding_serde_is_tagged() {
        let binding = AttachmentBinding::General {
            liquidation_id: LiquidationId::new(),
        };
        let json = serde_json::to_value(&binding).unwrap();
        assert_eq!(json["kind"], "general");

        let binding = AttachmentBinding::ItemLevel {
            item_id: LiquidationItemId::new(),
        };
        let json = serde_json::to_value(&binding).unwrap();
        assert_eq!(json["kind"], "item_level");
    }

    #[test]
    fn test_empty_plan() {
        let plan = ReconcilePlan::empty();
        assert!(plan.keep.is_empty());
        assert!(plan.remove.is_empty());
        assert!(plan.add.is_empty());
    }
}
