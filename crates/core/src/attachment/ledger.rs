//! Attachment ledger: pure reconciliation of receipt bindings.
//!
//! When a liquidation is edited its item set is replaced wholesale, so every
//! item-level receipt must be accounted for: re-bound to a row of the new
//! set, or removed. The ledger enforces that accounting and never drops a
//! file silently.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use tala_shared::types::{AttachmentId, LiquidationId, LiquidationItemId};

use super::error::AttachmentError;
use super::types::{Attachment, AttachmentBinding, BindingSpec, ReconcilePlan};

/// Result of reconciling an edit's attachment plan.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The final attachment set (retained, re-bound, and added receipts).
    pub attachments: Vec<Attachment>,
    /// Receipts that were removed; their storage objects can be deleted
    /// once the metadata commit succeeds.
    pub removed: Vec<Attachment>,
}

/// Stateless bookkeeping over a liquidation's receipt set.
pub struct AttachmentLedger;

impl AttachmentLedger {
    /// Validates that an item binding targets a line of the current set.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::InvalidBinding` if `item_id` is not part of
    /// `items`.
    pub fn bind_to_item(
        item_id: LiquidationItemId,
        items: &[LiquidationItemId],
    ) -> Result<(), AttachmentError> {
        if items.contains(&item_id) {
            Ok(())
        } else {
            Err(AttachmentError::InvalidBinding { item_id })
        }
    }

    /// Resolves an edit-payload binding spec against the new item set.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::InvalidItemIndex` if the spec addresses a
    /// row the new item set does not have.
    pub fn resolve_target(
        target: BindingSpec,
        liquidation_id: LiquidationId,
        items: &[LiquidationItemId],
    ) -> Result<AttachmentBinding, AttachmentError> {
        match target {
            BindingSpec::General => Ok(AttachmentBinding::General { liquidation_id }),
            BindingSpec::Item { index } => items
                .get(index)
                .map(|item_id| AttachmentBinding::ItemLevel { item_id: *item_id })
                .ok_or(AttachmentError::InvalidItemIndex { index }),
        }
    }

    /// Reconciles the current receipt set against an edit's plan.
    ///
    /// - `remove` entries are deleted; an id that does not belong to this
    ///   liquidation fails with `NotFound`.
    /// - `keep` entries are re-bound against the new item set; referencing a
    ///   removed or unknown receipt fails with `NotFound`.
    /// - `add` entries are appended under fresh ids.
    /// - Receipts mentioned nowhere are left untouched, unless they are
    ///   item-level and their line is gone, which fails with
    ///   `DanglingAttachment` (explicit removal required).
    ///
    /// # Errors
    ///
    /// See above; additionally `InvalidItemIndex` for out-of-range bindings.
    pub fn reconcile(
        liquidation_id: LiquidationId,
        current: &[Attachment],
        plan: &ReconcilePlan,
        items: &[LiquidationItemId],
    ) -> Result<ReconcileOutcome, AttachmentError> {
        let by_id: HashMap<AttachmentId, &Attachment> =
            current.iter().map(|a| (a.id, a)).collect();

        // Removals first; everything they name must belong to this set.
        let mut removed_ids = HashSet::new();
        for id in &plan.remove {
            if !by_id.contains_key(id) {
                return Err(AttachmentError::NotFound(*id));
            }
            removed_ids.insert(*id);
        }

        // Keeps re-bind surviving receipts; naming a removed or unknown
        // receipt is a contradictory plan.
        let mut rebound: HashMap<AttachmentId, AttachmentBinding> = HashMap::new();
        for keep in &plan.keep {
            if removed_ids.contains(&keep.attachment_id) || !by_id.contains_key(&keep.attachment_id)
            {
                return Err(AttachmentError::NotFound(keep.attachment_id));
            }
            let binding = Self::resolve_target(keep.target, liquidation_id, items)?;
            rebound.insert(keep.attachment_id, binding);
        }

        let mut attachments = Vec::with_capacity(current.len() + plan.add.len());
        let mut removed = Vec::new();

        for attachment in current {
            if removed_ids.contains(&attachment.id) {
                removed.push(attachment.clone());
                continue;
            }

            if let Some(binding) = rebound.get(&attachment.id) {
                let mut kept = attachment.clone();
                kept.binding = *binding;
                attachments.push(kept);
                continue;
            }

            // Untouched: still has to point at a line that exists.
            if let Some(item_id) = attachment.binding.item_id() {
                if !items.contains(&item_id) {
                    return Err(AttachmentError::DanglingAttachment {
                        attachment_id: attachment.id,
                        item_id,
                    });
                }
            }
            attachments.push(attachment.clone());
        }

        for receipt in &plan.add {
            let binding = Self::resolve_target(receipt.target, liquidation_id, items)?;
            attachments.push(Attachment {
                id: AttachmentId::new(),
                binding,
                file_name: receipt.file_name.clone(),
                file_type: receipt.file_type.clone(),
                file_size: receipt.file_size,
                storage_provider: receipt.storage_provider.clone(),
                storage_bucket: receipt.storage_bucket.clone(),
                storage_key: receipt.storage_key.clone(),
                uploaded_by: receipt.uploaded_by,
                created_at: Utc::now(),
            });
        }

        Ok(ReconcileOutcome {
            attachments,
            removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::types::{KeepInstruction, NewReceipt};
    use tala_shared::types::UserId;

    fn attachment(binding: AttachmentBinding) -> Attachment {
        Attachment {
            id: AttachmentId::new(),
            binding,
            file_name: "resibo.jpg".to_string(),
            file_type: "image/jpeg".to_string(),
            file_size: 2048,
            storage_provider: "local".to_string(),
            storage_bucket: "receipts".to_string(),
            storage_key: "some/key/resibo.jpg".to_string(),
            uploaded_by: UserId::new(),
            created_at: Utc::now(),
        }
    }

    fn new_receipt(target: BindingSpec) -> NewReceipt {
        NewReceipt {
            file_name: "bagong-resibo.png".to_string(),
            file_type: "image/png".to_string(),
            file_size: 4096,
            storage_provider: "local".to_string(),
            storage_bucket: "receipts".to_string(),
            storage_key: "pending/key/bagong-resibo.png".to_string(),
            uploaded_by: UserId::new(),
            target,
        }
    }

    #[test]
    fn test_bind_to_item_validates_membership() {
        let items = vec![LiquidationItemId::new(), LiquidationItemId::new()];
        assert!(AttachmentLedger::bind_to_item(items[0], &items).is_ok());

        let stranger = LiquidationItemId::new();
        assert!(matches!(
            AttachmentLedger::bind_to_item(stranger, &items),
            Err(AttachmentError::InvalidBinding { item_id }) if item_id == stranger
        ));
    }

    #[test]
    fn test_untouched_attachments_survive() {
        let liquidation_id = LiquidationId::new();
        let items = vec![LiquidationItemId::new()];
        let current = vec![
            attachment(AttachmentBinding::General { liquidation_id }),
            attachment(AttachmentBinding::ItemLevel { item_id: items[0] }),
        ];

        let outcome = AttachmentLedger::reconcile(
            liquidation_id,
            &current,
            &ReconcilePlan::empty(),
            &items,
        )
        .unwrap();

        assert_eq!(outcome.attachments.len(), 2);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_remove_unknown_id_fails() {
        let liquidation_id = LiquidationId::new();
        let plan = ReconcilePlan {
            remove: vec![AttachmentId::new()],
            ..ReconcilePlan::empty()
        };

        let result = AttachmentLedger::reconcile(liquidation_id, &[], &plan, &[]);
        assert!(matches!(result, Err(AttachmentError::NotFound(_))));
    }

    #[test]
    fn test_remove_extracts_attachment() {
        let liquidation_id = LiquidationId::new();
        let current = vec![attachment(AttachmentBinding::General { liquidation_id })];
        let plan = ReconcilePlan {
            remove: vec![current[0].id],
            ..ReconcilePlan::empty()
        };

        let outcome =
            AttachmentLedger::reconcile(liquidation_id, &current, &plan, &[]).unwrap();

        assert!(outcome.attachments.is_empty());
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.removed[0].id, current[0].id);
    }

    #[test]
    fn test_keep_rebinds_to_new_item_set() {
        let liquidation_id = LiquidationId::new();
        let old_item = LiquidationItemId::new();
        let new_items = vec![LiquidationItemId::new(), LiquidationItemId::new()];
        let current = vec![attachment(AttachmentBinding::ItemLevel { item_id: old_item })];

        let plan = ReconcilePlan {
            keep: vec![KeepInstruction {
                attachment_id: current[0].id,
                target: BindingSpec::Item { index: 1 },
            }],
            ..ReconcilePlan::empty()
        };

        let outcome =
            AttachmentLedger::reconcile(liquidation_id, &current, &plan, &new_items).unwrap();

        assert_eq!(outcome.attachments.len(), 1);
        assert_eq!(
            outcome.attachments[0].binding.item_id(),
            Some(new_items[1])
        );
    }

    #[test]
    fn test_keep_of_removed_receipt_is_contradictory() {
        let liquidation_id = LiquidationId::new();
        let current = vec![attachment(AttachmentBinding::General { liquidation_id })];
        let plan = ReconcilePlan {
            keep: vec![KeepInstruction {
                attachment_id: current[0].id,
                target: BindingSpec::General,
            }],
            remove: vec![current[0].id],
            ..ReconcilePlan::empty()
        };

        let result = AttachmentLedger::reconcile(liquidation_id, &current, &plan, &[]);
        assert!(matches!(result, Err(AttachmentError::NotFound(_))));
    }

    #[test]
    fn test_dangling_item_attachment_fails_edit() {
        let liquidation_id = LiquidationId::new();
        let doomed_item = LiquidationItemId::new();
        let new_items = vec![LiquidationItemId::new()];
        let current = vec![attachment(AttachmentBinding::ItemLevel {
            item_id: doomed_item,
        })];

        let result = AttachmentLedger::reconcile(
            liquidation_id,
            &current,
            &ReconcilePlan::empty(),
            &new_items,
        );

        assert!(matches!(
            result,
            Err(AttachmentError::DanglingAttachment { attachment_id, item_id })
                if attachment_id == current[0].id && item_id == doomed_item
        ));
    }

    #[test]
    fn test_dangling_resolved_by_explicit_removal() {
        let liquidation_id = LiquidationId::new();
        let doomed_item = LiquidationItemId::new();
        let new_items = vec![LiquidationItemId::new()];
        let current = vec![attachment(AttachmentBinding::ItemLevel {
            item_id: doomed_item,
        })];

        let plan = ReconcilePlan {
            remove: vec![current[0].id],
            ..ReconcilePlan::empty()
        };

        let outcome =
            AttachmentLedger::reconcile(liquidation_id, &current, &plan, &new_items).unwrap();
        assert!(outcome.attachments.is_empty());
        assert_eq!(outcome.removed.len(), 1);
    }

    #[test]
    fn test_add_appends_with_fresh_ids() {
        let liquidation_id = LiquidationId::new();
        let items = vec![LiquidationItemId::new()];
        let plan = ReconcilePlan {
            add: vec![
                new_receipt(BindingSpec::General),
                new_receipt(BindingSpec::Item { index: 0 }),
            ],
            ..ReconcilePlan::empty()
        };

        let outcome = AttachmentLedger::reconcile(liquidation_id, &[], &plan, &items).unwrap();

        assert_eq!(outcome.attachments.len(), 2);
        assert_ne!(outcome.attachments[0].id, outcome.attachments[1].id);
        assert_eq!(
            outcome.attachments[0].binding,
            AttachmentBinding::General { liquidation_id }
        );
        assert_eq!(outcome.attachments[1].binding.item_id(), Some(items[0]));
    }

    #[test]
    fn test_add_with_out_of_range_index_fails() {
        let liquidation_id = LiquidationId::new();
        let items = vec![LiquidationItemId::new()];
        let plan = ReconcilePlan {
            add: vec![new_receipt(BindingSpec::Item { index: 5 })],
            ..ReconcilePlan::empty()
        };

        let result = AttachmentLedger::reconcile(liquidation_id, &[], &plan, &items);
        assert!(matches!(
            result,
            Err(AttachmentError::InvalidItemIndex { index: 5 })
        ));
    }

    #[test]
    fn test_full_keep_remove_add_cycle() {
        let liquidation_id = LiquidationId::new();
        let old_items = vec![LiquidationItemId::new(), LiquidationItemId::new()];
        let new_items = vec![LiquidationItemId::new()];

        let general = attachment(AttachmentBinding::General { liquidation_id });
        let kept = attachment(AttachmentBinding::ItemLevel {
            item_id: old_items[0],
        });
        let dropped = attachment(AttachmentBinding::ItemLevel {
            item_id: old_items[1],
        });
        let current = vec![general.clone(), kept.clone(), dropped.clone()];

        let plan = ReconcilePlan {
            keep: vec![KeepInstruction {
                attachment_id: kept.id,
                target: BindingSpec::Item { index: 0 },
            }],
            remove: vec![dropped.id],
            add: vec![new_receipt(BindingSpec::General)],
        };

        let outcome =
            AttachmentLedger::reconcile(liquidation_id, &current, &plan, &new_items).unwrap();

        assert_eq!(outcome.attachments.len(), 3);
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.removed[0].id, dropped.id);

        let rebound = outcome
            .attachments
            .iter()
            .find(|a| a.id == kept.id)
            .unwrap();
        assert_eq!(rebound.binding.item_id(), Some(new_items[0]));

        let untouched = outcome
            .attachments
            .iter()
            .find(|a| a.id == general.id)
            .unwrap();
        assert_eq!(untouched.binding, general.binding);
    }
}
