//! Liquidation use-case orchestration.
//!
//! Composes the aggregate, the approval workflow, and the attachment ledger
//! over traits the db crate implements. Permission checks and persistence
//! are external collaborators; this service only sequences them.

use std::sync::Arc;

use tala_shared::types::{
    AttachmentId, CashAdvanceId, LiquidationId, PageRequest, PageResponse, UserId,
};

use crate::attachment::AttachmentLedger;
use crate::liquidation::error::LiquidationError;
use crate::liquidation::types::{
    ApprovalLevel, Capability, CashAdvance, DecisionAction, EditLiquidationInput,
    FileLiquidationInput, Liquidation, LiquidationFilter, LiquidationSummary,
};
use crate::liquidation::workflow::{ApprovalState, ApprovalWorkflow, Decision};
use crate::storage::ReceiptStore;

/// Permission collaborator: "does this actor hold capability X".
pub trait PermissionChecker: Send + Sync {
    /// Check whether a user holds a capability.
    fn has_capability(
        &self,
        user_id: UserId,
        capability: Capability,
    ) -> impl std::future::Future<Output = Result<bool, LiquidationError>> + Send;
}

/// Persistence collaborator for the liquidation aggregate.
///
/// Implementations must persist the aggregate (header + items +
/// attachments) transactionally, and apply `update`/`record_decision` with
/// an optimistic version check: if the stored version differs from
/// `expected_version`, fail with `Conflict` and write nothing.
pub trait LiquidationRepository: Send + Sync {
    /// Load a cash advance.
    fn find_cash_advance(
        &self,
        id: CashAdvanceId,
    ) -> impl std::future::Future<Output = Result<Option<CashAdvance>, LiquidationError>> + Send;

    /// Whether a liquidation already references this cash advance.
    fn cash_advance_liquidated(
        &self,
        id: CashAdvanceId,
    ) -> impl std::future::Future<Output = Result<bool, LiquidationError>> + Send;

    /// Persist a freshly filed aggregate as one unit.
    fn insert(
        &self,
        liquidation: &Liquidation,
    ) -> impl std::future::Future<Output = Result<(), LiquidationError>> + Send;

    /// Load the full aggregate.
    fn fetch(
        &self,
        id: LiquidationId,
    ) -> impl std::future::Future<Output = Result<Option<Liquidation>, LiquidationError>> + Send;

    /// Persist an edited aggregate, deleting rows for `removed_attachments`.
    ///
    /// Must bump the stored version by one on success.
    fn update(
        &self,
        liquidation: &Liquidation,
        expected_version: i32,
        removed_attachments: &[AttachmentId],
    ) -> impl std::future::Future<Output = Result<(), LiquidationError>> + Send;

    /// Persist a workflow decision (status + audit fields).
    ///
    /// Must bump the stored version by one on success.
    fn record_decision(
        &self,
        id: LiquidationId,
        expected_version: i32,
        decision: &Decision,
    ) -> impl std::future::Future<Output = Result<(), LiquidationError>> + Send;

    /// List liquidation summaries matching a filter, with the total count.
    fn list(
        &self,
        filter: &LiquidationFilter,
        page: &PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<LiquidationSummary>, u64), LiquidationError>>
    + Send;
}

/// Orchestrator for the liquidation use cases.
pub struct LiquidationService<R, P> {
    repo: Arc<R>,
    permissions: Arc<P>,
    store: Option<Arc<ReceiptStore>>,
}

impl<R: LiquidationRepository, P: PermissionChecker> LiquidationService<R, P> {
    /// Create a new service.
    ///
    /// `store` is used only for best-effort cleanup of receipt objects
    /// removed by an edit; pass `None` when storage is not configured.
    #[must_use]
    pub fn new(repo: Arc<R>, permissions: Arc<P>, store: Option<Arc<ReceiptStore>>) -> Self {
        Self {
            repo,
            permissions,
            store,
        }
    }

    /// File a liquidation against a cash advance.
    ///
    /// # Errors
    ///
    /// - `CashAdvanceNotFound` if the advance does not exist
    /// - `Forbidden` if the actor neither owns the advance nor manages
    ///   liquidations
    /// - `AlreadyLiquidated` if the advance is already reconciled
    /// - `Validation` for aggregate rule violations
    pub async fn file(
        &self,
        actor: UserId,
        input: FileLiquidationInput,
    ) -> Result<Liquidation, LiquidationError> {
        let advance = self
            .repo
            .find_cash_advance(input.cash_advance_id)
            .await?
            .ok_or(LiquidationError::CashAdvanceNotFound(input.cash_advance_id))?;

        if advance.employee_id != actor {
            self.require(actor, Capability::ManageLiquidation).await?;
        }

        if self.repo.cash_advance_liquidated(advance.id).await? {
            return Err(LiquidationError::AlreadyLiquidated(advance.id));
        }

        let liquidation = Liquidation::file(&advance, input)?;
        self.repo.insert(&liquidation).await?;

        Ok(liquidation)
    }

    /// Edit a pending liquidation: replace the item set and reconcile
    /// receipts against it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the liquidation does not exist
    /// - `Forbidden` if the actor neither owns it nor manages liquidations
    /// - `InvalidState` unless the liquidation is pending
    /// - attachment ledger errors (`NotFound`, `InvalidBinding`,
    ///   `DanglingAttachment`)
    /// - `Conflict` if a concurrent modification collides twice (the first
    ///   collision is retried against a fresh read)
    pub async fn edit(
        &self,
        actor: UserId,
        id: LiquidationId,
        input: EditLiquidationInput,
    ) -> Result<Liquidation, LiquidationError> {
        let mut attempts = 0;
        loop {
            let mut liquidation = self
                .repo
                .fetch(id)
                .await?
                .ok_or(LiquidationError::NotFound(id))?;

            if !liquidation.is_owned_by(actor) {
                self.require(actor, Capability::ManageLiquidation).await?;
            }

            let expected_version = liquidation.version;
            let current_attachments = std::mem::take(&mut liquidation.attachments);
            let attempt = input.clone();

            liquidation.apply_edit(attempt.items, attempt.liquidation_date, attempt.remarks)?;

            let outcome = AttachmentLedger::reconcile(
                liquidation.id,
                &current_attachments,
                &attempt.attachments,
                &liquidation.item_ids(),
            )?;
            liquidation.attachments = outcome.attachments;

            let removed_ids: Vec<_> = outcome.removed.iter().map(|a| a.id).collect();
            match self
                .repo
                .update(&liquidation, expected_version, &removed_ids)
                .await
            {
                Ok(()) => {
                    liquidation.version = expected_version + 1;

                    // Metadata is committed; removed objects are cleanup,
                    // not correctness. A failed delete leaves an orphan in
                    // the bucket.
                    if let Some(store) = &self.store {
                        for attachment in &outcome.removed {
                            let _ = store.delete(&attachment.storage_key).await;
                        }
                    }

                    return Ok(liquidation);
                }
                Err(err) if err.is_retryable() && attempts == 0 => {
                    attempts += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Decide a liquidation at a level.
    ///
    /// Retries exactly once on `Conflict`; the second attempt re-reads the
    /// aggregate, so a duplicate of an already-applied decision surfaces as
    /// `AlreadyDecided` rather than double-recording.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `Forbidden`
    /// - `IllegalTransition`, `AlreadyDecided` from the workflow
    /// - `Conflict` if both attempts collide
    pub async fn decide(
        &self,
        actor: UserId,
        id: LiquidationId,
        level: ApprovalLevel,
        action: DecisionAction,
        comment: Option<String>,
    ) -> Result<Liquidation, LiquidationError> {
        self.require(actor, Capability::for_level(level)).await?;

        let mut attempts = 0;
        loop {
            let mut liquidation = self
                .repo
                .fetch(id)
                .await?
                .ok_or(LiquidationError::NotFound(id))?;

            let decision = ApprovalWorkflow::decide(
                &ApprovalState::from(&liquidation),
                level,
                action,
                actor,
                comment.clone(),
            )?;

            match self
                .repo
                .record_decision(id, liquidation.version, &decision)
                .await
            {
                Ok(()) => {
                    let expected_version = liquidation.version;
                    liquidation.apply_decision(&decision);
                    liquidation.version = expected_version + 1;
                    return Ok(liquidation);
                }
                Err(err) if err.is_retryable() && attempts == 0 => {
                    attempts += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Load a liquidation, subject to visibility rules.
    ///
    /// # Errors
    ///
    /// `NotFound` if it does not exist, `Forbidden` if the actor is neither
    /// the owner nor a reviewer/manager.
    pub async fn get(
        &self,
        actor: UserId,
        id: LiquidationId,
    ) -> Result<Liquidation, LiquidationError> {
        let liquidation = self
            .repo
            .fetch(id)
            .await?
            .ok_or(LiquidationError::NotFound(id))?;

        if !liquidation.is_owned_by(actor) && !self.is_reviewer(actor).await? {
            return Err(LiquidationError::Forbidden(Capability::ManageLiquidation));
        }

        Ok(liquidation)
    }

    /// List liquidations. Non-privileged actors only see their own filings.
    ///
    /// # Errors
    ///
    /// Repository errors only; the filter itself cannot fail.
    pub async fn list(
        &self,
        actor: UserId,
        mut filter: LiquidationFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LiquidationSummary>, LiquidationError> {
        if !self.is_reviewer(actor).await? {
            filter.employee_id = Some(actor);
        }

        let (rows, total) = self.repo.list(&filter, &page).await?;
        Ok(PageResponse::new(rows, &page, total))
    }

    /// Fail with `Forbidden` unless the actor holds the capability.
    async fn require(
        &self,
        actor: UserId,
        capability: Capability,
    ) -> Result<(), LiquidationError> {
        if self.permissions.has_capability(actor, capability).await? {
            Ok(())
        } else {
            Err(LiquidationError::Forbidden(capability))
        }
    }

    /// Whether the actor holds any capability that grants visibility into
    /// other employees' liquidations.
    async fn is_reviewer(&self, actor: UserId) -> Result<bool, LiquidationError> {
        for capability in [
            Capability::ManageLiquidation,
            Capability::ApproveLiquidationsLevel1,
            Capability::ApproveLiquidationsLevel2,
        ] {
            if self.permissions.has_capability(actor, capability).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tala_shared::types::{AttachmentId, Money, StoreId};

    use crate::attachment::ReconcilePlan;
    use crate::liquidation::types::{
        CashAdvanceStatus, CashAdvanceType, ItemDraft, LiquidationStatus,
    };
    use crate::reconcile::ExpenseAmounts;

    struct MockRepo {
        advances: Mutex<HashMap<CashAdvanceId, CashAdvance>>,
        liquidations: Mutex<HashMap<LiquidationId, Liquidation>>,
        conflicts_to_inject: AtomicUsize,
    }

    impl MockRepo {
        fn new() -> Self {
            Self {
                advances: Mutex::new(HashMap::new()),
                liquidations: Mutex::new(HashMap::new()),
                conflicts_to_inject: AtomicUsize::new(0),
            }
        }

        fn add_advance(&self, advance: CashAdvance) {
            self.advances.lock().unwrap().insert(advance.id, advance);
        }

        fn inject_conflicts(&self, n: usize) {
            self.conflicts_to_inject.store(n, Ordering::SeqCst);
        }

        fn take_conflict(&self) -> bool {
            self.conflicts_to_inject
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    impl LiquidationRepository for MockRepo {
        async fn find_cash_advance(
            &self,
            id: CashAdvanceId,
        ) -> Result<Option<CashAdvance>, LiquidationError> {
            Ok(self.advances.lock().unwrap().get(&id).cloned())
        }

        async fn cash_advance_liquidated(
            &self,
            id: CashAdvanceId,
        ) -> Result<bool, LiquidationError> {
            Ok(self
                .liquidations
                .lock()
                .unwrap()
                .values()
                .any(|l| l.cash_advance_id == id))
        }

        async fn insert(&self, liquidation: &Liquidation) -> Result<(), LiquidationError> {
            self.liquidations
                .lock()
                .unwrap()
                .insert(liquidation.id, liquidation.clone());
            Ok(())
        }

        async fn fetch(
            &self,
            id: LiquidationId,
        ) -> Result<Option<Liquidation>, LiquidationError> {
            Ok(self.liquidations.lock().unwrap().get(&id).cloned())
        }

        async fn update(
            &self,
            liquidation: &Liquidation,
            expected_version: i32,
            _removed_attachments: &[AttachmentId],
        ) -> Result<(), LiquidationError> {
            let mut store = self.liquidations.lock().unwrap();
            let stored = store
                .get_mut(&liquidation.id)
                .ok_or(LiquidationError::NotFound(liquidation.id))?;
            if stored.version != expected_version {
                return Err(LiquidationError::Conflict);
            }
            let mut updated = liquidation.clone();
            updated.version = expected_version + 1;
            *stored = updated;
            Ok(())
        }

        async fn record_decision(
            &self,
            id: LiquidationId,
            expected_version: i32,
            decision: &Decision,
        ) -> Result<(), LiquidationError> {
            if self.take_conflict() {
                return Err(LiquidationError::Conflict);
            }
            let mut store = self.liquidations.lock().unwrap();
            let stored = store.get_mut(&id).ok_or(LiquidationError::NotFound(id))?;
            if stored.version != expected_version {
                return Err(LiquidationError::Conflict);
            }
            stored.apply_decision(decision);
            stored.version = expected_version + 1;
            Ok(())
        }

        async fn list(
            &self,
            filter: &LiquidationFilter,
            page: &PageRequest,
        ) -> Result<(Vec<LiquidationSummary>, u64), LiquidationError> {
            let store = self.liquidations.lock().unwrap();
            let rows: Vec<_> = store
                .values()
                .filter(|l| filter.status.is_none_or(|s| l.status == s))
                .filter(|l| filter.employee_id.is_none_or(|e| l.employee_id == e))
                .filter(|l| filter.store_id.is_none_or(|s| l.store_id == s))
                .map(|l| LiquidationSummary {
                    id: l.id,
                    cash_advance_id: l.cash_advance_id,
                    employee_id: l.employee_id,
                    store_id: l.store_id,
                    liquidation_date: l.liquidation_date,
                    status: l.status,
                    total_amount: l.total_amount,
                    return_to_company: l.return_to_company,
                    reimbursement: l.reimbursement,
                    created_at: l.created_at,
                })
                .collect();
            let total = rows.len() as u64;
            Ok((rows.into_iter().take(page.limit() as usize).collect(), total))
        }
    }

    struct MockPermissions {
        grants: Mutex<HashSet<(UserId, &'static str)>>,
    }

    impl MockPermissions {
        fn new() -> Self {
            Self {
                grants: Mutex::new(HashSet::new()),
            }
        }

        fn grant(&self, user: UserId, capability: Capability) {
            self.grants
                .lock()
                .unwrap()
                .insert((user, capability.as_str()));
        }
    }

    impl PermissionChecker for MockPermissions {
        async fn has_capability(
            &self,
            user_id: UserId,
            capability: Capability,
        ) -> Result<bool, LiquidationError> {
            Ok(self
                .grants
                .lock()
                .unwrap()
                .contains(&(user_id, capability.as_str())))
        }
    }

    fn advance(employee: UserId) -> CashAdvance {
        CashAdvance {
            id: CashAdvanceId::new(),
            employee_id: employee,
            amount: Money::new(dec!(5000.00)),
            status: CashAdvanceStatus::Approved,
            advance_type: CashAdvanceType::Support,
            purpose: "store audit".to_string(),
            advance_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
        }
    }

    fn draft(gas: rust_decimal::Decimal) -> ItemDraft {
        ItemDraft {
            expense_date: NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(),
            from_destination: "Makati".to_string(),
            to_destination: "Tagaytay".to_string(),
            amounts: ExpenseAmounts {
                gas: Money::new(gas),
                ..ExpenseAmounts::default()
            },
            remarks: None,
        }
    }

    fn file_input(cash_advance_id: CashAdvanceId) -> FileLiquidationInput {
        FileLiquidationInput {
            cash_advance_id,
            store_id: StoreId::new(),
            ticket_id: None,
            liquidation_date: NaiveDate::from_ymd_opt(2026, 7, 5).unwrap(),
            remarks: None,
            items: vec![draft(dec!(4500.00))],
        }
    }

    fn edit_input() -> EditLiquidationInput {
        EditLiquidationInput {
            liquidation_date: NaiveDate::from_ymd_opt(2026, 7, 6).unwrap(),
            remarks: Some("corrected".to_string()),
            items: vec![draft(dec!(1200.00))],
            attachments: ReconcilePlan::empty(),
        }
    }

    fn service(
        repo: Arc<MockRepo>,
        permissions: Arc<MockPermissions>,
    ) -> LiquidationService<MockRepo, MockPermissions> {
        LiquidationService::new(repo, permissions, None)
    }

    #[tokio::test]
    async fn test_file_by_owner() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        let liquidation = svc.file(employee, file_input(adv.id)).await.unwrap();

        assert_eq!(liquidation.status, LiquidationStatus::Pending);
        assert_eq!(liquidation.return_to_company, Money::new(dec!(500.00)));
    }

    #[tokio::test]
    async fn test_file_by_stranger_is_forbidden() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let adv = advance(UserId::new());
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        let result = svc.file(UserId::new(), file_input(adv.id)).await;

        assert!(matches!(result, Err(LiquidationError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_file_unknown_advance() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let svc = service(repo, permissions);

        let result = svc
            .file(UserId::new(), file_input(CashAdvanceId::new()))
            .await;
        assert!(matches!(
            result,
            Err(LiquidationError::CashAdvanceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_twice_is_already_liquidated() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        svc.file(employee, file_input(adv.id)).await.unwrap();

        let result = svc.file(employee, file_input(adv.id)).await;
        assert!(matches!(
            result,
            Err(LiquidationError::AlreadyLiquidated(id)) if id == adv.id
        ));
    }

    #[tokio::test]
    async fn test_edit_bumps_version() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(Arc::clone(&repo), permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        let edited = svc.edit(employee, filed.id, edit_input()).await.unwrap();

        assert_eq!(edited.version, filed.version + 1);
        assert_eq!(edited.total_amount, Money::new(dec!(1200.00)));
        assert_eq!(edited.return_to_company, Money::new(dec!(3800.00)));
    }

    #[tokio::test]
    async fn test_edit_after_approval_is_invalid_state() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let supervisor = UserId::new();
        permissions.grant(supervisor, Capability::ApproveLiquidationsLevel1);

        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();
        svc.decide(
            supervisor,
            filed.id,
            ApprovalLevel::One,
            DecisionAction::Approve,
            None,
        )
        .await
        .unwrap();

        let result = svc.edit(employee, filed.id, edit_input()).await;
        assert!(matches!(result, Err(LiquidationError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_decide_without_capability_is_forbidden() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        let result = svc
            .decide(
                employee,
                filed.id,
                ApprovalLevel::One,
                DecisionAction::Approve,
                None,
            )
            .await;
        assert!(matches!(result, Err(LiquidationError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_duplicate_decide_is_already_decided() {
        // Scenario D through the service.
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let supervisor = UserId::new();
        permissions.grant(supervisor, Capability::ApproveLiquidationsLevel1);

        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(Arc::clone(&repo), permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        let first = svc
            .decide(
                supervisor,
                filed.id,
                ApprovalLevel::One,
                DecisionAction::Approve,
                None,
            )
            .await
            .unwrap();
        assert_eq!(first.status, LiquidationStatus::Level1Approved);

        let second = svc
            .decide(
                supervisor,
                filed.id,
                ApprovalLevel::One,
                DecisionAction::Approve,
                None,
            )
            .await;
        assert!(matches!(
            second,
            Err(LiquidationError::AlreadyDecided { .. })
        ));

        // state unchanged
        let stored = repo.fetch(filed.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LiquidationStatus::Level1Approved);
        assert_eq!(stored.version, first.version);
    }

    #[tokio::test]
    async fn test_decide_retries_conflict_once() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let supervisor = UserId::new();
        permissions.grant(supervisor, Capability::ApproveLiquidationsLevel1);

        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(Arc::clone(&repo), permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        // first write collides, retry succeeds
        repo.inject_conflicts(1);
        let decided = svc
            .decide(
                supervisor,
                filed.id,
                ApprovalLevel::One,
                DecisionAction::Approve,
                None,
            )
            .await
            .unwrap();
        assert_eq!(decided.status, LiquidationStatus::Level1Approved);
    }

    #[tokio::test]
    async fn test_decide_surfaces_second_conflict() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let supervisor = UserId::new();
        permissions.grant(supervisor, Capability::ApproveLiquidationsLevel1);

        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(Arc::clone(&repo), permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        repo.inject_conflicts(2);
        let result = svc
            .decide(
                supervisor,
                filed.id,
                ApprovalLevel::One,
                DecisionAction::Approve,
                None,
            )
            .await;
        assert!(matches!(result, Err(LiquidationError::Conflict)));
    }

    #[tokio::test]
    async fn test_full_two_level_flow() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let supervisor = UserId::new();
        let manager = UserId::new();
        permissions.grant(supervisor, Capability::ApproveLiquidationsLevel1);
        permissions.grant(manager, Capability::ApproveLiquidationsLevel2);

        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        svc.decide(
            supervisor,
            filed.id,
            ApprovalLevel::One,
            DecisionAction::Approve,
            Some("complete".to_string()),
        )
        .await
        .unwrap();

        let approved = svc
            .decide(
                manager,
                filed.id,
                ApprovalLevel::Two,
                DecisionAction::Approve,
                None,
            )
            .await
            .unwrap();

        assert_eq!(approved.status, LiquidationStatus::Approved);
        assert!(approved.level1.is_some());
        assert!(approved.level2.is_some());
    }

    #[tokio::test]
    async fn test_level2_before_level1_via_service() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let manager = UserId::new();
        permissions.grant(manager, Capability::ApproveLiquidationsLevel2);

        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        let result = svc
            .decide(
                manager,
                filed.id,
                ApprovalLevel::Two,
                DecisionAction::Approve,
                None,
            )
            .await;
        assert!(matches!(
            result,
            Err(LiquidationError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_scopes_non_reviewers_to_own_filings() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let alice = UserId::new();
        let bob = UserId::new();

        for employee in [alice, bob] {
            let adv = advance(employee);
            repo.add_advance(adv.clone());
            let svc = service(Arc::clone(&repo), Arc::clone(&permissions));
            svc.file(employee, file_input(adv.id)).await.unwrap();
        }

        let svc = service(Arc::clone(&repo), Arc::clone(&permissions));

        let page = svc
            .list(alice, LiquidationFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].employee_id, alice);

        // a reviewer sees everything
        let supervisor = UserId::new();
        permissions.grant(supervisor, Capability::ApproveLiquidationsLevel1);
        let page = svc
            .list(
                supervisor,
                LiquidationFilter::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
    }

    #[tokio::test]
    async fn test_get_enforces_visibility() {
        let repo = Arc::new(MockRepo::new());
        let permissions = Arc::new(MockPermissions::new());
        let employee = UserId::new();
        let adv = advance(employee);
        repo.add_advance(adv.clone());

        let svc = service(repo, permissions);
        let filed = svc.file(employee, file_input(adv.id)).await.unwrap();

        assert!(svc.get(employee, filed.id).await.is_ok());
        assert!(matches!(
            svc.get(UserId::new(), filed.id).await,
            Err(LiquidationError::Forbidden(_))
        ));
    }
}
