//! Claim router: submission and staged approval of claims.
//!
//! The router owns claims and their approval queue. A claim's required
//! stage set (Manager → HR → Finance, possibly skipping Finance) is
//! computed once at submission from the routing configuration and never
//! changes afterwards. One approval item exists per (claim, stage) pair
//! that has reached that stage; items are consumed atomically under the
//! store's entity lock, so two concurrent decisions on the same item
//! cannot both succeed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::ledger::AdvanceLedger;
use crate::models::{
    Advance, AdvanceStatus, ApprovalDecision, ApprovalItem, ApprovalStatus, AuditEntry, Claim,
    ClaimKind, ClaimStatus, Comment, ExpenseRecord, ExpenseStatus, Stage, TimelineEntry,
};
use crate::policy;
use crate::store::{MemoryStore, Store};

/// A claim as submitted by an employee, before the router assigns ids,
/// stages, and approval state.
#[derive(Debug, Clone)]
pub struct ClaimDraft {
    /// The employee submitting the claim.
    pub employee_id: String,
    /// Whether the claim stands alone or settles an advance.
    pub kind: ClaimKind,
    /// The claim-level expense category.
    pub category: String,
    /// The declared total. Must match the line item sum exactly when
    /// items are present.
    pub total_expense: Decimal,
    /// The advance being settled, for advance-settlement claims.
    pub against_advance: Option<String>,
    /// The spend events backing the claim.
    pub line_items: Vec<ExpenseRecord>,
    /// The submission date.
    pub submitted_on: NaiveDate,
}

/// Owns claims and the three-bucket approval queue.
pub struct ClaimRouter {
    claims: Arc<dyn Store<Claim>>,
    approvals: Arc<dyn Store<ApprovalItem>>,
    ledger: Arc<AdvanceLedger>,
    config: Arc<ConfigLoader>,
}

impl ClaimRouter {
    /// Creates a router over fresh in-memory stores.
    pub fn in_memory(ledger: Arc<AdvanceLedger>, config: Arc<ConfigLoader>) -> Self {
        let claims: Arc<MemoryStore<Claim>> = Arc::new(MemoryStore::new());
        let approvals: Arc<MemoryStore<ApprovalItem>> = Arc::new(MemoryStore::new());
        Self::with_stores(claims, approvals, ledger, config)
    }

    /// Creates a router over the given stores.
    pub fn with_stores(
        claims: Arc<dyn Store<Claim>>,
        approvals: Arc<dyn Store<ApprovalItem>>,
        ledger: Arc<AdvanceLedger>,
        config: Arc<ConfigLoader>,
    ) -> Self {
        Self {
            claims,
            approvals,
            ledger,
            config,
        }
    }

    /// Validates and records a new claim, creating the first required
    /// stage's approval item with a point-in-time policy flag snapshot.
    pub fn submit(&self, draft: ClaimDraft) -> EngineResult<Claim> {
        // Claim category must exist even when line items carry their own.
        let claim_rule = self.config.rule(&draft.category)?;

        for item in &draft.line_items {
            if item.amount <= Decimal::ZERO {
                return Err(EngineError::Validation {
                    entity: "claim".to_string(),
                    message: format!(
                        "line item {} amount must be positive, got {}",
                        item.id, item.amount
                    ),
                });
            }
            // Unknown line categories are caught before flags are computed.
            self.config.rule(&item.category)?;
        }

        if draft.line_items.is_empty() {
            // Manual totals are a concession for misc categories only.
            if draft.kind != ClaimKind::NonAdvance || !claim_rule.line_items_optional {
                return Err(EngineError::Validation {
                    entity: "claim".to_string(),
                    message: format!(
                        "claims in category '{}' must itemize their expenses",
                        draft.category
                    ),
                });
            }
        } else {
            let item_total: Decimal = draft.line_items.iter().map(|i| i.amount).sum();
            if item_total != draft.total_expense {
                return Err(EngineError::Validation {
                    entity: "claim".to_string(),
                    message: format!(
                        "line item total {} does not match declared total {}",
                        item_total, draft.total_expense
                    ),
                });
            }
        }

        if draft.total_expense <= Decimal::ZERO {
            return Err(EngineError::Validation {
                entity: "claim".to_string(),
                message: format!("total_expense must be positive, got {}", draft.total_expense),
            });
        }

        let pending_amount = match draft.kind {
            ClaimKind::AdvanceSettlement => {
                let advance = self.linked_advance(&draft)?;
                let released = advance.allocated_amount();
                (draft.total_expense - released).max(Decimal::ZERO)
            }
            ClaimKind::NonAdvance => {
                if draft.against_advance.is_some() {
                    return Err(EngineError::Validation {
                        entity: "claim".to_string(),
                        message: "non-advance claims must not reference an advance".to_string(),
                    });
                }
                Decimal::ZERO
            }
        };

        let required_stages = self
            .config
            .required_stages(draft.kind, draft.total_expense);
        let first_stage = required_stages[0];

        let claim = Claim {
            id: Uuid::new_v4().to_string(),
            employee_id: draft.employee_id.clone(),
            kind: draft.kind,
            category: draft.category,
            total_expense: draft.total_expense,
            against_advance: draft.against_advance,
            pending_amount,
            status: ClaimStatus::pending(first_stage),
            required_stages,
            line_items: draft.line_items,
            approval_timeline: Vec::new(),
            audit_trail: vec![AuditEntry {
                action: "Claim Submitted".to_string(),
                by: draft.employee_id,
                date: draft.submitted_on,
            }],
            comments: Vec::new(),
            submitted_on: draft.submitted_on,
        };

        self.claims.insert(claim.clone())?;
        self.enqueue_stage(&claim, first_stage, draft.submitted_on)?;

        debug!(claim_id = %claim.id, stage = %first_stage, "Claim submitted");
        Ok(claim)
    }

    /// Decides a pending approval item and advances or terminates the
    /// claim.
    ///
    /// On approval with stages remaining, the next stage's item is
    /// created and the claim moves to that stage. On final approval the
    /// claim becomes Approved; for advance-settlement claims the linked
    /// advance's status is re-read at this moment (never cached from
    /// submission) and must still be Released. On rejection the claim
    /// becomes Rejected and no further items are ever created.
    pub fn act(
        &self,
        approval_id: &str,
        decision: ApprovalDecision,
        actor_id: &str,
        comment: Option<String>,
        on: NaiveDate,
    ) -> EngineResult<Claim> {
        let item = self
            .approvals
            .get(approval_id)
            .ok_or_else(|| EngineError::ApprovalNotFound {
                id: approval_id.to_string(),
            })?;
        let claim = self
            .claims
            .get(&item.claim_id)
            .ok_or_else(|| EngineError::ClaimNotFound {
                id: item.claim_id.clone(),
            })?;

        if claim.status.active_stage() != Some(item.stage) {
            return Err(EngineError::InvalidTransition {
                entity: "approval".to_string(),
                id: approval_id.to_string(),
                current: claim.status.to_string(),
                attempted: format!("decide {} stage", item.stage),
            });
        }

        let next_stage = claim.next_stage_after(item.stage);
        let completes_claim = decision == ApprovalDecision::Approved && next_stage.is_none();

        // Re-read the advance at the moment of completion; submission-time
        // eligibility may be stale by now.
        if completes_claim && claim.kind == ClaimKind::AdvanceSettlement {
            let advance = self.linked_advance_of(&claim)?;
            if advance.status != AdvanceStatus::Released {
                return Err(EngineError::InvalidTransition {
                    entity: "claim".to_string(),
                    id: claim.id.clone(),
                    current: format!("linked advance {}", advance.status),
                    attempted: "complete settlement approval".to_string(),
                });
            }
        }

        // Consume the item under its entity lock; a concurrent decision
        // observes the consumed status and fails here.
        self.approvals.update(approval_id, &mut |current| {
            if current.status != ApprovalStatus::Pending {
                return Err(EngineError::InvalidTransition {
                    entity: "approval".to_string(),
                    id: approval_id.to_string(),
                    current: current.status.to_string(),
                    attempted: "decide".to_string(),
                });
            }
            let mut next = current.clone();
            next.status = decision.into();
            next.decided_by = Some(actor_id.to_string());
            Ok(next)
        })?;

        let updated = self.claims.update(&item.claim_id, &mut |current| {
            let mut next = current.clone();
            next.approval_timeline.push(TimelineEntry {
                stage: item.stage,
                owner: actor_id.to_string(),
                status: decision.into(),
                date: on,
                remarks: comment.clone(),
            });
            match decision {
                ApprovalDecision::Approved => match next_stage {
                    Some(stage) => next.status = ClaimStatus::pending(stage),
                    None => {
                        next.status = ClaimStatus::Approved;
                        for line in &mut next.line_items {
                            line.status = ExpenseStatus::Approved;
                        }
                    }
                },
                ApprovalDecision::Rejected => {
                    next.status = ClaimStatus::Rejected;
                    for line in &mut next.line_items {
                        line.status = ExpenseStatus::Rejected;
                    }
                }
            }
            next.audit_trail.push(AuditEntry {
                action: format!(
                    "{} {}",
                    item.stage,
                    match decision {
                        ApprovalDecision::Approved => "Approved",
                        ApprovalDecision::Rejected => "Rejected",
                    }
                ),
                by: actor_id.to_string(),
                date: on,
            });
            if let Some(message) = &comment {
                next.comments.push(Comment {
                    from: actor_id.to_string(),
                    message: message.clone(),
                    date: on,
                });
            }
            Ok(next)
        })?;

        if decision == ApprovalDecision::Approved {
            if let Some(stage) = next_stage {
                self.enqueue_stage(&updated, stage, on)?;
            }
        }

        debug!(
            claim_id = %updated.id,
            stage = %item.stage,
            status = %updated.status,
            "Approval decision recorded"
        );
        Ok(updated)
    }

    /// Appends a message to a claim's comment thread.
    pub fn comment(&self, claim_id: &str, from: &str, message: &str, on: NaiveDate) -> EngineResult<Claim> {
        self.claims.update(claim_id, &mut |current| {
            let mut next = current.clone();
            next.comments.push(Comment {
                from: from.to_string(),
                message: message.to_string(),
                date: on,
            });
            Ok(next)
        })
    }

    /// Marks a fully approved claim as paid. Approved → Paid, terminal.
    pub fn mark_paid(&self, claim_id: &str, actor_id: &str, on: NaiveDate) -> EngineResult<Claim> {
        self.claims.update(claim_id, &mut |current| {
            if current.status != ClaimStatus::Approved {
                return Err(EngineError::InvalidTransition {
                    entity: "claim".to_string(),
                    id: claim_id.to_string(),
                    current: current.status.to_string(),
                    attempted: "mark paid".to_string(),
                });
            }
            let mut next = current.clone();
            next.status = ClaimStatus::Paid;
            for line in &mut next.line_items {
                line.status = ExpenseStatus::Paid;
            }
            next.audit_trail.push(AuditEntry {
                action: "Claim Paid".to_string(),
                by: actor_id.to_string(),
                date: on,
            });
            Ok(next)
        })
    }

    /// Returns the claim by id.
    pub fn get(&self, claim_id: &str) -> EngineResult<Claim> {
        self.claims
            .get(claim_id)
            .ok_or_else(|| EngineError::ClaimNotFound {
                id: claim_id.to_string(),
            })
    }

    /// Returns the pending approval items for one stage bucket, oldest
    /// first.
    pub fn queue(&self, stage: Stage) -> Vec<ApprovalItem> {
        let mut items: Vec<ApprovalItem> = self
            .approvals
            .snapshot()
            .into_iter()
            .filter(|item| item.stage == stage && item.status == ApprovalStatus::Pending)
            .collect();
        items.sort_by(|a, b| a.created_on.cmp(&b.created_on).then(a.id.cmp(&b.id)));
        items
    }

    /// Returns one employee's claims, most recently submitted first.
    pub fn claims_for(&self, employee_id: &str) -> Vec<Claim> {
        let mut claims: Vec<Claim> = self
            .claims
            .snapshot()
            .into_iter()
            .filter(|c| c.employee_id == employee_id)
            .collect();
        claims.sort_by(|a, b| b.submitted_on.cmp(&a.submitted_on).then(a.id.cmp(&b.id)));
        claims
    }

    /// Returns a point-in-time copy of all claims.
    pub fn snapshot(&self) -> Vec<Claim> {
        self.claims.snapshot()
    }

    /// Creates the approval item for a stage the claim has just reached,
    /// snapshotting policy flags at creation time.
    fn enqueue_stage(&self, claim: &Claim, stage: Stage, on: NaiveDate) -> EngineResult<()> {
        let policy_flags = policy::evaluate_line_items(&claim.line_items, &self.config)?;
        self.approvals.insert(ApprovalItem {
            id: Uuid::new_v4().to_string(),
            claim_id: claim.id.clone(),
            employee_id: claim.employee_id.clone(),
            amount: claim.total_expense,
            stage,
            status: ApprovalStatus::Pending,
            policy_flags,
            created_on: on,
            decided_by: None,
        })
    }

    /// Resolves and validates the advance a settlement draft references.
    fn linked_advance(&self, draft: &ClaimDraft) -> EngineResult<Advance> {
        let advance_id = draft.against_advance.as_deref().ok_or_else(|| {
            EngineError::Validation {
                entity: "claim".to_string(),
                message: "advance settlement claims must reference an advance".to_string(),
            }
        })?;
        let advance = self.ledger.get(advance_id)?;
        if advance.employee_id != draft.employee_id {
            return Err(EngineError::Validation {
                entity: "claim".to_string(),
                message: format!(
                    "advance {} belongs to employee {}, not {}",
                    advance_id, advance.employee_id, draft.employee_id
                ),
            });
        }
        if advance.status != AdvanceStatus::Released {
            return Err(EngineError::Validation {
                entity: "claim".to_string(),
                message: format!(
                    "advance {} must be released before settlement, currently {}",
                    advance_id, advance.status
                ),
            });
        }
        Ok(advance)
    }

    fn linked_advance_of(&self, claim: &Claim) -> EngineResult<Advance> {
        let advance_id =
            claim
                .against_advance
                .as_deref()
                .ok_or_else(|| EngineError::Validation {
                    entity: "claim".to_string(),
                    message: format!("claim {} has no linked advance", claim.id),
                })?;
        self.ledger.get(advance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentMode;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup() -> (Arc<AdvanceLedger>, ClaimRouter) {
        let config = Arc::new(ConfigLoader::load("./config/expense").unwrap());
        let ledger = Arc::new(AdvanceLedger::in_memory());
        let router = ClaimRouter::in_memory(Arc::clone(&ledger), config);
        (ledger, router)
    }

    fn line_item(id: &str, category: &str, amount: &str, date: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: id.to_string(),
            employee_id: "emp_001".to_string(),
            category: category.to_string(),
            amount: dec(amount),
            date: make_date(date),
            payment_mode: PaymentMode::Card,
            project_code: None,
            receipt_url: Some(format!("https://receipts.example/r/{}", id)),
            status: ExpenseStatus::Pending,
        }
    }

    fn travel_draft(total: &str, items: Vec<ExpenseRecord>) -> ClaimDraft {
        ClaimDraft {
            employee_id: "emp_001".to_string(),
            kind: ClaimKind::NonAdvance,
            category: "Travel".to_string(),
            total_expense: dec(total),
            against_advance: None,
            line_items: items,
            submitted_on: make_date("2026-03-10"),
        }
    }

    fn released_advance(ledger: &AdvanceLedger, amount: &str) -> Advance {
        let advance = ledger
            .create(
                "emp_001",
                dec(amount),
                "Client visit travel",
                PaymentMode::BankTransfer,
                make_date("2026-03-01"),
            )
            .unwrap();
        ledger.approve(&advance.id, "mgr_001").unwrap();
        ledger.release(&advance.id, dec(amount)).unwrap()
    }

    fn settlement_draft(advance_id: &str, total: &str, items: Vec<ExpenseRecord>) -> ClaimDraft {
        ClaimDraft {
            employee_id: "emp_001".to_string(),
            kind: ClaimKind::AdvanceSettlement,
            category: "Travel".to_string(),
            total_expense: dec(total),
            against_advance: Some(advance_id.to_string()),
            line_items: items,
            submitted_on: make_date("2026-03-10"),
        }
    }

    /// Walks every remaining stage of a claim through approval.
    fn approve_through(router: &ClaimRouter, claim: &Claim) -> Claim {
        let mut current = claim.clone();
        while let Some(stage) = current.status.active_stage() {
            let queue = router.queue(stage);
            let item = queue
                .iter()
                .find(|i| i.claim_id == current.id)
                .expect("expected a pending item for the active stage");
            current = router
                .act(
                    &item.id,
                    ApprovalDecision::Approved,
                    "approver_x",
                    None,
                    make_date("2026-03-11"),
                )
                .unwrap();
        }
        current
    }

    #[test]
    fn test_submit_low_value_claim_routes_to_manager_and_hr() {
        let (_ledger, router) = setup();
        let claim = router
            .submit(travel_draft(
                "1500",
                vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
            ))
            .unwrap();

        assert_eq!(claim.status, ClaimStatus::PendingManager);
        assert_eq!(claim.required_stages, vec![Stage::Manager, Stage::Hr]);
        assert_eq!(claim.pending_amount, Decimal::ZERO);
        assert_eq!(claim.audit_trail.len(), 1);
        assert_eq!(claim.audit_trail[0].action, "Claim Submitted");

        let queue = router.queue(Stage::Manager);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].claim_id, claim.id);
        assert_eq!(queue[0].amount, dec("1500"));
    }

    #[test]
    fn test_submit_high_value_claim_includes_finance() {
        let (_ledger, router) = setup();
        let claim = router
            .submit(travel_draft(
                "4800",
                vec![
                    line_item("exp_001", "Travel", "2800", "2026-03-08"),
                    line_item("exp_002", "Accommodation", "2000", "2026-03-08"),
                ],
            ))
            .unwrap();

        assert_eq!(
            claim.required_stages,
            vec![Stage::Manager, Stage::Hr, Stage::Finance]
        );
    }

    #[test]
    fn test_submit_sum_mismatch_fails() {
        let (_ledger, router) = setup();
        let result = router.submit(travel_draft(
            "1600",
            vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
        ));

        match result {
            Err(EngineError::Validation { message, .. }) => {
                assert!(message.contains("1500"));
                assert!(message.contains("1600"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_without_items_requires_misc_category() {
        let (_ledger, router) = setup();

        // Travel claims must itemize.
        let result = router.submit(travel_draft("1500", vec![]));
        assert!(matches!(result, Err(EngineError::Validation { .. })));

        // Miscellaneous permits a manual total.
        let mut draft = travel_draft("900", vec![]);
        draft.category = "Miscellaneous".to_string();
        let claim = router.submit(draft).unwrap();
        assert_eq!(claim.total_expense, dec("900"));
        assert!(claim.line_items.is_empty());
    }

    #[test]
    fn test_submit_zero_item_amount_fails() {
        let (_ledger, router) = setup();
        let result = router.submit(travel_draft(
            "0",
            vec![line_item("exp_001", "Travel", "0", "2026-03-08")],
        ));
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_submit_unknown_category_fails() {
        let (_ledger, router) = setup();
        let mut draft = travel_draft(
            "1500",
            vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
        );
        draft.category = "Entertainment".to_string();
        assert!(matches!(
            router.submit(draft),
            Err(EngineError::CategoryNotFound { .. })
        ));
    }

    /// Items summing to ₹4600 against a ₹5000 release leave nothing
    /// pending.
    #[test]
    fn test_settlement_claim_pending_amount_covered_by_advance() {
        let (ledger, router) = setup();
        let advance = released_advance(&ledger, "5000");

        let claim = router
            .submit(settlement_draft(
                &advance.id,
                "4600",
                vec![
                    line_item("exp_001", "Travel", "2800", "2026-03-08"),
                    line_item("exp_002", "Accommodation", "1400", "2026-03-08"),
                    line_item("exp_003", "Meals", "400", "2026-03-09"),
                ],
            ))
            .unwrap();

        assert_eq!(claim.pending_amount, Decimal::ZERO);
        assert_eq!(
            claim.required_stages,
            vec![Stage::Manager, Stage::Hr, Stage::Finance]
        );
    }

    #[test]
    fn test_settlement_claim_pending_amount_beyond_advance() {
        let (ledger, router) = setup();
        let advance = released_advance(&ledger, "4000");

        let claim = router
            .submit(settlement_draft(
                &advance.id,
                "4600",
                vec![
                    line_item("exp_001", "Travel", "2800", "2026-03-08"),
                    line_item("exp_002", "Accommodation", "1800", "2026-03-08"),
                ],
            ))
            .unwrap();

        assert_eq!(claim.pending_amount, dec("600"));
    }

    #[test]
    fn test_settlement_claim_requires_released_advance() {
        let (ledger, router) = setup();
        let advance = ledger
            .create(
                "emp_001",
                dec("5000"),
                "Client visit travel",
                PaymentMode::BankTransfer,
                make_date("2026-03-01"),
            )
            .unwrap();

        let result = router.submit(settlement_draft(
            &advance.id,
            "4600",
            vec![line_item("exp_001", "Travel", "4600", "2026-03-08")],
        ));
        match result {
            Err(EngineError::Validation { message, .. }) => {
                assert!(message.contains("released"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_settlement_claim_requires_advance_reference() {
        let (_ledger, router) = setup();
        let mut draft = settlement_draft(
            "ignored",
            "4600",
            vec![line_item("exp_001", "Travel", "4600", "2026-03-08")],
        );
        draft.against_advance = None;
        assert!(matches!(
            router.submit(draft),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_settlement_claim_rejects_foreign_advance() {
        let (ledger, router) = setup();
        let advance = released_advance(&ledger, "5000");

        let mut draft = settlement_draft(
            &advance.id,
            "4600",
            vec![line_item("exp_001", "Travel", "4600", "2026-03-08")],
        );
        draft.employee_id = "emp_999".to_string();
        draft.line_items[0].employee_id = "emp_999".to_string();
        assert!(matches!(
            router.submit(draft),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_non_advance_claim_rejects_advance_reference() {
        let (ledger, router) = setup();
        let advance = released_advance(&ledger, "5000");

        let mut draft = travel_draft(
            "1500",
            vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
        );
        draft.against_advance = Some(advance.id);
        assert!(matches!(
            router.submit(draft),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_full_approval_walk() {
        let (ledger, router) = setup();
        let advance = released_advance(&ledger, "5000");
        let claim = router
            .submit(settlement_draft(
                &advance.id,
                "4600",
                vec![line_item("exp_001", "Travel", "4600", "2026-03-08")],
            ))
            .unwrap();

        let approved = approve_through(&router, &claim);

        assert_eq!(approved.status, ClaimStatus::Approved);
        assert_eq!(approved.approval_timeline.len(), 3);
        let stages: Vec<Stage> = approved.approval_timeline.iter().map(|t| t.stage).collect();
        assert_eq!(stages, vec![Stage::Manager, Stage::Hr, Stage::Finance]);
        assert!(approved
            .line_items
            .iter()
            .all(|li| li.status == ExpenseStatus::Approved));

        // All queues drained.
        for stage in Stage::SEQUENCE {
            assert!(router.queue(stage).is_empty());
        }

        // The advance is still the ledger's to settle.
        assert_eq!(
            ledger.get(&advance.id).unwrap().status,
            AdvanceStatus::Released
        );
    }

    #[test]
    fn test_manager_rejection_terminates_claim() {
        let (_ledger, router) = setup();
        let claim = router
            .submit(travel_draft(
                "1500",
                vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
            ))
            .unwrap();

        let item = router.queue(Stage::Manager)[0].clone();
        let rejected = router
            .act(
                &item.id,
                ApprovalDecision::Rejected,
                "mgr_001",
                Some("No trip on record".to_string()),
                make_date("2026-03-11"),
            )
            .unwrap();

        assert_eq!(rejected.status, ClaimStatus::Rejected);
        assert_eq!(rejected.approval_timeline.len(), 1);
        assert_eq!(rejected.comments.len(), 1);
        assert!(router.queue(Stage::Hr).is_empty());
        assert!(router.queue(Stage::Finance).is_empty());
        assert!(rejected
            .line_items
            .iter()
            .all(|li| li.status == ExpenseStatus::Rejected));
    }

    #[test]
    fn test_acting_twice_on_consumed_item_fails_both_times() {
        let (_ledger, router) = setup();
        let claim = router
            .submit(travel_draft(
                "1500",
                vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
            ))
            .unwrap();

        let item = router.queue(Stage::Manager)[0].clone();
        router
            .act(
                &item.id,
                ApprovalDecision::Approved,
                "mgr_001",
                None,
                make_date("2026-03-11"),
            )
            .unwrap();

        for _ in 0..2 {
            let result = router.act(
                &item.id,
                ApprovalDecision::Approved,
                "mgr_001",
                None,
                make_date("2026-03-11"),
            );
            assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
        }

        // The claim did not double-advance.
        assert_eq!(
            router.get(&claim.id).unwrap().status,
            ClaimStatus::PendingHr
        );
    }

    #[test]
    fn test_completion_rechecks_advance_status() {
        let (ledger, router) = setup();
        let advance = released_advance(&ledger, "5000");
        let claim = router
            .submit(settlement_draft(
                &advance.id,
                "4600",
                vec![line_item("exp_001", "Travel", "4600", "2026-03-08")],
            ))
            .unwrap();

        // Manager and HR approve.
        let item = router.queue(Stage::Manager)[0].clone();
        router
            .act(&item.id, ApprovalDecision::Approved, "mgr_001", None, make_date("2026-03-11"))
            .unwrap();
        let item = router.queue(Stage::Hr)[0].clone();
        router
            .act(&item.id, ApprovalDecision::Approved, "hr_001", None, make_date("2026-03-12"))
            .unwrap();

        // The advance is settled out-of-band before Finance decides.
        ledger
            .settle(&advance.id, dec("4600"), make_date("2026-03-12"))
            .unwrap();

        let item = router.queue(Stage::Finance)[0].clone();
        let result = router.act(
            &item.id,
            ApprovalDecision::Approved,
            "fin_001",
            None,
            make_date("2026-03-13"),
        );
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));

        // Neither the claim nor the item moved.
        assert_eq!(
            router.get(&claim.id).unwrap().status,
            ClaimStatus::PendingFinance
        );
        assert_eq!(router.queue(Stage::Finance).len(), 1);
    }

    #[test]
    fn test_policy_flags_snapshot_on_queue_items() {
        let (_ledger, router) = setup();
        let mut item = line_item("exp_001", "Meals", "1200", "2026-03-08");
        item.receipt_url = None;
        router
            .submit(travel_draft("1200", vec![item]))
            .unwrap();

        let queued = router.queue(Stage::Manager)[0].clone();
        assert!(queued
            .policy_flags
            .contains(&policy::FLAG_OVER_LIMIT.to_string()));
        assert!(queued
            .policy_flags
            .contains(&policy::FLAG_RECEIPT_MISSING.to_string()));
    }

    #[test]
    fn test_comment_appends_to_thread() {
        let (_ledger, router) = setup();
        let claim = router
            .submit(travel_draft(
                "1500",
                vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
            ))
            .unwrap();

        let updated = router
            .comment(&claim.id, "hr_001", "Receipt looks blurry", make_date("2026-03-11"))
            .unwrap();
        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.comments[0].from, "hr_001");
    }

    #[test]
    fn test_mark_paid_requires_approved_status() {
        let (_ledger, router) = setup();
        let claim = router
            .submit(travel_draft(
                "1500",
                vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
            ))
            .unwrap();

        let result = router.mark_paid(&claim.id, "fin_001", make_date("2026-03-12"));
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));

        let approved = approve_through(&router, &claim);
        let paid = router
            .mark_paid(&approved.id, "fin_001", make_date("2026-03-12"))
            .unwrap();
        assert_eq!(paid.status, ClaimStatus::Paid);
        assert!(paid
            .line_items
            .iter()
            .all(|li| li.status == ExpenseStatus::Paid));

        // Paid is terminal.
        assert!(router
            .mark_paid(&paid.id, "fin_001", make_date("2026-03-12"))
            .is_err());
    }

    #[test]
    fn test_claims_for_filters_by_employee() {
        let (_ledger, router) = setup();
        router
            .submit(travel_draft(
                "1500",
                vec![line_item("exp_001", "Travel", "1500", "2026-03-08")],
            ))
            .unwrap();

        assert_eq!(router.claims_for("emp_001").len(), 1);
        assert!(router.claims_for("emp_999").is_empty());
    }

    #[test]
    fn test_act_on_unknown_item_returns_not_found() {
        let (_ledger, router) = setup();
        let result = router.act(
            "missing",
            ApprovalDecision::Approved,
            "mgr_001",
            None,
            make_date("2026-03-11"),
        );
        assert!(matches!(result, Err(EngineError::ApprovalNotFound { .. })));
    }
}
