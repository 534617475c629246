//! Advance ledger: lifecycle and settlement of cash advances.
//!
//! The ledger owns the strictly forward-moving advance state machine.
//! Every transition is a total function over [`AdvanceStatus`]: any
//! transition not explicitly listed fails with `InvalidTransition` and
//! leaves the record unchanged. Transition closures run under the
//! store's entity lock, so concurrent operations on one advance
//! serialize and at most one state-dependent transition succeeds.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Advance, AdvanceStatus, PaymentMode, Settlement};
use crate::store::{MemoryStore, Store};

/// Owns advance records and their settlement arithmetic.
pub struct AdvanceLedger {
    store: Arc<dyn Store<Advance>>,
}

impl AdvanceLedger {
    /// Creates a ledger over a fresh in-memory store.
    pub fn in_memory() -> Self {
        let store: Arc<MemoryStore<Advance>> = Arc::new(MemoryStore::new());
        Self::with_store(store)
    }

    /// Creates a ledger over the given store.
    pub fn with_store(store: Arc<dyn Store<Advance>>) -> Self {
        Self { store }
    }

    /// Creates a new advance in status Requested.
    ///
    /// Fails with a validation error if the requested amount is not
    /// positive.
    pub fn create(
        &self,
        employee_id: &str,
        requested_amount: Decimal,
        purpose: &str,
        mode: PaymentMode,
        requested_on: NaiveDate,
    ) -> EngineResult<Advance> {
        if requested_amount <= Decimal::ZERO {
            return Err(EngineError::Validation {
                entity: "advance".to_string(),
                message: format!(
                    "requested_amount must be positive, got {}",
                    requested_amount
                ),
            });
        }

        let advance = Advance {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            requested_amount,
            released_amount: None,
            purpose: purpose.to_string(),
            mode,
            status: AdvanceStatus::Requested,
            approved_by: None,
            requested_on,
            settlement: None,
        };
        self.store.insert(advance.clone())?;
        Ok(advance)
    }

    /// Approves a requested advance. Requested → Approved only.
    pub fn approve(&self, advance_id: &str, approver_id: &str) -> EngineResult<Advance> {
        self.store.update(advance_id, &mut |advance| {
            match advance.status {
                AdvanceStatus::Requested => {
                    let mut next = advance.clone();
                    next.status = AdvanceStatus::Approved;
                    next.approved_by = Some(approver_id.to_string());
                    Ok(next)
                }
                current => Err(invalid_transition(advance_id, current, "approve")),
            }
        })
    }

    /// Releases the disbursed amount. Approved → Released only.
    ///
    /// Fails with a validation error if the released amount is not
    /// positive or exceeds the requested amount.
    pub fn release(&self, advance_id: &str, released_amount: Decimal) -> EngineResult<Advance> {
        self.store.update(advance_id, &mut |advance| {
            match advance.status {
                AdvanceStatus::Approved => {
                    if released_amount <= Decimal::ZERO {
                        return Err(EngineError::Validation {
                            entity: "advance".to_string(),
                            message: format!(
                                "released_amount must be positive, got {}",
                                released_amount
                            ),
                        });
                    }
                    if released_amount > advance.requested_amount {
                        return Err(EngineError::Validation {
                            entity: "advance".to_string(),
                            message: format!(
                                "released_amount {} exceeds requested_amount {}",
                                released_amount, advance.requested_amount
                            ),
                        });
                    }
                    let mut next = advance.clone();
                    next.status = AdvanceStatus::Released;
                    next.released_amount = Some(released_amount);
                    Ok(next)
                }
                current => Err(invalid_transition(advance_id, current, "release")),
            }
        })
    }

    /// Settles a released advance against actual spend. Released →
    /// Settled only.
    ///
    /// The settlement balance and type follow the allocated amount (the
    /// released amount, or the requested amount if never released) and
    /// the sign of allocated − actual. Fails with a validation error if
    /// the actual expense is negative.
    pub fn settle(
        &self,
        advance_id: &str,
        actual_expense: Decimal,
        settled_on: NaiveDate,
    ) -> EngineResult<Advance> {
        self.store.update(advance_id, &mut |advance| {
            match advance.status {
                AdvanceStatus::Released => {
                    if actual_expense < Decimal::ZERO {
                        return Err(EngineError::Validation {
                            entity: "advance".to_string(),
                            message: format!(
                                "actual_expense must not be negative, got {}",
                                actual_expense
                            ),
                        });
                    }
                    let mut next = advance.clone();
                    next.settlement = Some(Settlement::compute(
                        advance.allocated_amount(),
                        actual_expense,
                        settled_on,
                    ));
                    next.status = AdvanceStatus::Settled;
                    Ok(next)
                }
                current => Err(invalid_transition(advance_id, current, "settle")),
            }
        })
    }

    /// Closes a settled advance. Settled → Closed only, terminal.
    ///
    /// Closing before settlement is rejected, so a settlement claim in
    /// flight can never lose its advance.
    pub fn close(&self, advance_id: &str) -> EngineResult<Advance> {
        self.store.update(advance_id, &mut |advance| {
            match advance.status {
                AdvanceStatus::Settled => {
                    let mut next = advance.clone();
                    next.status = AdvanceStatus::Closed;
                    Ok(next)
                }
                current => Err(invalid_transition(advance_id, current, "close")),
            }
        })
    }

    /// Returns the advance by id.
    pub fn get(&self, advance_id: &str) -> EngineResult<Advance> {
        self.store
            .get(advance_id)
            .ok_or_else(|| EngineError::AdvanceNotFound {
                id: advance_id.to_string(),
            })
    }

    /// Returns one employee's advances, most recently requested first.
    pub fn advances_for(&self, employee_id: &str) -> Vec<Advance> {
        let mut advances: Vec<Advance> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|a| a.employee_id == employee_id)
            .collect();
        advances.sort_by(|a, b| b.requested_on.cmp(&a.requested_on).then(a.id.cmp(&b.id)));
        advances
    }

    /// Returns a point-in-time copy of all advances.
    pub fn snapshot(&self) -> Vec<Advance> {
        self.store.snapshot()
    }
}

fn invalid_transition(id: &str, current: AdvanceStatus, attempted: &str) -> EngineError {
    EngineError::InvalidTransition {
        entity: "advance".to_string(),
        id: id.to_string(),
        current: current.to_string(),
        attempted: attempted.to_string(),
    }
}
