//! Pending refunds and the deferred settlement outbox
//!
//! Unstaked tokens wait in a single refund bucket per account. Every change
//! to the bucket replaces the account's settlement job in the outbox; an
//! external scheduler (or [`crate::SystemContract::run_deferred`]) executes
//! jobs once they are due.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysres_core::{AccountName, TimePointSec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub owner: AccountName,
    pub request_time: TimePointSec,
    pub net_amount: i64,
    pub cpu_amount: i64,
}

impl RefundRequest {
    pub fn total(&self) -> i64 {
        self.net_amount + self.cpu_amount
    }

    pub fn is_empty(&self) -> bool {
        self.net_amount == 0 && self.cpu_amount == 0
    }

    /// First second at which the refund may be claimed
    pub fn available_at(&self, delay_sec: u32) -> TimePointSec {
        self.request_time.saturating_add(delay_sec)
    }
}

/// What a stake change did to the refund bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    /// No bucket existed and nothing was unstaked
    Untouched,
    /// The bucket holds tokens after the change
    Pending(RefundRequest),
    /// The bucket was emptied and removed
    Closed,
}

/// Result of offsetting stake deltas against the refund bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: RefundOutcome,
    /// Part of the net delta not absorbed by the bucket
    pub net_residual: i64,
    /// Part of the cpu delta not absorbed by the bucket
    pub cpu_residual: i64,
}

impl Reconciled {
    /// Tokens that still have to move into the staking pool
    pub fn transfer_amount(&self) -> i64 {
        self.net_residual + self.cpu_residual
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundTable {
    rows: BTreeMap<AccountName, RefundRequest>,
}

impl RefundTable {
    pub fn get(&self, owner: &str) -> Option<&RefundRequest> {
        self.rows.get(owner)
    }

    pub fn remove(&mut self, owner: &str) -> Option<RefundRequest> {
        self.rows.remove(owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefundRequest> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Offset signed stake deltas against `owner`'s bucket.
    ///
    /// Negative deltas grow the bucket, positive deltas first drain it and
    /// only the remainder is returned as residual. `request_time` moves to
    /// `now` whenever a delta is negative.
    pub fn reconcile(
        &mut self,
        owner: &str,
        net_delta: i64,
        cpu_delta: i64,
        now: TimePointSec,
    ) -> Reconciled {
        let unstaking = net_delta < 0 || cpu_delta < 0;

        let Some(mut request) = self.rows.remove(owner) else {
            if !unstaking {
                return Reconciled {
                    outcome: RefundOutcome::Untouched,
                    net_residual: net_delta,
                    cpu_residual: cpu_delta,
                };
            }
            let request = RefundRequest {
                owner: owner.to_string(),
                request_time: now,
                net_amount: (-net_delta).max(0),
                cpu_amount: (-cpu_delta).max(0),
            };
            self.rows.insert(owner.to_string(), request.clone());
            return Reconciled {
                outcome: RefundOutcome::Pending(request),
                net_residual: net_delta.max(0),
                cpu_residual: cpu_delta.max(0),
            };
        };

        if unstaking {
            request.request_time = now;
        }
        let (net_amount, net_residual) = offset(request.net_amount, net_delta);
        let (cpu_amount, cpu_residual) = offset(request.cpu_amount, cpu_delta);
        request.net_amount = net_amount;
        request.cpu_amount = cpu_amount;

        let outcome = if request.is_empty() {
            RefundOutcome::Closed
        } else {
            self.rows.insert(owner.to_string(), request.clone());
            RefundOutcome::Pending(request)
        };
        Reconciled {
            outcome,
            net_residual,
            cpu_residual,
        }
    }
}

/// Subtract `delta` from a pending amount; returns (pending, residual)
fn offset(pending: i64, delta: i64) -> (i64, i64) {
    let remaining = pending - delta;
    if remaining < 0 {
        (0, -remaining)
    } else {
        (remaining, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredAction {
    Refund,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredJob {
    pub account: AccountName,
    pub action: DeferredAction,
    pub not_before: TimePointSec,
}

/// At most one deferred job per account; scheduling replaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbox {
    jobs: BTreeMap<AccountName, DeferredJob>,
}

impl Outbox {
    /// Place `job`, returning the job it replaced
    pub fn schedule(&mut self, job: DeferredJob) -> Option<DeferredJob> {
        self.jobs.insert(job.account.clone(), job)
    }

    pub fn cancel(&mut self, account: &str) -> Option<DeferredJob> {
        self.jobs.remove(account)
    }

    pub fn get(&self, account: &str) -> Option<&DeferredJob> {
        self.jobs.get(account)
    }

    /// Jobs whose time has come, in account order
    pub fn due(&self, now: TimePointSec) -> Vec<DeferredJob> {
        self.jobs
            .values()
            .filter(|job| job.not_before <= now)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeferredJob> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
