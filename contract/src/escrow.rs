//! Escrowed bandwidth grants
//!
//! A grant locks stake delegated through `escrowbw` and releases it in equal
//! tranches, one per elapsed escrow period. Grants live in the scope of the
//! staker that owns the delegation and name the beneficiary as `owner`.
//!
//! At unstake time the availability is computed over all grants of the
//! (staker, beneficiary) pair first; only when the request fits is anything
//! consumed. Free (never escrowed) stake is used before any tranche, and
//! tranches are taken in insertion order.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysres_core::{AccountName, TimePointSec};

use crate::error::{Result, SystemError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowGrant {
    pub id: u64,
    pub owner: AccountName,
    pub created: TimePointSec,
    pub period_count: u8,
    pub initial_amount: i64,
    /// Still locked; only ever decreases. Grants reaching 0 are removed
    pub amount: i64,
}

impl EscrowGrant {
    pub fn released(&self) -> i64 {
        self.initial_amount - self.amount
    }

    /// Whole escrow periods since the grant was created
    pub fn elapsed_periods(&self, now: TimePointSec, period_sec: u32) -> u32 {
        now.saturating_sub(self.created)
            .checked_div(period_sec)
            .unwrap_or(u32::MAX)
    }

    /// Total amount the schedule allows to have been released by `now`.
    ///
    /// Tranches are `floor(initial / period_count)`; the division remainder
    /// unlocks one period after the last full tranche.
    pub fn vested_ceiling(&self, now: TimePointSec, period_sec: u32) -> i64 {
        let periods = i64::from(self.elapsed_periods(now, period_sec)) + 1;
        let period_count = i64::from(self.period_count.max(1));
        (self.initial_amount / period_count)
            .saturating_mul(periods)
            .min(self.initial_amount)
    }

    /// Part of the locked amount that may be unstaked right now
    pub fn unlocked(&self, now: TimePointSec, period_sec: u32) -> i64 {
        (self.vested_ceiling(now, period_sec) - self.released()).clamp(0, self.amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowTable {
    /// staker -> grants in insertion order
    scopes: BTreeMap<AccountName, Vec<EscrowGrant>>,
    next_id: u64,
}

impl EscrowTable {
    /// Record a new grant; returns its id
    pub fn grant(
        &mut self,
        scope: &str,
        owner: &str,
        created: TimePointSec,
        period_count: u8,
        amount: i64,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.scopes.entry(scope.to_string()).or_default().push(EscrowGrant {
            id,
            owner: owner.to_string(),
            created,
            period_count,
            initial_amount: amount,
            amount,
        });
        id
    }

    /// Grants in `scope` held for `owner`, oldest first
    pub fn grants<'a>(&'a self, scope: &str, owner: &'a str) -> impl Iterator<Item = &'a EscrowGrant> {
        self.scopes
            .get(scope)
            .into_iter()
            .flatten()
            .filter(move |grant| grant.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.scopes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Still-locked total of the pair
    pub fn locked(&self, scope: &str, owner: &str) -> i64 {
        self.grants(scope, owner).map(|grant| grant.amount).sum()
    }

    /// Amount of a `delegated` stake that may be unstaked at `now`
    pub fn available(
        &self,
        scope: &str,
        owner: &str,
        delegated: i64,
        now: TimePointSec,
        period_sec: u32,
    ) -> i64 {
        let (locked, unlocked) = self
            .grants(scope, owner)
            .fold((0_i64, 0_i64), |(locked, unlocked), grant| {
                (locked + grant.amount, unlocked + grant.unlocked(now, period_sec))
            });
        (delegated - locked).max(0) + unlocked
    }

    /// Check `requested` against the availability and consume vested
    /// tranches for the part free stake does not cover.
    ///
    /// Returns the amount taken from grants.
    pub fn release(
        &mut self,
        scope: &str,
        owner: &str,
        requested: i64,
        delegated: i64,
        now: TimePointSec,
        period_sec: u32,
    ) -> Result<i64> {
        let available = self.available(scope, owner, delegated, now, period_sec);
        if requested > available {
            return Err(SystemError::EscrowInsufficient {
                requested,
                available,
            });
        }

        let free = (delegated - self.locked(scope, owner)).max(0);
        let from_grants = (requested - free).max(0);
        let mut remaining = from_grants;

        if let Some(grants) = self.scopes.get_mut(scope) {
            for grant in grants.iter_mut().filter(|grant| grant.owner == owner) {
                if remaining == 0 {
                    break;
                }
                let take = grant.unlocked(now, period_sec).min(remaining);
                grant.amount -= take;
                remaining -= take;
                debug!(
                    "escrow: grant {} of {} released {}, {} still locked",
                    grant.id, owner, take, grant.amount
                );
            }
        }

        if let Some(grants) = self.scopes.get_mut(scope) {
            grants.retain(|grant| grant.amount > 0);
            if grants.is_empty() {
                self.scopes.remove(scope);
            }
        }

        if remaining != 0 {
            return Err(SystemError::AccountingViolation(format!(
                "escrow of {} short by {} after availability check",
                owner, remaining
            )));
        }
        Ok(from_grants)
    }
}
