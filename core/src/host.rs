//! Interfaces of the external collaborators the system contract runs against
//!
//! The contract never moves balances, enforces limits or checks signatures
//! itself. It reads and stages calls through these traits; a blockchain host
//! (or the in-memory host in [`crate::memory`]) provides the implementations.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::asset::{Asset, Symbol};
use crate::error::TokenError;

pub type AccountName = String;

/// Whole seconds since the Unix epoch
pub type TimePointSec = u32;

/// Fungible token ledger
pub trait TokenLedger {
    fn balance(&self, account: &str, symbol: &Symbol) -> i64;

    fn supply(&self, symbol: &Symbol) -> i64;

    /// Move `quantity` from `from` to `to`.
    ///
    /// Must fail without side effects when `from` holds less than `quantity`.
    fn transfer(
        &mut self,
        from: &str,
        to: &str,
        quantity: &Asset,
        memo: &str,
    ) -> Result<(), TokenError>;
}

/// Resource-limit enforcement subsystem
pub trait ResourceLimits {
    fn set_resource_limits(&mut self, account: &str, ram_bytes: i64, net_weight: i64, cpu_weight: i64);
}

/// Authorization and privilege checks for the current call
pub trait Permissions {
    fn has_auth(&self, account: &str) -> bool;

    fn is_privileged(&self, account: &str) -> bool;
}

pub trait Clock {
    fn now(&self) -> TimePointSec;
}

/// Producer-election weight recomputation
pub trait VoteTally {
    fn update_votes(&mut self, voter: &VoterInfo);
}

/// Everything the contract needs from its host
pub trait Host: TokenLedger + ResourceLimits + Permissions + Clock + VoteTally {}

impl<T> Host for T where T: TokenLedger + ResourceLimits + Permissions + Clock + VoteTally {}

/// Voting record of an account; the system contract only maintains `staked`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoterInfo {
    pub owner: AccountName,
    pub staked: i64,
    pub proxy: Option<AccountName>,
    pub producers: Vec<AccountName>,
}

impl VoterInfo {
    pub fn new(owner: impl Into<AccountName>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// True when the voter's weight counts towards producers or a proxy
    pub fn has_votes(&self) -> bool {
        self.proxy.is_some() || !self.producers.is_empty()
    }
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePointSec {
        Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as TimePointSec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voter_has_votes() {
        let mut voter = VoterInfo::new("alice");
        assert!(!voter.has_votes());

        voter.producers.push("producer1".to_string());
        assert!(voter.has_votes());

        voter.producers.clear();
        voter.proxy = Some("proxy".to_string());
        assert!(voter.has_votes());
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
