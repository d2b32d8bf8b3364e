//! Voting stake bookkeeping
//!
//! The election itself is handled elsewhere; this module only keeps each
//! voter's `staked` total in step with its bandwidth stake and enforces the
//! linear unlock of the legacy vesting account.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysres_core::{AccountName, LegacyVesting, TimePointSec, VoterInfo};

use crate::error::{Result, SystemError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterTable {
    rows: BTreeMap<AccountName, VoterInfo>,
}

impl VoterTable {
    pub fn get(&self, owner: &str) -> Option<&VoterInfo> {
        self.rows.get(owner)
    }

    /// Insert or replace a voter record
    pub fn upsert(&mut self, voter: VoterInfo) {
        self.rows.insert(voter.owner.clone(), voter);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add `delta` to `owner`'s staked total, creating the voter if needed
    pub fn add_stake(&mut self, owner: &str, delta: i64) -> Result<VoterInfo> {
        let current = self.rows.get(owner).map(|voter| voter.staked).unwrap_or(0);
        let staked = current
            .checked_add(delta)
            .ok_or_else(|| SystemError::AccountingViolation(format!("voting stake of {}", owner)))?;
        if staked < 0 {
            return Err(SystemError::NegativeVotingStake {
                account: owner.to_string(),
            });
        }

        let voter = self
            .rows
            .entry(owner.to_string())
            .or_insert_with(|| VoterInfo::new(owner));
        voter.staked = staked;
        Ok(voter.clone())
    }
}

/// Portion of the vesting account's tokens claimable at `now`
pub fn claimable(vesting: &LegacyVesting, now: TimePointSec) -> i64 {
    let elapsed = i64::from(now) - i64::from(vesting.base_time);
    (vesting.max_claimable as f64 * elapsed as f64 / vesting.duration_sec as f64) as i64
}

/// The vesting account may never hold less stake than is still locked
pub fn validate_legacy_vesting(vesting: &LegacyVesting, staked: i64, now: TimePointSec) -> Result<()> {
    let locked = vesting.max_claimable - claimable(vesting, now);
    if locked > staked {
        return Err(SystemError::VestingCapExceeded {
            account: vesting.account.clone(),
            staked,
            locked,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vesting() -> LegacyVesting {
        LegacyVesting {
            account: "b1".to_string(),
            base_time: 1_000,
            max_claimable: 1_000_000,
            duration_sec: 1_000,
        }
    }

    #[test]
    fn test_add_stake_creates_voter() {
        let mut voters = VoterTable::default();
        assert_eq!(voters.add_stake("alice", 200).unwrap().staked, 200);
        assert_eq!(voters.add_stake("alice", -150).unwrap().staked, 50);
        assert_eq!(voters.len(), 1);
    }

    #[test]
    fn test_negative_stake_rejected() {
        let mut voters = VoterTable::default();
        voters.add_stake("alice", 10).unwrap();
        assert_eq!(
            voters.add_stake("alice", -11),
            Err(SystemError::NegativeVotingStake {
                account: "alice".to_string()
            })
        );
        assert_eq!(voters.get("alice").map(|v| v.staked), Some(10));
    }

    #[test]
    fn test_claimable_is_linear() {
        let vesting = vesting();
        assert_eq!(claimable(&vesting, 1_000), 0);
        assert_eq!(claimable(&vesting, 1_250), 250_000);
        assert_eq!(claimable(&vesting, 2_000), 1_000_000);
    }

    #[test]
    fn test_vesting_cap() {
        let vesting = vesting();
        assert!(validate_legacy_vesting(&vesting, 1_000_000, 1_000).is_ok());
        assert!(validate_legacy_vesting(&vesting, 500_000, 1_500).is_ok());
        assert_eq!(
            validate_legacy_vesting(&vesting, 499_999, 1_500),
            Err(SystemError::VestingCapExceeded {
                account: "b1".to_string(),
                staked: 499_999,
                locked: 500_000,
            })
        );
        // fully vested after the schedule
        assert!(validate_legacy_vesting(&vesting, 0, 3_000).is_ok());
    }
}
