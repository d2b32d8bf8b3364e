//! Delegated bandwidth between a staker and a beneficiary
//!
//! Rows are scoped by the staker and keyed by the beneficiary, so "what did
//! I delegate" is a single scope scan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysres_core::AccountName;

use crate::error::{Result, SystemError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedBandwidth {
    pub from: AccountName,
    pub to: AccountName,
    pub net_weight: i64,
    pub cpu_weight: i64,
}

impl DelegatedBandwidth {
    pub fn total(&self) -> i64 {
        self.net_weight + self.cpu_weight
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationTable {
    /// staker -> beneficiary -> row
    scopes: BTreeMap<AccountName, BTreeMap<AccountName, DelegatedBandwidth>>,
}

impl DelegationTable {
    pub fn get(&self, from: &str, to: &str) -> Option<&DelegatedBandwidth> {
        self.scopes.get(from).and_then(|scope| scope.get(to))
    }

    /// Everything `from` has delegated
    pub fn delegated_by(&self, from: &str) -> impl Iterator<Item = &DelegatedBandwidth> {
        self.scopes.get(from).into_iter().flat_map(|scope| scope.values())
    }

    pub fn len(&self) -> usize {
        self.scopes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Add signed deltas to the `from -> to` row.
    ///
    /// Returns `None` when both weights reached zero and the row was removed.
    pub fn apply(
        &mut self,
        from: &str,
        to: &str,
        net_delta: i64,
        cpu_delta: i64,
    ) -> Result<Option<DelegatedBandwidth>> {
        let mut row = self.get(from, to).cloned().unwrap_or_else(|| DelegatedBandwidth {
            from: from.to_string(),
            to: to.to_string(),
            net_weight: 0,
            cpu_weight: 0,
        });

        row.net_weight = row
            .net_weight
            .checked_add(net_delta)
            .filter(|weight| *weight >= 0)
            .ok_or_else(|| insufficient("net", from, to))?;
        row.cpu_weight = row
            .cpu_weight
            .checked_add(cpu_delta)
            .filter(|weight| *weight >= 0)
            .ok_or_else(|| insufficient("cpu", from, to))?;

        if row.net_weight == 0 && row.cpu_weight == 0 {
            if let Some(scope) = self.scopes.get_mut(from) {
                scope.remove(to);
                if scope.is_empty() {
                    self.scopes.remove(from);
                }
            }
            return Ok(None);
        }

        self.scopes
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), row.clone());
        Ok(Some(row))
    }
}

fn insufficient(kind: &str, from: &str, to: &str) -> SystemError {
    SystemError::InsufficientBalance(format!(
        "insufficient staked {} bandwidth from {} to {}",
        kind, from, to
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_exists_while_weight_remains() {
        let mut table = DelegationTable::default();
        table.apply("alice", "bob", 100, 100).unwrap();
        assert_eq!(table.get("alice", "bob").map(|d| d.total()), Some(200));

        let row = table.apply("alice", "bob", -100, 0).unwrap();
        assert_eq!(row.map(|d| d.cpu_weight), Some(100));

        assert!(table.apply("alice", "bob", 0, -100).unwrap().is_none());
        assert!(table.get("alice", "bob").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_overdraw_rejected() {
        let mut table = DelegationTable::default();
        table.apply("alice", "bob", 10, 10).unwrap();
        assert!(matches!(
            table.apply("alice", "bob", 0, -11),
            Err(SystemError::InsufficientBalance(_))
        ));
        assert!(table.apply("carol", "bob", -1, 0).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_delegated_by_scope() {
        let mut table = DelegationTable::default();
        table.apply("alice", "bob", 1, 0).unwrap();
        table.apply("alice", "carol", 0, 2).unwrap();
        table.apply("bob", "alice", 3, 3).unwrap();

        let targets: Vec<_> = table.delegated_by("alice").map(|d| d.to.as_str()).collect();
        assert_eq!(targets, vec!["bob", "carol"]);
        assert_eq!(table.delegated_by("nobody").count(), 0);
    }
}
