//! Per-account resource totals
//!
//! One row per account holding the RAM bytes it bought and the net/cpu
//! weight staked to it. The row is the input of the resource-limit
//! subsystem and is removed as soon as all three fields are zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysres_core::AccountName;

use crate::error::{Result, SystemError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResources {
    pub owner: AccountName,
    pub net_weight: i64,
    pub cpu_weight: i64,
    pub ram_bytes: i64,
}

impl UserResources {
    pub fn new(owner: impl Into<AccountName>) -> Self {
        Self {
            owner: owner.into(),
            net_weight: 0,
            cpu_weight: 0,
            ram_bytes: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.net_weight == 0 && self.cpu_weight == 0 && self.ram_bytes == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTable {
    rows: BTreeMap<AccountName, UserResources>,
}

impl ResourceTable {
    pub fn get(&self, owner: &str) -> Option<&UserResources> {
        self.rows.get(owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserResources> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Credit purchased bytes; returns the updated row
    pub fn add_ram(&mut self, owner: &str, bytes: i64) -> Result<UserResources> {
        let row = self
            .rows
            .entry(owner.to_string())
            .or_insert_with(|| UserResources::new(owner));
        row.ram_bytes = row
            .ram_bytes
            .checked_add(bytes)
            .ok_or_else(|| SystemError::AccountingViolation(format!("ram bytes of {}", owner)))?;
        Ok(row.clone())
    }

    /// Debit sold bytes; the returned row is all zero when it was removed
    pub fn remove_ram(&mut self, owner: &str, bytes: i64) -> Result<UserResources> {
        let available = self.rows.get(owner).map(|row| row.ram_bytes).unwrap_or(0);
        if bytes > available {
            return Err(SystemError::InsufficientQuota {
                account: owner.to_string(),
                requested: bytes,
                available,
            });
        }

        let mut row = self
            .rows
            .remove(owner)
            .unwrap_or_else(|| UserResources::new(owner));
        row.ram_bytes -= bytes;
        if !row.is_empty() {
            self.rows.insert(owner.to_string(), row.clone());
        }
        Ok(row)
    }

    /// Add signed weight deltas; the returned row is all zero when it was removed
    pub fn apply_stake(&mut self, owner: &str, net_delta: i64, cpu_delta: i64) -> Result<UserResources> {
        let mut row = self
            .rows
            .get(owner)
            .cloned()
            .unwrap_or_else(|| UserResources::new(owner));

        row.net_weight = checked_weight(row.net_weight, net_delta, "net", owner)?;
        row.cpu_weight = checked_weight(row.cpu_weight, cpu_delta, "cpu", owner)?;

        if row.is_empty() {
            self.rows.remove(owner);
        } else {
            self.rows.insert(owner.to_string(), row.clone());
        }
        Ok(row)
    }
}

fn checked_weight(current: i64, delta: i64, kind: &str, owner: &str) -> Result<i64> {
    let updated = current.checked_add(delta).ok_or_else(|| {
        SystemError::AccountingViolation(format!("{} weight of {} overflows", kind, owner))
    })?;
    if updated < 0 {
        return Err(SystemError::InsufficientBalance(format!(
            "insufficient staked total {} bandwidth for {}",
            kind, owner
        )));
    }
    Ok(updated)
}
