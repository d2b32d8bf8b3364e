//! In-memory host
//!
//! Implements every collaborator interface over plain maps so the system
//! contract can run end-to-end in tests and in the local simulator. The whole
//! host is serializable and travels inside simulator snapshots.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::asset::{Asset, Symbol};
use crate::error::TokenError;
use crate::host::{
    AccountName, Clock, Permissions, ResourceLimits, TimePointSec, TokenLedger, VoteTally,
    VoterInfo,
};

/// Limits last pushed to the enforcement subsystem for one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountLimits {
    pub ram_bytes: i64,
    pub net_weight: i64,
    pub cpu_weight: i64,
}

/// Ledger audit trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: AccountName,
    pub to: AccountName,
    pub quantity: Asset,
    pub memo: String,
    pub timestamp: TimePointSec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryHost {
    now: TimePointSec,
    /// account -> symbol code -> balance
    balances: BTreeMap<AccountName, BTreeMap<String, i64>>,
    /// symbol code -> issued supply
    supply: BTreeMap<String, i64>,
    limits: BTreeMap<AccountName, AccountLimits>,
    signers: BTreeSet<AccountName>,
    privileged: BTreeSet<AccountName>,
    vote_updates: Vec<VoterInfo>,
    transfers: Vec<TransferRecord>,
}

impl MemoryHost {
    pub fn new(now: TimePointSec) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Create new tokens in `to`'s balance
    pub fn issue(&mut self, to: &str, quantity: &Asset) -> Result<(), TokenError> {
        if quantity.amount <= 0 {
            return Err(TokenError::NonPositiveQuantity(quantity.to_string()));
        }
        let code = &quantity.symbol.code;
        let supply = self.supply.entry(code.clone()).or_insert(0);
        *supply = supply
            .checked_add(quantity.amount)
            .ok_or_else(|| TokenError::Overflow(code.clone()))?;
        self.credit(to, code, quantity.amount)
    }

    pub fn set_now(&mut self, now: TimePointSec) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: u32) {
        self.now = self.now.saturating_add(seconds);
    }

    /// Replace the set of accounts that signed the current call
    pub fn sign_as<I, S>(&mut self, accounts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<AccountName>,
    {
        self.signers = accounts.into_iter().map(Into::into).collect();
    }

    pub fn set_privileged(&mut self, account: &str, privileged: bool) {
        if privileged {
            self.privileged.insert(account.to_string());
        } else {
            self.privileged.remove(account);
        }
    }

    pub fn limits(&self, account: &str) -> Option<AccountLimits> {
        self.limits.get(account).copied()
    }

    pub fn vote_updates(&self) -> &[VoterInfo] {
        &self.vote_updates
    }

    pub fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }

    /// All non-zero balances held by `account`
    pub fn balances_of(&self, account: &str) -> Vec<(String, i64)> {
        self.balances
            .get(account)
            .map(|tokens| {
                tokens
                    .iter()
                    .filter(|(_, amount)| **amount != 0)
                    .map(|(code, amount)| (code.clone(), *amount))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn credit(&mut self, account: &str, code: &str, amount: i64) -> Result<(), TokenError> {
        let balance = self
            .balances
            .entry(account.to_string())
            .or_default()
            .entry(code.to_string())
            .or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::Overflow(account.to_string()))?;
        Ok(())
    }
}

impl TokenLedger for MemoryHost {
    fn balance(&self, account: &str, symbol: &Symbol) -> i64 {
        self.balances
            .get(account)
            .and_then(|tokens| tokens.get(&symbol.code))
            .copied()
            .unwrap_or(0)
    }

    fn supply(&self, symbol: &Symbol) -> i64 {
        self.supply.get(&symbol.code).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &str,
        to: &str,
        quantity: &Asset,
        memo: &str,
    ) -> Result<(), TokenError> {
        if quantity.amount <= 0 {
            return Err(TokenError::NonPositiveQuantity(quantity.to_string()));
        }
        if from == to {
            return Err(TokenError::SelfTransfer(from.to_string()));
        }
        let available = self.balance(from, &quantity.symbol);
        if available < quantity.amount {
            return Err(TokenError::InsufficientBalance {
                account: from.to_string(),
                requested: quantity.amount,
                available,
            });
        }

        let code = quantity.symbol.code.clone();
        self.credit(to, &code, quantity.amount)?;
        self.credit(from, &code, -quantity.amount)?;
        debug!("transfer {} from {} to {} ({})", quantity, from, to, memo);

        self.transfers.push(TransferRecord {
            from: from.to_string(),
            to: to.to_string(),
            quantity: quantity.clone(),
            memo: memo.to_string(),
            timestamp: self.now,
        });
        Ok(())
    }
}

impl ResourceLimits for MemoryHost {
    fn set_resource_limits(&mut self, account: &str, ram_bytes: i64, net_weight: i64, cpu_weight: i64) {
        self.limits.insert(
            account.to_string(),
            AccountLimits {
                ram_bytes,
                net_weight,
                cpu_weight,
            },
        );
    }
}

impl Permissions for MemoryHost {
    fn has_auth(&self, account: &str) -> bool {
        self.signers.contains(account)
    }

    fn is_privileged(&self, account: &str) -> bool {
        self.privileged.contains(account)
    }
}

impl Clock for MemoryHost {
    fn now(&self) -> TimePointSec {
        self.now
    }
}

impl VoteTally for MemoryHost {
    fn update_votes(&mut self, voter: &VoterInfo) {
        self.vote_updates.push(voter.clone());
    }
}
