//! Staged side effects of one contract call
//!
//! Operations never touch the host directly. They read through a
//! [`Transaction`] and stage their token transfers, limit updates and vote
//! recomputations as [`Effect`]s. Transfers are checked against the ledger
//! balances plus everything already staged in the same call, so a call that
//! would overdraw an account fails before anything is dispatched.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysres_core::{
    AccountName, Asset, Permissions, Symbol, SystemConfig, TimePointSec, TokenError, TokenLedger,
    VoterInfo,
};

use crate::error::{Result, SystemError};
use crate::resources::UserResources;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: AccountName,
    pub to: AccountName,
    pub quantity: Asset,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Transfer(Transfer),
    SetResourceLimits {
        account: AccountName,
        ram_bytes: i64,
        net_weight: i64,
        cpu_weight: i64,
    },
    UpdateVotes(VoterInfo),
    ScheduleRefund {
        account: AccountName,
        not_before: TimePointSec,
    },
    CancelRefund {
        account: AccountName,
    },
}

/// Outcome of a committed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub action: String,
    /// State version produced by the call
    pub version: u64,
    pub effects: Vec<Effect>,
}

impl Receipt {
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Transfer(transfer) => Some(transfer),
            _ => None,
        })
    }
}

pub struct Transaction<'a> {
    permissions: &'a dyn Permissions,
    ledger: &'a dyn TokenLedger,
    config: &'a SystemConfig,
    now: TimePointSec,
    /// Account whose authority a deferred job carries
    deferred_authority: Option<AccountName>,
    effects: Vec<Effect>,
    /// (account, symbol code) -> staged balance change
    overlay: BTreeMap<(AccountName, String), i64>,
}

impl<'a> Transaction<'a> {
    pub fn new(
        permissions: &'a dyn Permissions,
        ledger: &'a dyn TokenLedger,
        config: &'a SystemConfig,
        now: TimePointSec,
    ) -> Self {
        Self {
            permissions,
            ledger,
            config,
            now,
            deferred_authority: None,
            effects: Vec::new(),
            overlay: BTreeMap::new(),
        }
    }

    /// Run with the authority `account` granted when it scheduled a job
    pub fn with_deferred_authority(mut self, account: &str) -> Self {
        self.deferred_authority = Some(account.to_string());
        self
    }

    pub fn config(&self) -> &'a SystemConfig {
        self.config
    }

    pub fn now(&self) -> TimePointSec {
        self.now
    }

    pub fn require_auth(&self, account: &str) -> Result<()> {
        if self.permissions.has_auth(account) || self.deferred_authority.as_deref() == Some(account) {
            return Ok(());
        }
        Err(SystemError::AuthorizationDenied {
            account: account.to_string(),
        })
    }

    pub fn is_privileged(&self, account: &str) -> bool {
        self.permissions.is_privileged(account)
    }

    pub fn token_supply(&self, symbol: &Symbol) -> i64 {
        self.ledger.supply(symbol)
    }

    /// Ledger balance including transfers staged so far
    pub fn balance(&self, account: &str, symbol: &Symbol) -> i64 {
        let staged = self
            .overlay
            .get(&(account.to_string(), symbol.code.clone()))
            .copied()
            .unwrap_or(0);
        self.ledger.balance(account, symbol) + staged
    }

    /// Stage a token transfer after checking it would succeed
    pub fn transfer(&mut self, from: &str, to: &str, quantity: Asset, memo: &str) -> Result<()> {
        if quantity.amount <= 0 {
            return Err(TokenError::NonPositiveQuantity(quantity.to_string()).into());
        }
        if from == to {
            return Err(TokenError::SelfTransfer(from.to_string()).into());
        }
        let available = self.balance(from, &quantity.symbol);
        if available < quantity.amount {
            return Err(TokenError::InsufficientBalance {
                account: from.to_string(),
                requested: quantity.amount,
                available,
            }
            .into());
        }

        let code = quantity.symbol.code.clone();
        *self.overlay.entry((from.to_string(), code.clone())).or_insert(0) -= quantity.amount;
        *self.overlay.entry((to.to_string(), code)).or_insert(0) += quantity.amount;

        debug!("staged transfer {} from {} to {} ({})", quantity, from, to, memo);
        self.effects.push(Effect::Transfer(Transfer {
            from: from.to_string(),
            to: to.to_string(),
            quantity,
            memo: memo.to_string(),
        }));
        Ok(())
    }

    pub fn set_resource_limits(&mut self, row: &UserResources) {
        self.effects.push(Effect::SetResourceLimits {
            account: row.owner.clone(),
            ram_bytes: row.ram_bytes,
            net_weight: row.net_weight,
            cpu_weight: row.cpu_weight,
        });
    }

    pub fn update_votes(&mut self, voter: VoterInfo) {
        self.effects.push(Effect::UpdateVotes(voter));
    }

    pub fn record(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysres_core::MemoryHost;

    fn sys(amount: i64) -> Asset {
        Asset::new(amount, Symbol::new("SYS", 4))
    }

    #[test]
    fn test_staged_transfers_see_each_other() {
        let mut host = MemoryHost::new(0);
        host.issue("alice", &sys(100)).unwrap();
        let config = SystemConfig::default();
        let mut tx = Transaction::new(&host, &host, &config, 0);

        tx.transfer("alice", "bob", sys(60), "first").unwrap();
        assert_eq!(tx.balance("alice", &config.core_symbol), 40);
        assert_eq!(tx.balance("bob", &config.core_symbol), 60);

        let err = tx.transfer("alice", "carol", sys(41), "second").unwrap_err();
        assert_eq!(
            err,
            SystemError::Token(TokenError::InsufficientBalance {
                account: "alice".to_string(),
                requested: 41,
                available: 40,
            })
        );
        // bob can spend what was staged for him
        tx.transfer("bob", "carol", sys(60), "third").unwrap();
        assert_eq!(tx.into_effects().len(), 2);
        // nothing reached the ledger
        assert_eq!(host.balance("alice", &Symbol::new("SYS", 4)), 100);
    }

    #[test]
    fn test_zero_transfer_rejected() {
        let host = MemoryHost::new(0);
        let config = SystemConfig::default();
        let mut tx = Transaction::new(&host, &host, &config, 0);
        assert!(matches!(
            tx.transfer("alice", "bob", sys(0), "buy ram"),
            Err(SystemError::Token(TokenError::NonPositiveQuantity(_)))
        ));
    }

    #[test]
    fn test_deferred_authority() {
        let host = MemoryHost::new(0);
        let config = SystemConfig::default();
        let tx = Transaction::new(&host, &host, &config, 0);
        assert!(tx.require_auth("alice").is_err());

        let tx = tx.with_deferred_authority("alice");
        assert!(tx.require_auth("alice").is_ok());
        assert_eq!(
            tx.require_auth("bob"),
            Err(SystemError::AuthorizationDenied {
                account: "bob".to_string()
            })
        );
    }
}
