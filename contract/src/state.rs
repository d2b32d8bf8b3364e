//! Persisted contract state
//!
//! Every entry point receives the whole `SystemState` explicitly. Calls run
//! against a working copy, and a committed call bumps `global.version`, so a
//! reader holding an older version can tell it is stale.

use economics::ExchangeState;
use serde::{Deserialize, Serialize};

use crate::delegation::DelegationTable;
use crate::error::{Result, SystemError};
use crate::escrow::EscrowTable;
use crate::refunds::{Outbox, RefundTable};
use crate::resources::ResourceTable;
use crate::voting::VoterTable;

/// Network-wide aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    pub version: u64,
    pub max_ram_size: u64,
    pub total_ram_bytes_reserved: u64,
    /// Tokens held against reserved RAM
    pub total_ram_stake: i64,
    /// Stake taking part in producer voting
    pub total_activated_stake: i64,
    pub resources_market_open: bool,
}

impl GlobalState {
    pub fn free_ram(&self) -> u64 {
        self.max_ram_size.saturating_sub(self.total_ram_bytes_reserved)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub global: GlobalState,
    /// Created by `init`
    pub market: Option<ExchangeState>,
    pub resources: ResourceTable,
    pub delegations: DelegationTable,
    pub escrows: EscrowTable,
    pub refunds: RefundTable,
    pub outbox: Outbox,
    pub voters: VoterTable,
}

impl SystemState {
    pub fn is_initialized(&self) -> bool {
        self.market.is_some()
    }

    pub fn market(&self) -> Result<&ExchangeState> {
        self.market.as_ref().ok_or(SystemError::MarketNotInitialized)
    }

    pub fn market_mut(&mut self) -> Result<&mut ExchangeState> {
        self.market.as_mut().ok_or(SystemError::MarketNotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_state() {
        let mut state = SystemState::default();
        assert!(!state.is_initialized());
        assert_eq!(state.market().unwrap_err(), SystemError::MarketNotInitialized);
        assert!(state.market_mut().is_err());
        assert_eq!(state.global.version, 0);
    }

    #[test]
    fn test_free_ram() {
        let global = GlobalState {
            max_ram_size: 1_000,
            total_ram_bytes_reserved: 400,
            ..GlobalState::default()
        };
        assert_eq!(global.free_ram(), 600);
    }
}
