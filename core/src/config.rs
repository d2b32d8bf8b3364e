//! System contract configuration
//!
//! Every field has a default so a configuration file only needs to name the
//! values it changes:
//!
//! ```toml
//! system_account = "sys"
//! refund_delay_sec = 259200
//!
//! [core_symbol]
//! code = "SYS"
//! precision = 4
//! ```

use serde::{Deserialize, Serialize};

use crate::asset::Symbol;
use crate::constants;
use crate::host::{AccountName, TimePointSec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Token staked for bandwidth and paid for RAM
    pub core_symbol: Symbol,

    /// Account whose authority administers the market
    pub system_account: AccountName,

    /// Receives the tokens backing purchased RAM
    pub ram_pool: AccountName,

    /// Receives the 0.5% RAM trading fees
    pub ram_fee_pool: AccountName,

    /// Holds staked bandwidth tokens until they are refunded
    pub stake_pool: AccountName,

    pub refund_delay_sec: u32,

    /// Length of one escrow release period
    pub escrow_period_sec: u32,

    /// Percent of token supply that must be activated before undelegation
    pub activation_threshold_percent: u8,

    /// Account whose stake unlocks linearly over a fixed schedule
    pub legacy_vesting: Option<LegacyVesting>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            core_symbol: Symbol::new("SYS", constants::CORE_PRECISION),
            system_account: "sys".to_string(),
            ram_pool: "sys.ram".to_string(),
            ram_fee_pool: "sys.ramfee".to_string(),
            stake_pool: "sys.stake".to_string(),
            refund_delay_sec: constants::REFUND_DELAY_SEC,
            escrow_period_sec: constants::ESCROW_PERIOD_SEC,
            activation_threshold_percent: constants::ACTIVATION_THRESHOLD_PERCENT,
            legacy_vesting: None,
        }
    }
}

impl SystemConfig {
    /// Check values the contract divides by or compares against
    pub fn validate(&self) -> Result<(), String> {
        if self.escrow_period_sec == 0 {
            return Err("escrow_period_sec must be positive".to_string());
        }
        if self.activation_threshold_percent > 100 {
            return Err(format!(
                "activation_threshold_percent must be at most 100, got {}",
                self.activation_threshold_percent
            ));
        }
        let pools = [&self.ram_pool, &self.ram_fee_pool, &self.stake_pool];
        if pools.iter().any(|pool| pool.is_empty()) {
            return Err("pool account names must not be empty".to_string());
        }
        if let Some(vesting) = &self.legacy_vesting {
            if vesting.duration_sec == 0 {
                return Err("legacy_vesting.duration_sec must be positive".to_string());
            }
        }
        Ok(())
    }

    /// Stake that must be activated network-wide for `supply` tokens
    pub fn min_activated_stake(&self, supply: i64) -> i64 {
        (i128::from(supply) * i128::from(self.activation_threshold_percent) / 100) as i64
    }
}

/// Linear unlock schedule applied to one account's voting stake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyVesting {
    pub account: AccountName,
    pub base_time: TimePointSec,
    pub max_claimable: i64,
    pub duration_sec: u64,
}

impl Default for LegacyVesting {
    fn default() -> Self {
        Self {
            account: "b1".to_string(),
            base_time: 1_527_811_200, // 2018-06-01
            max_claimable: 1_000_000_000_000,
            duration_sec: 10 * constants::SECONDS_PER_YEAR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refund_delay_sec, 3 * 24 * 3600);
        assert_eq!(config.core_symbol.precision, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SystemConfig =
            serde_json::from_str(r#"{"stake_pool": "bank.stake"}"#).unwrap();
        assert_eq!(config.stake_pool, "bank.stake");
        assert_eq!(config.ram_pool, "sys.ram");
        assert!(config.legacy_vesting.is_none());
    }

    #[test]
    fn test_min_activated_stake() {
        let config = SystemConfig::default();
        assert_eq!(config.min_activated_stake(15_000_000_000_000), 1_500_000_000_000);
        assert_eq!(config.min_activated_stake(0), 0);
    }

    #[test]
    fn test_rejects_zero_escrow_period() {
        let config = SystemConfig {
            escrow_period_sec: 0,
            ..SystemConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
