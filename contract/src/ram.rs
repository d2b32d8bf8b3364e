//! RAM market administration and trading
//!
//! Buying moves tokens to the RAM pool and credits bytes to the receiver;
//! selling does the reverse at the current price. Both directions pay the
//! 0.5% fee to the fee pool.

use economics::{ram_fee, ExchangeState};
use log::{debug, info};
use sysres_core::Asset;

use crate::constants::memo;
use crate::effects::Transaction;
use crate::error::{Result, SystemError};
use crate::state::SystemState;

/// Create the market from the current token supply
pub fn init_market(state: &mut SystemState, tx: &mut Transaction<'_>, max_ram_size: u64) -> Result<()> {
    let config = tx.config();
    tx.require_auth(&config.system_account)?;
    if state.is_initialized() {
        return Err(SystemError::AlreadyInitialized);
    }

    let supply = tx.token_supply(&config.core_symbol);
    if supply <= 0 {
        return Err(SystemError::InvalidAmount(format!(
            "no {} supply to back the RAM market",
            config.core_symbol
        )));
    }
    let free = byte_count(max_ram_size)?;

    state.global.max_ram_size = max_ram_size;
    state.global.total_ram_bytes_reserved = 0;
    state.market = Some(ExchangeState::ram_market(
        free,
        &Asset::new(supply, config.core_symbol.clone()),
    ));
    info!("RAM market initialized with {} bytes against supply {}", max_ram_size, supply);
    Ok(())
}

/// Raise the amount of RAM on sale
pub fn set_ram(state: &mut SystemState, tx: &mut Transaction<'_>, max_ram_size: u64) -> Result<()> {
    tx.require_auth(&tx.config().system_account)?;

    let global = &state.global;
    if max_ram_size < global.total_ram_bytes_reserved {
        return Err(SystemError::InvalidAmount(format!(
            "max ram size {} is below the {} bytes already reserved",
            max_ram_size, global.total_ram_bytes_reserved
        )));
    }
    if max_ram_size < global.max_ram_size {
        return Err(SystemError::InvalidAmount(format!(
            "ram may only be increased, current size {}",
            global.max_ram_size
        )));
    }

    let added = byte_count(max_ram_size - global.max_ram_size)?;
    state.market_mut()?.add_ram_reserve(added)?;
    state.global.max_ram_size = max_ram_size;
    info!("max ram size set to {} (+{} bytes)", max_ram_size, added);
    Ok(())
}

/// Open or close RAM and bandwidth trading for unprivileged accounts
pub fn set_market_open(state: &mut SystemState, tx: &mut Transaction<'_>, open: bool) -> Result<()> {
    tx.require_auth(&tx.config().system_account)?;
    state.global.resources_market_open = open;
    info!("resource market {}", if open { "opened" } else { "closed" });
    Ok(())
}

/// Buy an exact number of bytes at the current price
pub fn buy_ram_bytes(
    state: &mut SystemState,
    tx: &mut Transaction<'_>,
    payer: &str,
    receiver: &str,
    bytes: u32,
) -> Result<()> {
    let cost = state.market()?.tokens_for_bytes(i64::from(bytes))?;
    debug!("{} bytes priced at {}", bytes, cost);
    buy_ram(state, tx, payer, receiver, &cost)
}

pub fn buy_ram(
    state: &mut SystemState,
    tx: &mut Transaction<'_>,
    payer: &str,
    receiver: &str,
    quant: &Asset,
) -> Result<()> {
    let config = tx.config();
    tx.require_auth(payer)?;
    if quant.symbol != config.core_symbol {
        return Err(SystemError::InvalidAmount(format!(
            "RAM is paid in {}, got {}",
            config.core_symbol, quant
        )));
    }
    if quant.amount <= 0 {
        return Err(SystemError::InvalidAmount(
            "must purchase a positive amount".to_string(),
        ));
    }
    if !state.global.resources_market_open && !tx.is_privileged(payer) {
        return Err(SystemError::MarketClosed {
            account: payer.to_string(),
        });
    }

    let fee = ram_fee(quant.amount);
    let after_fee = quant.with_amount(quant.amount - fee);

    // a zero amount after the fee fails here
    tx.transfer(payer, &config.ram_pool, after_fee.clone(), memo::BUY_RAM)?;
    if fee > 0 {
        tx.transfer(payer, &config.ram_fee_pool, quant.with_amount(fee), memo::RAM_FEE)?;
    }

    let bytes = state.market_mut()?.buy_bytes(&after_fee)?;
    if bytes <= 0 {
        return Err(SystemError::MarketDust(format!(
            "{} does not buy a positive amount of RAM",
            after_fee
        )));
    }

    let global = &mut state.global;
    global.total_ram_bytes_reserved = global
        .total_ram_bytes_reserved
        .checked_add(bytes.unsigned_abs())
        .ok_or_else(|| SystemError::AccountingViolation("reserved ram overflows".to_string()))?;
    global.total_ram_stake = global
        .total_ram_stake
        .checked_add(after_fee.amount)
        .ok_or_else(|| SystemError::AccountingViolation("ram stake overflows".to_string()))?;

    let row = state.resources.add_ram(receiver, bytes)?;
    tx.set_resource_limits(&row);
    debug!("{} bought {} bytes for {} ({} fee)", receiver, bytes, after_fee, fee);
    Ok(())
}

pub fn sell_ram(state: &mut SystemState, tx: &mut Transaction<'_>, account: &str, bytes: i64) -> Result<()> {
    let config = tx.config();
    tx.require_auth(account)?;
    if bytes <= 0 {
        return Err(SystemError::InvalidAmount("cannot sell negative byte".to_string()));
    }
    let quota = state.resources.get(account).map(|row| row.ram_bytes).unwrap_or(0);
    if bytes > quota {
        return Err(SystemError::InsufficientQuota {
            account: account.to_string(),
            requested: bytes,
            available: quota,
        });
    }

    let tokens = state.market_mut()?.sell_bytes(bytes)?;
    if tokens.amount <= 1 {
        return Err(SystemError::MarketDust(format!(
            "selling {} bytes returns only {}",
            bytes, tokens
        )));
    }

    let global = &mut state.global;
    global.total_ram_bytes_reserved = global
        .total_ram_bytes_reserved
        .checked_sub(bytes.unsigned_abs())
        .ok_or_else(|| SystemError::AccountingViolation("reserved ram underflows".to_string()))?;
    global.total_ram_stake -= tokens.amount;
    if global.total_ram_stake < 0 {
        return Err(SystemError::AccountingViolation(
            "attempt to unstake more tokens than previously staked".to_string(),
        ));
    }

    let row = state.resources.remove_ram(account, bytes)?;
    tx.set_resource_limits(&row);

    let fee = ram_fee(tokens.amount);
    tx.transfer(&config.ram_pool, account, tokens.clone(), memo::SELL_RAM)?;
    if fee > 0 {
        tx.transfer(account, &config.ram_fee_pool, tokens.with_amount(fee), memo::SELL_RAM_FEE)?;
    }
    debug!("{} sold {} bytes for {} ({} fee)", account, bytes, tokens, fee);
    Ok(())
}

fn byte_count(bytes: u64) -> Result<i64> {
    i64::try_from(bytes).map_err(|_| SystemError::InvalidAmount(format!("{} bytes is out of range", bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysres_core::{MemoryHost, Symbol, SystemConfig};

    const FREE_RAM: u64 = 64 * 1024 * 1024 * 1024;

    fn sys(amount: i64) -> Asset {
        Asset::new(amount, Symbol::new("SYS", 4))
    }

    fn host() -> MemoryHost {
        let mut host = MemoryHost::new(1_000);
        host.issue("sys", &sys(10_000_000_000_000 - 1_000_000)).unwrap();
        host.issue("alice", &sys(1_000_000)).unwrap();
        host.sign_as(["sys", "alice"]);
        host
    }

    fn opened(host: &MemoryHost, config: &SystemConfig) -> SystemState {
        let mut state = SystemState::default();
        let mut tx = Transaction::new(host, host, config, 1_000);
        init_market(&mut state, &mut tx, FREE_RAM).unwrap();
        set_market_open(&mut state, &mut tx, true).unwrap();
        state
    }

    #[test]
    fn test_init_only_once() {
        let host = host();
        let config = SystemConfig::default();
        let mut state = opened(&host, &config);
        let mut tx = Transaction::new(&host, &host, &config, 1_000);
        assert_eq!(
            init_market(&mut state, &mut tx, FREE_RAM),
            Err(SystemError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_buy_stages_payment_and_fee() {
        let host = host();
        let config = SystemConfig::default();
        let mut state = opened(&host, &config);
        let mut tx = Transaction::new(&host, &host, &config, 1_000);

        buy_ram(&mut state, &mut tx, "alice", "alice", &sys(200)).unwrap();

        assert_eq!(state.resources.get("alice").map(|r| r.ram_bytes), Some(1367));
        assert_eq!(state.global.total_ram_bytes_reserved, 1367);
        assert_eq!(state.global.total_ram_stake, 199);
        assert_eq!(tx.balance("sys.ram", &config.core_symbol), 199);
        assert_eq!(tx.balance("sys.ramfee", &config.core_symbol), 1);
    }

    #[test]
    fn test_one_unit_cannot_buy() {
        let host = host();
        let config = SystemConfig::default();
        let mut state = opened(&host, &config);
        let mut tx = Transaction::new(&host, &host, &config, 1_000);

        // the whole unit goes to the fee, leaving nothing to convert
        assert!(matches!(
            buy_ram(&mut state, &mut tx, "alice", "alice", &sys(1)),
            Err(SystemError::Token(_))
        ));
    }

    #[test]
    fn test_sell_dust_rejected() {
        let host = host();
        let config = SystemConfig::default();
        let mut state = opened(&host, &config);
        let mut tx = Transaction::new(&host, &host, &config, 1_000);

        buy_ram(&mut state, &mut tx, "alice", "alice", &sys(200)).unwrap();
        assert!(matches!(
            sell_ram(&mut state, &mut tx, "alice", 5),
            Err(SystemError::MarketDust(_))
        ));
    }

    #[test]
    fn test_set_ram_only_grows() {
        let host = host();
        let config = SystemConfig::default();
        let mut state = opened(&host, &config);
        let mut tx = Transaction::new(&host, &host, &config, 1_000);

        assert!(matches!(
            set_ram(&mut state, &mut tx, FREE_RAM - 1),
            Err(SystemError::InvalidAmount(_))
        ));
        set_ram(&mut state, &mut tx, FREE_RAM + 1024).unwrap();
        assert_eq!(state.global.max_ram_size, FREE_RAM + 1024);
        assert_eq!(
            state.market().map(|m| m.base.balance.amount).unwrap(),
            (FREE_RAM + 1024) as i64
        );
    }
}
