//! Bancor exchange between storage bytes and the core token
//!
//! Two connectors (RAM bytes as `base`, the core token as `quote`) are
//! linked through an intermediate supply token. Converting RAM to tokens
//! first issues supply against the RAM connector and then redeems that
//! supply against the token connector, and vice versa.
//!
//! The arithmetic is done in `f64` and every result is truncated toward
//! zero; the truncation is part of the price and must not be replaced by
//! rounding.

use log::debug;
use serde::{Deserialize, Serialize};
use sysres_core::{Asset, Symbol};

use crate::constants::{CONNECTOR_WEIGHT, QUOTE_RESERVE_DIVISOR, RAMCORE_INITIAL_SUPPLY};
use crate::error::{MarketError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub balance: Asset,
    pub weight: f64,
}

impl Connector {
    pub fn new(balance: Asset, weight: f64) -> Self {
        Self { balance, weight }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeState {
    pub supply: Asset,
    pub base: Connector,
    pub quote: Connector,
}

impl ExchangeState {
    /// RAM market seeded with the currently free bytes and 1/1000 of the
    /// token supply.
    pub fn ram_market(free_ram_bytes: i64, token_supply: &Asset) -> Self {
        Self {
            supply: Asset::new(RAMCORE_INITIAL_SUPPLY, Symbol::ram_core()),
            base: Connector::new(Asset::new(free_ram_bytes, Symbol::ram()), CONNECTOR_WEIGHT),
            quote: Connector::new(
                token_supply.with_amount(token_supply.amount / QUOTE_RESERVE_DIVISOR),
                CONNECTOR_WEIGHT,
            ),
        }
    }

    /// Convert `from` into `to`, moving the reserves.
    pub fn convert(&mut self, from: Asset, to: &Symbol) -> Result<Asset> {
        if from.amount < 0 {
            return Err(MarketError::NegativeInput(from.to_string()));
        }

        let mut current = from;
        loop {
            current = if current.symbol != self.supply.symbol {
                if current.symbol == self.base.balance.symbol {
                    convert_to_exchange(&mut self.supply, &mut self.base, &current)?
                } else if current.symbol == self.quote.balance.symbol {
                    convert_to_exchange(&mut self.supply, &mut self.quote, &current)?
                } else {
                    return Err(MarketError::InvalidSell(current.symbol.to_string()));
                }
            } else if *to == self.base.balance.symbol {
                convert_from_exchange(&mut self.supply, &mut self.base, &current)?
            } else if *to == self.quote.balance.symbol {
                convert_from_exchange(&mut self.supply, &mut self.quote, &current)?
            } else {
                return Err(MarketError::InvalidConversion {
                    from: current.symbol.to_string(),
                    to: to.to_string(),
                });
            };

            if current.symbol == *to {
                return Ok(current);
            }
        }
    }

    /// Result of a conversion without touching this market
    pub fn preview(&self, from: &Asset, to: &Symbol) -> Result<Asset> {
        self.clone().convert(from.clone(), to)
    }

    /// Spend `tokens` on bytes; returns the bytes issued
    pub fn buy_bytes(&mut self, tokens: &Asset) -> Result<i64> {
        let ram = self.base.balance.symbol.clone();
        let bytes = self.convert(tokens.clone(), &ram)?;
        debug!("market: {} bought {} bytes", tokens, bytes.amount);
        Ok(bytes.amount)
    }

    /// Return `bytes` to the market; returns the tokens paid out
    pub fn sell_bytes(&mut self, bytes: i64) -> Result<Asset> {
        let token = self.quote.balance.symbol.clone();
        let ram = self.base.balance.symbol.clone();
        let tokens = self.convert(Asset::new(bytes, ram), &token)?;
        debug!("market: {} bytes sold for {}", bytes, tokens);
        Ok(tokens)
    }

    /// Token value of `bytes` at the current price, as used to price
    /// purchases of an exact byte count
    pub fn tokens_for_bytes(&self, bytes: i64) -> Result<Asset> {
        self.preview(
            &Asset::new(bytes, self.base.balance.symbol.clone()),
            &self.quote.balance.symbol,
        )
    }

    /// Bytes `tokens` would buy at the current price
    pub fn bytes_for_tokens(&self, tokens: &Asset) -> Result<i64> {
        Ok(self.preview(tokens, &self.base.balance.symbol)?.amount)
    }

    /// Grow the byte reserve when more RAM is made available
    pub fn add_ram_reserve(&mut self, bytes: i64) -> Result<()> {
        self.base.balance.amount = self
            .base
            .balance
            .amount
            .checked_add(bytes)
            .ok_or_else(|| MarketError::ReserveExhausted(self.base.balance.to_string()))?;
        Ok(())
    }
}

fn convert_to_exchange(supply: &mut Asset, connector: &mut Connector, input: &Asset) -> Result<Asset> {
    let new_balance = connector
        .balance
        .amount
        .checked_add(input.amount)
        .ok_or_else(|| MarketError::ReserveExhausted(connector.balance.to_string()))?;

    let r = supply.amount as f64;
    let c = new_balance as f64;
    let f = connector.weight / 1000.0;
    let t = input.amount as f64;
    let e = -r * (1.0 - (1.0 + t / c).powf(f));
    let issued = e as i64;

    supply.amount = supply
        .amount
        .checked_add(issued)
        .ok_or_else(|| MarketError::ReserveExhausted(supply.to_string()))?;
    connector.balance.amount = new_balance;
    Ok(Asset::new(issued, supply.symbol.clone()))
}

fn convert_from_exchange(supply: &mut Asset, connector: &mut Connector, input: &Asset) -> Result<Asset> {
    if input.amount >= supply.amount {
        return Err(MarketError::ReserveExhausted(supply.to_string()));
    }

    let r = (supply.amount - input.amount) as f64;
    let c = connector.balance.amount as f64;
    let f = 1000.0 / connector.weight;
    let e = input.amount as f64;
    let t = c * ((1.0 + e / r).powf(f) - 1.0);
    let out = t as i64;

    if out > connector.balance.amount {
        return Err(MarketError::ReserveExhausted(connector.balance.to_string()));
    }
    supply.amount -= input.amount;
    connector.balance.amount -= out;
    Ok(Asset::new(out, connector.balance.symbol.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREE_RAM: i64 = 64 * 1024 * 1024 * 1024;

    fn sys(amount: i64) -> Asset {
        Asset::new(amount, Symbol::new("SYS", 4))
    }

    fn market() -> ExchangeState {
        ExchangeState::ram_market(FREE_RAM, &sys(10_000_000_000_000))
    }

    #[test]
    fn test_ram_market_seed() {
        let market = market();
        assert_eq!(market.supply.amount, RAMCORE_INITIAL_SUPPLY);
        assert_eq!(market.base.balance, Asset::new(FREE_RAM, Symbol::ram()));
        assert_eq!(market.quote.balance, sys(10_000_000_000));
    }

    #[test]
    fn test_buy_moves_reserves() {
        let mut market = market();
        let bytes = market.buy_bytes(&sys(199)).unwrap();

        assert!(bytes > 0);
        assert_eq!(market.base.balance.amount, FREE_RAM - bytes);
        assert_eq!(market.quote.balance.amount, 10_000_000_000 + 199);
        // supply issued on the way in is redeemed on the way out
        assert_eq!(market.supply.amount, RAMCORE_INITIAL_SUPPLY);
    }

    #[test]
    fn test_round_trip_never_profits() {
        let mut market = market();
        for paid in [2, 199, 10_000, 5_000_000] {
            let bytes = market.buy_bytes(&sys(paid)).unwrap();
            let back = market.sell_bytes(bytes).unwrap();
            assert!(back.amount <= paid, "paid {} got {}", paid, back.amount);
        }
    }

    #[test]
    fn test_price_rises_with_demand() {
        let mut market = market();
        let mut previous = i64::MAX;
        for _ in 0..20 {
            let bytes = market.buy_bytes(&sys(100_000_000)).unwrap();
            assert!(bytes <= previous);
            previous = bytes;
        }
    }

    #[test]
    fn test_quote_does_not_mutate() {
        let market = market();
        let cost = market.tokens_for_bytes(1024).unwrap();
        assert!(cost.amount > 0);
        assert_eq!(cost.symbol, Symbol::new("SYS", 4));
        assert!(market.bytes_for_tokens(&cost).unwrap() > 0);
        assert_eq!(market, self::market());
    }

    #[test]
    fn test_invalid_symbols() {
        let mut market = market();
        let foo = Asset::new(10, Symbol::new("FOO", 0));
        assert!(matches!(
            market.convert(foo, &Symbol::ram()),
            Err(MarketError::InvalidSell(_))
        ));

        let core = Asset::new(10, Symbol::ram_core());
        assert!(matches!(
            market.convert(core, &Symbol::ram_core()),
            Err(MarketError::InvalidConversion { .. })
        ));

        assert!(matches!(
            market.convert(sys(-1), &Symbol::ram()),
            Err(MarketError::NegativeInput(_))
        ));
    }

    #[test]
    fn test_add_ram_reserve_lowers_price() {
        let mut market = market();
        let before = market.tokens_for_bytes(1_000_000).unwrap();
        market.add_ram_reserve(FREE_RAM).unwrap();
        let after = market.tokens_for_bytes(1_000_000).unwrap();
        assert!(after.amount < before.amount);
    }
}
