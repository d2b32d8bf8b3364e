//! RAM Market Economics
//!
//! Prices storage bytes against the core token:
//! - Bancor exchange between two connector reserves and a supply token
//! - 0.5% trading fee charged on both buys and sells
//!
//! Every trade moves the reserves, so the price is path dependent and the
//! curve is never reset between trades.

pub mod error;
pub mod exchange;
pub mod fees;

pub use error::{MarketError, Result};
pub use exchange::{Connector, ExchangeState};
pub use fees::ram_fee;

/// Market constants
pub mod constants {
    /// Initial supply of the intermediate RAMCORE token
    pub const RAMCORE_INITIAL_SUPPLY: i64 = 100_000_000_000_000;

    /// Portion of the token supply placed in the quote reserve (1/1000)
    pub const QUOTE_RESERVE_DIVISOR: i64 = 1000;

    /// Weight of both connectors
    pub const CONNECTOR_WEIGHT: f64 = 0.5;

    /// Fee divisor: 1/200 = 0.5%
    pub const RAM_FEE_DIVISOR: i64 = 200;
}

#[cfg(test)]
mod tests {
    use super::constants::*;

    #[test]
    fn test_market_constants() {
        assert_eq!(RAMCORE_INITIAL_SUPPLY, 10_i64.pow(14));
        assert_eq!(RAM_FEE_DIVISOR, 200);
        assert_eq!(CONNECTOR_WEIGHT, 0.5);
    }
}
