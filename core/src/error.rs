//! Token ledger and asset parsing errors

use thiserror::Error;

/// Failures reported by a token ledger when moving balances
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance in {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: String,
        requested: i64,
        available: i64,
    },

    #[error("Transfer quantity must be positive: {0}")]
    NonPositiveQuantity(String),

    #[error("Cannot transfer to self: {0}")]
    SelfTransfer(String),

    #[error("Unknown token symbol: {0}")]
    UnknownSymbol(String),

    #[error("Balance overflow for {0}")]
    Overflow(String),
}

/// Failures parsing a quantity such as `"12.5000 SYS"`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetParseError {
    #[error("Expected `<amount> <SYMBOL>`, got {0:?}")]
    Format(String),

    #[error("Invalid amount: {0}")]
    Amount(String),

    #[error("Invalid symbol code: {0}")]
    Symbol(String),

    #[error("Precision {0} exceeds 18 decimal places")]
    Precision(usize),

    #[error("Amount out of range: {0}")]
    Overflow(String),
}
