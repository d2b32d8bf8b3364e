//! RAM market error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("Invalid sell: {0} is not traded on this market")]
    InvalidSell(String),

    #[error("Invalid conversion from {from} to {to}")]
    InvalidConversion { from: String, to: String },

    #[error("Reserve exhausted: {0}")]
    ReserveExhausted(String),

    #[error("Negative conversion input: {0}")]
    NegativeInput(String),
}

pub type Result<T> = std::result::Result<T, MarketError>;
