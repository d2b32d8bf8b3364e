//! Token quantities and symbols
//!
//! Amounts are signed integers in the smallest unit of their symbol, so a
//! quantity of `1.0000 SYS` is stored as `10_000` with precision 4.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AssetParseError;

const MAX_PRECISION: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub code: String,
    pub precision: u8,
}

impl Symbol {
    pub fn new(code: impl Into<String>, precision: u8) -> Self {
        Self {
            code: code.into(),
            precision,
        }
    }

    /// Storage bytes traded on the RAM market
    pub fn ram() -> Self {
        Self::new("RAM", 0)
    }

    /// Intermediate supply token of the RAM market
    pub fn ram_core() -> Self {
        Self::new("RAMCORE", 4)
    }

    /// Units per whole token (`10^precision`)
    pub fn scale(&self) -> u64 {
        10u64.pow(u32::from(self.precision))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self::new(0, symbol)
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Same symbol, different amount
    pub fn with_amount(&self, amount: i64) -> Self {
        Self::new(amount, self.symbol.clone())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = usize::from(self.symbol.precision);
        if precision == 0 {
            return write!(f, "{} {}", self.amount, self.symbol.code);
        }

        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let scale = self.symbol.scale();
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.symbol.code,
            width = precision
        )
    }
}

impl FromStr for Asset {
    type Err = AssetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (amount_str, code) = match (parts.next(), parts.next(), parts.next()) {
            (Some(amount), Some(code), None) => (amount, code),
            _ => return Err(AssetParseError::Format(s.to_string())),
        };

        if code.is_empty() || code.len() > 7 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AssetParseError::Symbol(code.to_string()));
        }

        let (negative, digits) = match amount_str.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount_str),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
            return Err(AssetParseError::Amount(amount_str.to_string()));
        }
        if digits.contains('.') && fraction.is_empty() {
            return Err(AssetParseError::Amount(amount_str.to_string()));
        }
        if fraction.len() > MAX_PRECISION {
            return Err(AssetParseError::Precision(fraction.len()));
        }

        let overflow = || AssetParseError::Overflow(amount_str.to_string());
        let precision = fraction.len() as u8;
        let symbol = Symbol::new(code, precision);
        let whole: i64 = whole.parse().map_err(|_| overflow())?;
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| overflow())?
        };

        let magnitude = whole
            .checked_mul(symbol.scale() as i64)
            .and_then(|units| units.checked_add(fraction))
            .ok_or_else(overflow)?;

        Ok(Asset::new(
            if negative { -magnitude } else { magnitude },
            symbol,
        ))
    }
}
