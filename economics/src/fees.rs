//! RAM trading fee

use crate::constants::RAM_FEE_DIVISOR;

/// 0.5% fee on `amount`, rounded up.
///
/// Any positive amount pays at least one unit, and for amounts above one
/// unit the fee is strictly smaller than the amount. Non-positive amounts
/// pay nothing.
pub fn ram_fee(amount: i64) -> i64 {
    if amount <= 0 {
        return 0;
    }
    amount / RAM_FEE_DIVISOR + i64::from(amount % RAM_FEE_DIVISOR != 0)
}
