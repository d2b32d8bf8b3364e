//! System contract error types

use economics::MarketError;
use sysres_core::{TimePointSec, TokenError};
use thiserror::Error;

/// Every failure aborts the whole call; nothing is retried internally
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    #[error("Missing authority of {account}")]
    AuthorizationDenied { account: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Resource market is closed and {account} is not privileged")]
    MarketClosed { account: String },

    #[error("Insufficient staked balance: {0}")]
    InsufficientBalance(String),

    #[error("Insufficient RAM quota for {account}: requested {requested}, available {available}")]
    InsufficientQuota {
        account: String,
        requested: i64,
        available: i64,
    },

    #[error("Net and cpu deltas cannot be opposite signs (net {net}, cpu {cpu})")]
    OppositeSignDeltas { net: i64, cpu: i64 },

    #[error("Voting stake of {account} cannot be negative")]
    NegativeVotingStake { account: String },

    #[error("{account} can only claim its tokens over the vesting schedule: staked {staked}, locked {locked}")]
    VestingCapExceeded {
        account: String,
        staked: i64,
        locked: i64,
    },

    #[error("Cannot unstake {requested} at the moment, {available} available")]
    EscrowInsufficient { requested: i64, available: i64 },

    #[error("Network not activated: {activated} activated, {required} required")]
    NetworkNotActivated { activated: i64, required: i64 },

    #[error("Refund request not found: {0}")]
    RefundNotFound(String),

    #[error("Refund is not available until {available_at} (now {now})")]
    RefundNotMature {
        available_at: TimePointSec,
        now: TimePointSec,
    },

    #[error("Trade too small: {0}")]
    MarketDust(String),

    #[error("No delegation from {from} to {to}")]
    DelegationNotFound { from: String, to: String },

    #[error("RAM market has not been initialized")]
    MarketNotInitialized,

    #[error("RAM market is already initialized")]
    AlreadyInitialized,

    #[error("Accounting violation: {0}")]
    AccountingViolation(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),
}

pub type Result<T> = std::result::Result<T, SystemError>;
