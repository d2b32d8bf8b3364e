//! System Resources Core Library
//!
//! Shared primitives for the resource economy:
//! - Token quantities and symbols
//! - Interfaces of the collaborators the system contract relies on
//!   (token ledger, resource limits, permissions, clock, vote tally)
//! - Contract configuration
//! - In-memory host used by tests and the local simulator

pub mod asset;
pub mod config;
pub mod error;
pub mod host;
pub mod memory;

pub use asset::{Asset, Symbol};
pub use config::{LegacyVesting, SystemConfig};
pub use error::{AssetParseError, TokenError};
pub use host::{
    AccountName, Clock, Host, Permissions, ResourceLimits, SystemClock, TimePointSec, TokenLedger,
    VoteTally, VoterInfo,
};
pub use memory::{AccountLimits, MemoryHost, TransferRecord};

/// Time and supply constants shared across the workspace
pub mod constants {
    /// Seconds in one day
    pub const SECONDS_PER_DAY: u32 = 24 * 3600;

    /// A "year" as the vesting schedules count it (52 weeks)
    pub const SECONDS_PER_YEAR: u64 = 52 * 7 * 24 * 3600;

    /// Delay before unstaked tokens can be claimed (3 days)
    pub const REFUND_DELAY_SEC: u32 = 3 * SECONDS_PER_DAY;

    /// Length of one escrow release period (half a year of 365 days)
    pub const ESCROW_PERIOD_SEC: u32 = 15_768_000;

    /// Fraction of token supply (percent) that must be activated before undelegation
    pub const ACTIVATION_THRESHOLD_PERCENT: u8 = 10;

    /// Precision of the core token
    pub const CORE_PRECISION: u8 = 4;
}
