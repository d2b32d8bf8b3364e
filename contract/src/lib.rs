//! System Contract
//!
//! Resource economy of the ledger:
//! - RAM bought and sold against the core token on a bancor market
//! - Network and CPU bandwidth staked by delegation
//! - Escrowed stake released in periodic tranches
//! - Unstaked tokens held in a refund bucket until the refund delay passes
//!
//! Token movements, resource limits, signatures and vote tallies belong to
//! the host (see [`sysres_core::Host`]); this crate only decides and stages
//! them.

pub mod bandwidth;
pub mod contract;
pub mod delegation;
pub mod effects;
pub mod error;
pub mod escrow;
pub mod ram;
pub mod refunds;
pub mod resources;
pub mod state;
pub mod voting;

pub use bandwidth::{Relationship, StakeDirection};
pub use contract::SystemContract;
pub use delegation::{DelegatedBandwidth, DelegationTable};
pub use effects::{Effect, Receipt, Transaction, Transfer};
pub use error::{Result, SystemError};
pub use escrow::{EscrowGrant, EscrowTable};
pub use refunds::{DeferredAction, DeferredJob, Outbox, RefundOutcome, RefundRequest, RefundTable};
pub use resources::{ResourceTable, UserResources};
pub use state::{GlobalState, SystemState};
pub use voting::VoterTable;

/// Contract constants
pub mod constants {
    /// Memos attached to the token transfers the contract stages
    pub mod memo {
        pub const BUY_RAM: &str = "buy ram";
        pub const RAM_FEE: &str = "ram fee";
        pub const SELL_RAM: &str = "sell ram";
        pub const SELL_RAM_FEE: &str = "sell ram fee";
        pub const STAKE_BANDWIDTH: &str = "stake bandwidth";
        pub const UNSTAKE: &str = "unstake";
    }
}
