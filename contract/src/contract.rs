//! System contract entry points
//!
//! Each call runs against a clone of the state. The operation stages its
//! host side effects in a [`Transaction`]; only when it returns `Ok` are the
//! effects dispatched to the host and the working state committed with the
//! next version. A failed call leaves state, ledger and outbox untouched.

use economics::ExchangeState;
use log::{info, warn};
use sysres_core::{Asset, Host, SystemConfig, VoterInfo};

use crate::bandwidth;
use crate::delegation::DelegatedBandwidth;
use crate::effects::{Effect, Receipt, Transaction};
use crate::error::{Result, SystemError};
use crate::escrow::EscrowGrant;
use crate::ram;
use crate::refunds::{DeferredAction, DeferredJob, RefundRequest};
use crate::resources::UserResources;
use crate::state::{GlobalState, SystemState};

pub struct SystemContract<H: Host> {
    config: SystemConfig,
    state: SystemState,
    host: H,
}

impl<H: Host> SystemContract<H> {
    pub fn new(config: SystemConfig, host: H) -> Result<Self> {
        Self::from_parts(config, SystemState::default(), host)
    }

    /// Resume from persisted state
    pub fn from_parts(config: SystemConfig, state: SystemState, host: H) -> Result<Self> {
        config.validate().map_err(SystemError::InvalidAmount)?;
        Ok(Self {
            config,
            state,
            host,
        })
    }

    pub fn into_parts(self) -> (SystemConfig, SystemState, H) {
        (self.config, self.state, self.host)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Create the RAM market with `max_ram_size` bytes on sale
    pub fn init(&mut self, max_ram_size: u64) -> Result<Receipt> {
        self.commit("init", None, |state, tx| {
            ram::init_market(state, tx, max_ram_size)
        })
    }

    pub fn set_ram(&mut self, max_ram_size: u64) -> Result<Receipt> {
        self.execute("setram", |state, tx| ram::set_ram(state, tx, max_ram_size))
    }

    pub fn set_market_open(&mut self, open: bool) -> Result<Receipt> {
        self.execute("setmarket", |state, tx| {
            ram::set_market_open(state, tx, open)
        })
    }

    /// Record the stake taking part in voting, as reported by the election
    pub fn set_activated_stake(&mut self, activated: i64) -> Result<Receipt> {
        self.execute("setactivated", |state, tx| {
            tx.require_auth(&tx.config().system_account)?;
            if activated < 0 {
                return Err(SystemError::InvalidAmount(format!(
                    "activated stake cannot be negative: {}",
                    activated
                )));
            }
            state.global.total_activated_stake = activated;
            Ok(())
        })
    }

    pub fn buy_ram_bytes(&mut self, payer: &str, receiver: &str, bytes: u32) -> Result<Receipt> {
        self.execute("buyrambytes", |state, tx| {
            ram::buy_ram_bytes(state, tx, payer, receiver, bytes)
        })
    }

    pub fn buy_ram(&mut self, payer: &str, receiver: &str, quant: Asset) -> Result<Receipt> {
        self.execute("buyram", |state, tx| {
            ram::buy_ram(state, tx, payer, receiver, &quant)
        })
    }

    pub fn sell_ram(&mut self, account: &str, bytes: i64) -> Result<Receipt> {
        self.execute("sellram", |state, tx| ram::sell_ram(state, tx, account, bytes))
    }

    pub fn delegate_bandwidth(
        &mut self,
        from: &str,
        receiver: &str,
        stake_net: Asset,
        stake_cpu: Asset,
        transfer: bool,
    ) -> Result<Receipt> {
        self.execute("delegatebw", |state, tx| {
            bandwidth::delegate(state, tx, from, receiver, &stake_net, &stake_cpu, transfer)
        })
    }

    /// Withdraw stake `from` delegated to `receiver`; the tokens go to
    /// `from`'s refund bucket
    pub fn undelegate_bandwidth(
        &mut self,
        from: &str,
        receiver: &str,
        unstake_net: Asset,
        unstake_cpu: Asset,
    ) -> Result<Receipt> {
        self.execute("undelegatebw", |state, tx| {
            bandwidth::undelegate(state, tx, from, receiver, &unstake_net, &unstake_cpu)
        })
    }

    pub fn escrow_bandwidth(
        &mut self,
        from: &str,
        receiver: &str,
        stake_net: Asset,
        stake_cpu: Asset,
        transfer: bool,
        period_count: u8,
    ) -> Result<Receipt> {
        self.execute("escrowbw", |state, tx| {
            bandwidth::escrow(
                state,
                tx,
                from,
                receiver,
                &stake_net,
                &stake_cpu,
                transfer,
                period_count,
            )
        })
    }

    pub fn refund(&mut self, owner: &str) -> Result<Receipt> {
        self.execute("refund", |state, tx| bandwidth::settle_refund(state, tx, owner))
    }

    /// Execute every due outbox job as its own call.
    ///
    /// A failing job is dropped from the outbox; the caller gets receipts of
    /// the jobs that succeeded.
    pub fn run_deferred(&mut self) -> Vec<Receipt> {
        let due = self.state.outbox.due(self.host.now());
        let mut receipts = Vec::with_capacity(due.len());

        for job in due {
            let DeferredJob {
                account, action, ..
            } = &job;
            let result = match action {
                DeferredAction::Refund => self.commit("refund", Some(account.as_str()), |state, tx| {
                    bandwidth::settle_refund(state, tx, account)
                }),
            };

            match result {
                Ok(receipt) => receipts.push(receipt),
                Err(err) => {
                    warn!("dropping deferred {:?} for {}: {}", action, account, err);
                    self.state.outbox.cancel(account);
                    self.state.global.version += 1;
                }
            }
        }
        receipts
    }

    pub fn pending_jobs(&self) -> impl Iterator<Item = &DeferredJob> {
        self.state.outbox.iter()
    }

    pub fn global(&self) -> &GlobalState {
        &self.state.global
    }

    pub fn ram_market(&self) -> Option<&ExchangeState> {
        self.state.market.as_ref()
    }

    pub fn user_resources(&self, owner: &str) -> Option<&UserResources> {
        self.state.resources.get(owner)
    }

    pub fn delegation(&self, from: &str, to: &str) -> Option<&DelegatedBandwidth> {
        self.state.delegations.get(from, to)
    }

    pub fn refund_request(&self, owner: &str) -> Option<&RefundRequest> {
        self.state.refunds.get(owner)
    }

    pub fn escrow_grants<'a>(&'a self, staker: &str, owner: &'a str) -> Vec<&'a EscrowGrant> {
        self.state.escrows.grants(staker, owner).collect()
    }

    pub fn voter(&self, owner: &str) -> Option<&VoterInfo> {
        self.state.voters.get(owner)
    }

    /// Stake `from` could withdraw from `receiver` right now
    pub fn available_to_unstake(&self, from: &str, receiver: &str) -> i64 {
        let delegated = self
            .state
            .delegations
            .get(from, receiver)
            .map(DelegatedBandwidth::total)
            .unwrap_or(0);
        self.state.escrows.available(
            from,
            receiver,
            delegated,
            self.host.now(),
            self.config.escrow_period_sec,
        )
    }

    fn execute<F>(&mut self, action: &str, op: F) -> Result<Receipt>
    where
        F: FnOnce(&mut SystemState, &mut Transaction<'_>) -> Result<()>,
    {
        if !self.state.is_initialized() {
            return Err(SystemError::MarketNotInitialized);
        }
        self.commit(action, None, op)
    }

    fn commit<F>(&mut self, action: &str, deferred_authority: Option<&str>, op: F) -> Result<Receipt>
    where
        F: FnOnce(&mut SystemState, &mut Transaction<'_>) -> Result<()>,
    {
        let mut working = self.state.clone();
        let effects = {
            let mut tx = Transaction::new(&self.host, &self.host, &self.config, self.host.now());
            if let Some(account) = deferred_authority {
                tx = tx.with_deferred_authority(account);
            }
            op(&mut working, &mut tx)?;
            tx.into_effects()
        };

        self.dispatch(&effects)?;

        working.global.version += 1;
        let version = working.global.version;
        self.state = working;
        info!("{} committed as version {}", action, version);

        Ok(Receipt {
            action: action.to_string(),
            version,
            effects,
        })
    }

    /// Hand staged effects to the host; transfers were checked while staging
    fn dispatch(&mut self, effects: &[Effect]) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::Transfer(transfer) => {
                    self.host
                        .transfer(&transfer.from, &transfer.to, &transfer.quantity, &transfer.memo)?;
                }
                Effect::SetResourceLimits {
                    account,
                    ram_bytes,
                    net_weight,
                    cpu_weight,
                } => {
                    self.host
                        .set_resource_limits(account, *ram_bytes, *net_weight, *cpu_weight);
                }
                Effect::UpdateVotes(voter) => self.host.update_votes(voter),
                Effect::ScheduleRefund { .. } | Effect::CancelRefund { .. } => {}
            }
        }
        Ok(())
    }
}
