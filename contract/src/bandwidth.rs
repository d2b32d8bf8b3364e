//! Staking for network and CPU bandwidth
//!
//! All stake changes funnel through [`change_bandwidth`], which keeps the
//! delegation row, the beneficiary's resource totals, the staker's refund
//! bucket and voting stake consistent with each other.

use log::{debug, info};
use sysres_core::{AccountName, Asset};

use crate::constants::memo;
use crate::effects::{Effect, Transaction};
use crate::error::{Result, SystemError};
use crate::refunds::{DeferredAction, DeferredJob, RefundOutcome};
use crate::state::SystemState;
use crate::voting::validate_legacy_vesting;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeDirection {
    Stake,
    Unstake,
}

impl StakeDirection {
    fn of(total_delta: i64) -> Self {
        if total_delta < 0 {
            Self::Unstake
        } else {
            Self::Stake
        }
    }
}

/// Who pays, who owns the stake and who receives the bandwidth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub payer: AccountName,
    pub staker: AccountName,
    pub beneficiary: AccountName,
    pub transfer: bool,
}

impl Relationship {
    /// With `transfer` the stake is handed over to the receiver, who then
    /// owns it; the tokens still come from `from`.
    pub fn resolve(from: &str, receiver: &str, transfer: bool) -> Self {
        let staker = if transfer { receiver } else { from };
        Self {
            payer: from.to_string(),
            staker: staker.to_string(),
            beneficiary: receiver.to_string(),
            transfer,
        }
    }

    pub fn is_self_delegation(&self) -> bool {
        !self.transfer && self.staker == self.beneficiary
    }
}

/// Apply signed net/cpu deltas to the stake `from` holds for `receiver`
pub(crate) fn change_bandwidth(
    state: &mut SystemState,
    tx: &mut Transaction<'_>,
    from: &str,
    receiver: &str,
    net_delta: i64,
    cpu_delta: i64,
    transfer: bool,
) -> Result<()> {
    let config = tx.config();
    tx.require_auth(from)?;
    if !state.global.resources_market_open && !tx.is_privileged(from) {
        return Err(SystemError::MarketClosed {
            account: from.to_string(),
        });
    }
    if net_delta == 0 && cpu_delta == 0 {
        return Err(SystemError::InvalidAmount(
            "should stake non-zero amount".to_string(),
        ));
    }
    let total = i128::from(net_delta) + i128::from(cpu_delta);
    if total.abs() < i128::from(net_delta).abs().max(i128::from(cpu_delta).abs()) {
        return Err(SystemError::OppositeSignDeltas {
            net: net_delta,
            cpu: cpu_delta,
        });
    }
    let total = i64::try_from(total)
        .map_err(|_| SystemError::InvalidAmount(format!("stake change {} out of range", total)))?;

    let relationship = Relationship::resolve(from, receiver, transfer);
    let direction = StakeDirection::of(total);
    let Relationship {
        payer,
        staker,
        beneficiary,
        ..
    } = &relationship;

    state
        .delegations
        .apply(staker, beneficiary, net_delta, cpu_delta)?;

    let totals = state.resources.apply_stake(beneficiary, net_delta, cpu_delta)?;
    tx.set_resource_limits(&totals);

    if *payer != config.stake_pool {
        let mut residual = total;
        if direction == StakeDirection::Unstake || relationship.is_self_delegation() {
            let reconciled = state.refunds.reconcile(staker, net_delta, cpu_delta, tx.now());
            residual = reconciled.transfer_amount();
            match reconciled.outcome {
                RefundOutcome::Untouched => {}
                RefundOutcome::Pending(_) => {
                    let not_before = tx.now().saturating_add(config.refund_delay_sec);
                    state.outbox.schedule(DeferredJob {
                        account: staker.clone(),
                        action: DeferredAction::Refund,
                        not_before,
                    });
                    tx.record(Effect::ScheduleRefund {
                        account: staker.clone(),
                        not_before,
                    });
                }
                RefundOutcome::Closed => {
                    if state.outbox.cancel(staker).is_some() {
                        tx.record(Effect::CancelRefund {
                            account: staker.clone(),
                        });
                    }
                }
            }
        }

        if residual > 0 {
            tx.transfer(
                payer,
                &config.stake_pool,
                Asset::new(residual, config.core_symbol.clone()),
                memo::STAKE_BANDWIDTH,
            )?;
        }
    }

    let voter = state.voters.add_stake(staker, total)?;
    if let Some(vesting) = &config.legacy_vesting {
        if vesting.account == *staker {
            validate_legacy_vesting(vesting, voter.staked, tx.now())?;
        }
    }
    if voter.has_votes() {
        tx.update_votes(voter);
    }

    debug!(
        "{:?} {} net / {} cpu: {} -> {} (paid by {})",
        direction, net_delta, cpu_delta, staker, beneficiary, payer
    );
    Ok(())
}

pub fn delegate(
    state: &mut SystemState,
    tx: &mut Transaction<'_>,
    from: &str,
    receiver: &str,
    stake_net: &Asset,
    stake_cpu: &Asset,
    transfer: bool,
) -> Result<()> {
    check_quantities(tx, stake_net, stake_cpu, "stake")?;
    if transfer && from == receiver {
        return Err(SystemError::InvalidAmount(
            "cannot use transfer flag if delegating to self".to_string(),
        ));
    }
    change_bandwidth(
        state,
        tx,
        from,
        receiver,
        stake_net.amount,
        stake_cpu.amount,
        transfer,
    )
}

/// Withdraw stake `from` delegated to `receiver`
pub fn undelegate(
    state: &mut SystemState,
    tx: &mut Transaction<'_>,
    from: &str,
    receiver: &str,
    unstake_net: &Asset,
    unstake_cpu: &Asset,
) -> Result<()> {
    let config = tx.config();
    check_quantities(tx, unstake_net, unstake_cpu, "unstake")?;

    let delegated = state
        .delegations
        .get(from, receiver)
        .map(|row| row.total())
        .ok_or_else(|| SystemError::DelegationNotFound {
            from: from.to_string(),
            to: receiver.to_string(),
        })?;
    let requested = unstake_net.amount + unstake_cpu.amount;
    state.escrows.release(
        from,
        receiver,
        requested,
        delegated,
        tx.now(),
        config.escrow_period_sec,
    )?;

    let required = config.min_activated_stake(tx.token_supply(&config.core_symbol));
    let activated = state.global.total_activated_stake;
    if activated < required {
        return Err(SystemError::NetworkNotActivated {
            activated,
            required,
        });
    }

    change_bandwidth(
        state,
        tx,
        from,
        receiver,
        -unstake_net.amount,
        -unstake_cpu.amount,
        false,
    )
}

/// Delegate and lock the stake under a release schedule of
/// `period_count` escrow periods
#[allow(clippy::too_many_arguments)]
pub fn escrow(
    state: &mut SystemState,
    tx: &mut Transaction<'_>,
    from: &str,
    receiver: &str,
    stake_net: &Asset,
    stake_cpu: &Asset,
    transfer: bool,
    period_count: u8,
) -> Result<()> {
    if period_count == 0 {
        return Err(SystemError::InvalidAmount(
            "escrow needs at least one period".to_string(),
        ));
    }
    delegate(state, tx, from, receiver, stake_net, stake_cpu, transfer)?;

    let scope = if transfer { receiver } else { from };
    let amount = stake_net.amount + stake_cpu.amount;
    let id = state
        .escrows
        .grant(scope, receiver, tx.now(), period_count, amount);
    debug!(
        "escrow grant {} of {} for {} over {} periods",
        id, amount, receiver, period_count
    );
    Ok(())
}

/// Pay out a matured refund bucket
pub fn settle_refund(state: &mut SystemState, tx: &mut Transaction<'_>, owner: &str) -> Result<()> {
    let config = tx.config();
    tx.require_auth(owner)?;

    let request = state
        .refunds
        .get(owner)
        .cloned()
        .ok_or_else(|| SystemError::RefundNotFound(owner.to_string()))?;
    let available_at = request.available_at(config.refund_delay_sec);
    if available_at > tx.now() {
        return Err(SystemError::RefundNotMature {
            available_at,
            now: tx.now(),
        });
    }

    let quantity = Asset::new(request.total(), config.core_symbol.clone());
    tx.transfer(&config.stake_pool, owner, quantity.clone(), memo::UNSTAKE)?;
    state.refunds.remove(owner);
    if state.outbox.cancel(owner).is_some() {
        tx.record(Effect::CancelRefund {
            account: owner.to_string(),
        });
    }
    info!("refunded {} to {}", quantity, owner);
    Ok(())
}

fn check_quantities(tx: &Transaction<'_>, net: &Asset, cpu: &Asset, verb: &str) -> Result<()> {
    let symbol = &tx.config().core_symbol;
    if net.symbol != *symbol || cpu.symbol != *symbol {
        return Err(SystemError::InvalidAmount(format!(
            "must {} {}, got {} and {}",
            verb, symbol, net, cpu
        )));
    }
    if net.amount < 0 || cpu.amount < 0 {
        return Err(SystemError::InvalidAmount(format!("must {} a positive amount", verb)));
    }
    match net.amount.checked_add(cpu.amount) {
        Some(total) if total > 0 => Ok(()),
        _ => Err(SystemError::InvalidAmount(format!("must {} a positive amount", verb))),
    }
}
