//! Terminal output of receipts and queries

use chrono::DateTime;
use owo_colors::OwoColorize;
use sysres_core::{Asset, Clock, MemoryHost, TimePointSec, TokenLedger};
use system_contract::{Effect, Receipt, SystemContract};

pub fn format_time(time: TimePointSec) -> String {
    DateTime::from_timestamp(i64::from(time), 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| time.to_string())
}

pub fn print_receipt(receipt: &Receipt) {
    println!(
        "{} {} (version {})",
        "✓".green(),
        receipt.action.bold(),
        receipt.version
    );

    for effect in &receipt.effects {
        match effect {
            Effect::Transfer(transfer) => println!(
                "  {} {} -> {}  {}  {}",
                "transfer".cyan(),
                transfer.from,
                transfer.to,
                transfer.quantity.to_string().green(),
                transfer.memo.bright_black()
            ),
            Effect::SetResourceLimits {
                account,
                ram_bytes,
                net_weight,
                cpu_weight,
            } => println!(
                "  {} {} ram={} net={} cpu={}",
                "limits".cyan(),
                account,
                ram_bytes,
                net_weight,
                cpu_weight
            ),
            Effect::UpdateVotes(voter) => println!(
                "  {} {} staked={}",
                "votes".cyan(),
                voter.owner,
                voter.staked
            ),
            Effect::ScheduleRefund {
                account,
                not_before,
            } => println!(
                "  {} refund for {} at {}",
                "schedule".yellow(),
                account,
                format_time(*not_before)
            ),
            Effect::CancelRefund { account } => {
                println!("  {} refund for {}", "cancel".yellow(), account)
            }
        }
    }
}

pub fn print_status(contract: &SystemContract<MemoryHost>) {
    let config = contract.config();
    let global = contract.global();
    let core = |amount: i64| Asset::new(amount, config.core_symbol.clone()).to_string();

    println!("{}", "Resource market".cyan().bold());
    println!("{}: {}", "Clock".yellow().bold(), format_time(contract.host().now()));
    println!("{}: {}", "Version".yellow().bold(), global.version);
    println!(
        "{}: {}",
        "Market".yellow().bold(),
        if global.resources_market_open {
            "open".green().to_string()
        } else {
            "closed".red().to_string()
        }
    );
    println!(
        "{}: {} / {} bytes reserved ({} free)",
        "RAM".yellow().bold(),
        global.total_ram_bytes_reserved,
        global.max_ram_size,
        global.free_ram()
    );
    println!("{}: {}", "RAM stake".yellow().bold(), core(global.total_ram_stake));
    println!(
        "{}: {}",
        "Activated stake".yellow().bold(),
        core(global.total_activated_stake)
    );

    match contract.ram_market() {
        Some(market) => {
            println!(
                "{}: {} / {} / {}",
                "Connectors".yellow().bold(),
                market.supply,
                market.base.balance,
                market.quote.balance
            );
            if let Ok(price) = market.tokens_for_bytes(1024) {
                println!("{}: {}", "Price per KiB".yellow().bold(), price.to_string().green());
            }
        }
        None => println!("{}", "RAM market not initialized".red()),
    }

    let jobs: Vec<_> = contract.pending_jobs().collect();
    println!("\n{} ({})", "Deferred jobs".yellow().bold(), jobs.len());
    for job in jobs {
        println!(
            "  {:?} for {} not before {}",
            job.action,
            job.account,
            format_time(job.not_before)
        );
    }
}

pub fn print_account(contract: &SystemContract<MemoryHost>, name: &str) {
    let config = contract.config();
    let core = |amount: i64| Asset::new(amount, config.core_symbol.clone()).to_string();
    let host = contract.host();

    println!("{} {}", "Account".cyan().bold(), name.bold());
    println!(
        "{}: {}",
        "Balance".yellow().bold(),
        core(host.balance(name, &config.core_symbol)).green()
    );

    match contract.user_resources(name) {
        Some(row) => println!(
            "{}: ram={} bytes net={} cpu={}",
            "Resources".yellow().bold(),
            row.ram_bytes,
            core(row.net_weight),
            core(row.cpu_weight)
        ),
        None => println!("{}: none", "Resources".yellow().bold()),
    }

    let delegated: Vec<_> = contract.state().delegations.delegated_by(name).collect();
    println!("{} ({})", "Delegated".yellow().bold(), delegated.len());
    for row in delegated {
        println!(
            "  -> {} net={} cpu={} unstakable={}",
            row.to,
            core(row.net_weight),
            core(row.cpu_weight),
            core(contract.available_to_unstake(name, &row.to))
        );
        for grant in contract.escrow_grants(name, &row.to) {
            println!(
                "     escrow #{} {} of {} over {} periods since {}",
                grant.id,
                core(grant.amount),
                core(grant.initial_amount),
                grant.period_count,
                format_time(grant.created)
            );
        }
    }

    if let Some(request) = contract.refund_request(name) {
        println!(
            "{}: net={} cpu={} available {}",
            "Refund".yellow().bold(),
            core(request.net_amount),
            core(request.cpu_amount),
            format_time(request.available_at(config.refund_delay_sec))
        );
    }

    if let Some(voter) = contract.voter(name) {
        println!("{}: {}", "Voting stake".yellow().bold(), core(voter.staked));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_time(1_600_000_000), "2020-09-13 12:26:40 UTC");
    }
}
