//! `sysres` - local simulator of the system resource contract
//!
//! Every invocation loads the latest snapshot from the data directory, runs
//! one command against an in-memory host and writes a new snapshot.

mod config;
mod display;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, info};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use sysres_core::{Asset, Clock, MemoryHost, SystemClock, TimePointSec};
use sysres_storage::{Snapshot, SnapshotStore};
use system_contract::{Receipt, SystemContract, SystemState};

use crate::config::{load_config, CliConfig};

#[derive(Parser)]
#[command(name = "sysres")]
#[command(about = "System resource market simulator", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Snapshot directory, overrides the configuration
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Account that signs the call (repeatable)
    #[arg(long = "as", value_name = "ACCOUNT")]
    signers: Vec<String>,

    /// Simulated clock in Unix seconds, defaults to the wall clock
    #[arg(long, value_name = "SECONDS")]
    now: Option<TimePointSec>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Credit newly issued tokens to an account
    Issue { account: String, quantity: Asset },

    /// Create the RAM market
    Init { max_ram_size: u64 },

    /// Increase the RAM on sale
    Setram { max_ram_size: u64 },

    /// Open or close the resource market
    Setmarket {
        #[arg(action = ArgAction::Set)]
        open: bool,
    },

    /// Record the stake activated for voting
    Activate { amount: i64 },

    /// Buy RAM for a token amount
    Buyram {
        payer: String,
        receiver: String,
        quantity: Asset,
    },

    /// Buy an exact number of RAM bytes
    Buyrambytes {
        payer: String,
        receiver: String,
        bytes: u32,
    },

    /// Sell RAM bytes back to the market
    Sellram { account: String, bytes: i64 },

    /// Stake tokens for network and CPU bandwidth
    Delegatebw {
        from: String,
        receiver: String,
        net: Asset,
        cpu: Asset,
        /// Give the stake to the receiver
        #[arg(long)]
        transfer: bool,
    },

    /// Withdraw delegated stake into the refund bucket
    Undelegatebw {
        from: String,
        receiver: String,
        net: Asset,
        cpu: Asset,
    },

    /// Stake tokens that unlock over release periods
    Escrowbw {
        from: String,
        receiver: String,
        net: Asset,
        cpu: Asset,
        #[arg(long)]
        transfer: bool,
        #[arg(long, default_value = "4")]
        periods: u8,
    },

    /// Claim a matured refund
    Refund { owner: String },

    /// Run deferred jobs that are due
    Tick,

    /// Show global market state
    Status,

    /// Show balances, resources and stakes of an account
    Account { name: String },
}

impl Commands {
    /// Commands that only read state leave the snapshots untouched
    fn is_query(&self) -> bool {
        matches!(self, Commands::Status | Commands::Account { .. })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "✗".red(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());
    let store = SnapshotStore::open(&data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;

    let mut contract = open_contract(&store, &config, cli.now)?;
    contract.host_mut().sign_as(cli.signers.iter().cloned());

    if cli.command.is_query() {
        return query(&contract, &cli.command);
    }

    for receipt in execute(&mut contract, cli.command)? {
        display::print_receipt(&receipt);
    }

    let (_, state, host) = contract.into_parts();
    let name = store.save_snapshot(&Snapshot::new(state, host))?;
    let pruned = store.prune(config.keep_snapshots.max(1))?;
    debug!("saved {}, pruned {}", name, pruned);
    Ok(())
}

/// Resume from the latest snapshot or start an empty simulation
fn open_contract(
    store: &SnapshotStore,
    config: &CliConfig,
    now: Option<TimePointSec>,
) -> Result<SystemContract<MemoryHost>> {
    let (state, mut host) = match store.load_latest()? {
        Some(snapshot) => {
            info!("resuming from version {} taken at {}", snapshot.version, snapshot.taken_at);
            (snapshot.state, snapshot.host)
        }
        None => {
            info!("starting a new simulation in {}", store.data_dir().display());
            (SystemState::default(), MemoryHost::new(0))
        }
    };

    // the simulated clock never runs backwards on its own
    let now = now.unwrap_or_else(|| SystemClock.now().max(host.now()));
    host.set_now(now);

    for account in &config.privileged {
        host.set_privileged(account, true);
    }

    Ok(SystemContract::from_parts(config.system.clone(), state, host)?)
}

fn execute(contract: &mut SystemContract<MemoryHost>, command: Commands) -> Result<Vec<Receipt>> {
    let receipt = match command {
        Commands::Issue { account, quantity } => {
            contract.host_mut().issue(&account, &quantity)?;
            println!("{} issued {} to {}", "✓".green(), quantity.to_string().green(), account);
            return Ok(Vec::new());
        }
        Commands::Init { max_ram_size } => contract.init(max_ram_size)?,
        Commands::Setram { max_ram_size } => contract.set_ram(max_ram_size)?,
        Commands::Setmarket { open } => contract.set_market_open(open)?,
        Commands::Activate { amount } => contract.set_activated_stake(amount)?,
        Commands::Buyram {
            payer,
            receiver,
            quantity,
        } => contract.buy_ram(&payer, &receiver, quantity)?,
        Commands::Buyrambytes {
            payer,
            receiver,
            bytes,
        } => contract.buy_ram_bytes(&payer, &receiver, bytes)?,
        Commands::Sellram { account, bytes } => contract.sell_ram(&account, bytes)?,
        Commands::Delegatebw {
            from,
            receiver,
            net,
            cpu,
            transfer,
        } => contract.delegate_bandwidth(&from, &receiver, net, cpu, transfer)?,
        Commands::Undelegatebw {
            from,
            receiver,
            net,
            cpu,
        } => contract.undelegate_bandwidth(&from, &receiver, net, cpu)?,
        Commands::Escrowbw {
            from,
            receiver,
            net,
            cpu,
            transfer,
            periods,
        } => contract.escrow_bandwidth(&from, &receiver, net, cpu, transfer, periods)?,
        Commands::Refund { owner } => contract.refund(&owner)?,
        Commands::Tick => {
            let receipts = contract.run_deferred();
            if receipts.is_empty() {
                println!("no deferred jobs due");
            }
            return Ok(receipts);
        }
        Commands::Status | Commands::Account { .. } => return Ok(Vec::new()),
    };
    Ok(vec![receipt])
}

fn query(contract: &SystemContract<MemoryHost>, command: &Commands) -> Result<()> {
    match command {
        Commands::Status => display::print_status(contract),
        Commands::Account { name } => display::print_account(contract, name),
        _ => {}
    }
    Ok(())
}
