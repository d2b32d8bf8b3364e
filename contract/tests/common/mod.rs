#![allow(dead_code)]

use sysres_core::{Asset, MemoryHost, Symbol, SystemConfig, TokenLedger};
use system_contract::SystemContract;

pub const T0: u32 = 1_600_000_000;
pub const TOTAL_SUPPLY: i64 = 10_000_000_000_000;
pub const FREE_RAM: u64 = 64 * 1024 * 1024 * 1024;
pub const USER_BALANCE: i64 = 10_000_000;
pub const USERS: [&str; 4] = ["alice", "bob", "carol", "b1"];

pub fn sys(amount: i64) -> Asset {
    Asset::new(amount, Symbol::new("SYS", 4))
}

/// Initialized contract with an open market and an activated network
pub fn setup() -> SystemContract<MemoryHost> {
    setup_with(SystemConfig::default())
}

pub fn setup_with(config: SystemConfig) -> SystemContract<MemoryHost> {
    let mut host = MemoryHost::new(T0);
    let users_total = USER_BALANCE * USERS.len() as i64;
    host.issue("sys", &sys(TOTAL_SUPPLY - users_total)).unwrap();
    for user in USERS {
        host.issue(user, &sys(USER_BALANCE)).unwrap();
    }
    host.sign_as(["sys"]);

    let mut contract = SystemContract::new(config, host).unwrap();
    contract.init(FREE_RAM).unwrap();
    contract.set_market_open(true).unwrap();
    contract.set_activated_stake(TOTAL_SUPPLY / 10).unwrap();
    contract
}

pub fn sign(contract: &mut SystemContract<MemoryHost>, account: &str) {
    contract.host_mut().sign_as([account]);
}

pub fn balance(contract: &SystemContract<MemoryHost>, account: &str) -> i64 {
    contract.host().balance(account, &Symbol::new("SYS", 4))
}
