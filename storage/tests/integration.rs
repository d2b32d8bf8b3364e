use sysres_core::{Asset, MemoryHost, Symbol, SystemConfig};
use sysres_storage::{Snapshot, SnapshotStore};
use system_contract::SystemContract;
use tempfile::tempdir;

fn sys(amount: i64) -> Asset {
    Asset::new(amount, Symbol::new("SYS", 4))
}

#[test]
fn test_resume_contract_from_snapshot() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::open(dir.path()).unwrap();

    let mut host = MemoryHost::new(1_600_000_000);
    host.issue("sys", &sys(9_999_990_000_000)).unwrap();
    host.issue("alice", &sys(10_000_000)).unwrap();
    host.sign_as(["sys"]);

    let mut contract = SystemContract::new(SystemConfig::default(), host).unwrap();
    contract.init(1024 * 1024 * 1024).unwrap();
    contract.set_market_open(true).unwrap();
    contract.host_mut().sign_as(["alice"]);
    contract.buy_ram("alice", "alice", sys(50_000)).unwrap();

    let (config, state, host) = contract.into_parts();
    store.save_snapshot(&Snapshot::new(state, host)).unwrap();

    let snapshot = store.load_latest().unwrap().unwrap();
    assert_eq!(snapshot.version, 3);
    let mut resumed = SystemContract::from_parts(config, snapshot.state, snapshot.host).unwrap();

    let bytes = resumed.user_resources("alice").unwrap().ram_bytes;
    resumed.sell_ram("alice", bytes).unwrap();
    assert!(resumed.user_resources("alice").is_none());
    assert_eq!(resumed.global().version, 4);
}
