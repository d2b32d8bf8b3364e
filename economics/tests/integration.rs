use economics::*;
use sysres_core::{Asset, Symbol};

const FREE_RAM: i64 = 64 * 1024 * 1024 * 1024;
const SUPPLY: i64 = 10_000_000_000_000;

fn sys(amount: i64) -> Asset {
    Asset::new(amount, Symbol::new("SYS", 4))
}

#[test]
fn test_buy_then_sell_pays_two_fees() {
    let mut market = ExchangeState::ram_market(FREE_RAM, &sys(SUPPLY));

    // 200 paid, 1 taken as fee, 199 converted
    let paid = 200;
    let fee = ram_fee(paid);
    assert_eq!(fee, 1);

    let bytes = market.buy_bytes(&sys(paid - fee)).unwrap();
    assert_eq!(bytes, 1367);

    let proceeds = market.sell_bytes(bytes).unwrap();
    assert_eq!(proceeds.amount, 198);

    let net = proceeds.amount - ram_fee(proceeds.amount);
    assert_eq!(net, 197);
    assert!(net < paid - fee);
}

#[test]
fn test_no_round_trip_arbitrage() {
    let mut market = ExchangeState::ram_market(FREE_RAM, &sys(SUPPLY));

    for paid in [2, 3, 201, 12_345, 1_000_000, 250_000_000] {
        let fee = ram_fee(paid);
        let bytes = market.buy_bytes(&sys(paid - fee)).unwrap();
        let proceeds = market.sell_bytes(bytes).unwrap().amount;
        let net = proceeds - ram_fee(proceeds);
        assert!(net < paid, "paid {} got back {}", paid, net);
    }
}

#[test]
fn test_exact_byte_quote() {
    let market = ExchangeState::ram_market(FREE_RAM, &sys(SUPPLY));
    let cost = market.tokens_for_bytes(1024).unwrap();
    assert_eq!(cost.amount, 149);
}

#[test]
fn test_market_survives_serialization() {
    let mut market = ExchangeState::ram_market(FREE_RAM, &sys(SUPPLY));
    market.buy_bytes(&sys(5_000_000)).unwrap();

    let json = serde_json::to_string(&market).unwrap();
    let restored: ExchangeState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, market);
}

#[test]
fn test_fee_property() {
    for amount in [1, 2, 199, 200, 201, 999_999, i64::MAX] {
        let fee = ram_fee(amount);
        assert!(fee >= 1);
        if amount > 1 {
            assert!(fee < amount);
        }
    }
}
