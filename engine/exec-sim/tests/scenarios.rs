//! End-to-end scenarios: latency gating, STP policies, queue modelling,
//! passive and aggressive fills, accounting, and determinism.

use exec_sim::{
    EventType, Ledger, LimitOrderRequest, LiquidityFlag, OrderState, RejectReason, Side,
    SimulatorParams, Simulator, StpPolicy, Visibility,
};
use l2_snap::{SnapshotRecord, PRICE_SCALE};

const P: i64 = PRICE_SCALE;

fn params_zero_latency() -> SimulatorParams {
    SimulatorParams { outbound_latency_ns: 0, ..SimulatorParams::default() }
}

fn funded_sim(params: SimulatorParams) -> Simulator {
    let mut sim = Simulator::new(params).unwrap();
    sim.reset(0, Ledger::new(1_000_000 * P, 1_000_000 * P));
    sim
}

/// Top-of-book only.
fn book(ts: i64, bid_p: i64, bid_q: i64, ask_p: i64, ask_q: i64) -> SnapshotRecord {
    let mut r = SnapshotRecord::empty(ts);
    r.set_bid(0, bid_p, bid_q);
    r.set_ask(0, ask_p, ask_q);
    r
}

/// Top-of-book plus a second bid level.
fn book_bid1(
    ts: i64,
    bid_p: i64,
    bid_q: i64,
    bid1_p: i64,
    bid1_q: i64,
    ask_p: i64,
    ask_q: i64,
) -> SnapshotRecord {
    let mut r = book(ts, bid_p, bid_q, ask_p, ask_q);
    r.set_bid(1, bid1_p, bid1_q);
    r
}

fn buy(price_q: i64, qty_q: i64) -> LimitOrderRequest {
    LimitOrderRequest::new(Side::Buy, price_q, qty_q)
}

fn sell(price_q: i64, qty_q: i64) -> LimitOrderRequest {
    LimitOrderRequest::new(Side::Sell, price_q, qty_q)
}

// --- Latency and locks ---

#[test]
fn latency_gating_locks_and_cancel() {
    let mut p = params_zero_latency();
    p.outbound_latency_ns = 10;
    let mut sim = funded_sim(p);

    let id = sim.place_limit(&buy(100 * P, 10 * P));
    assert_ne!(id, 0);
    // Buy lock is the fixed-point notional at the limit price.
    assert_eq!(sim.ledger().locked_cash_q, 1_000 * P);

    sim.step(&book(5, 100 * P, 10 * P, 101 * P, 10 * P));
    let o = sim.order(id).unwrap();
    assert!(!o.state.is_terminal());
    assert_eq!(o.state, OrderState::Pending);

    sim.step(&book(10, 100 * P, 10 * P, 101 * P, 10 * P));
    assert_eq!(sim.order(id).unwrap().state, OrderState::Active);
    assert_eq!(sim.ledger().locked_cash_q, 1_000 * P);

    assert!(sim.cancel(id));
    assert_eq!(sim.ledger().locked_cash_q, 0);

    let kinds: Vec<EventType> = sim.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventType::Submit, EventType::Activate, EventType::Cancel]);
}

#[test]
fn pending_cancel_is_a_ledger_roundtrip() {
    let mut p = params_zero_latency();
    p.outbound_latency_ns = 1_000;
    let mut sim = funded_sim(p);
    let before = *sim.ledger();

    let id = sim.place_limit(&sell(101 * P, 3 * P));
    assert_ne!(id, 0);
    assert_eq!(sim.ledger().locked_position_qty_q, 3 * P);
    assert!(sim.cancel(id));

    assert_eq!(*sim.ledger(), before);
    let kinds: Vec<EventType> = sim.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventType::Submit, EventType::Cancel]);
}

// --- Self-trade prevention ---

#[test]
fn stp_reject_incoming() {
    let mut sim = funded_sim(params_zero_latency());
    let r0 = book(0, 100 * P, 10 * P, 101 * P, 10 * P);
    sim.step(&r0);

    let ask_id = sim.place_limit(&sell(101 * P, 10 * P));
    assert_ne!(ask_id, 0);
    sim.step(&r0);
    assert_eq!(sim.order(ask_id).unwrap().state, OrderState::Active);

    let buy_id = sim.place_limit(&buy(102 * P, 10 * P));
    assert_ne!(buy_id, 0);
    sim.step(&r0);

    let incoming = sim.order(buy_id).unwrap();
    assert_eq!(incoming.state, OrderState::Rejected);
    assert_eq!(incoming.reject_reason, Some(RejectReason::SelfTradePrevention));
    // Incoming locks are gone; the resting sell keeps its lock and state.
    assert_eq!(sim.ledger().locked_cash_q, 0);
    assert_eq!(sim.order(ask_id).unwrap().state, OrderState::Active);

    let kinds: Vec<EventType> = sim.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventType::Submit, EventType::Activate, EventType::Submit, EventType::Reject]
    );
}

#[test]
fn stp_cancel_resting_cancels_only_crossed() {
    let mut p = params_zero_latency();
    p.stp = StpPolicy::CancelResting;
    let mut sim = funded_sim(p);
    // Market asks far away so nothing is marketable during the test.
    let r0 = book(0, 100 * P, 10 * P, 110 * P, 10 * P);
    sim.step(&r0);

    let ask_101 = sim.place_limit(&sell(101 * P, 10 * P));
    let ask_103 = sim.place_limit(&sell(103 * P, 10 * P));
    sim.step(&r0);
    assert_eq!(sim.order(ask_101).unwrap().state, OrderState::Active);
    assert_eq!(sim.order(ask_103).unwrap().state, OrderState::Active);

    let buy_id = sim.place_limit(&buy(102 * P, 10 * P));
    sim.step(&r0);

    assert_eq!(sim.order(ask_101).unwrap().state, OrderState::Cancelled);
    assert_eq!(sim.order(ask_103).unwrap().state, OrderState::Active);
    assert_eq!(sim.order(buy_id).unwrap().state, OrderState::Active);

    // Exactly one Cancel, for the crossed ask, before the buy's Activate.
    let cancels: Vec<_> =
        sim.events().iter().filter(|e| e.kind == EventType::Cancel).collect();
    assert_eq!(cancels.len(), 1);
    assert_eq!(cancels[0].order_id, ask_101);
    // Only the surviving ask's base lock remains, plus the buy cash lock.
    assert_eq!(sim.ledger().locked_position_qty_q, 10 * P);
    assert_eq!(sim.ledger().locked_cash_q, 1_020 * P);
}

#[test]
fn stp_cancel_burst_exceeding_event_cap_rejects_incoming() {
    let mut p = params_zero_latency();
    p.stp = StpPolicy::CancelResting;
    p.max_events = 6;
    let mut sim = funded_sim(p);
    let r0 = book(0, 100 * P, 10 * P, 110 * P, 10 * P);
    sim.step(&r0);

    let a1 = sim.place_limit(&sell(101 * P, P));
    let a2 = sim.place_limit(&sell(102 * P, P));
    sim.step(&r0); // events: 2 submits + 2 activates = 4

    let buy_id = sim.place_limit(&buy(103 * P, P)); // 5 events
    sim.step(&r0);

    // Burst of 2 cancels would need slots 6..7 > cap: incoming rejected,
    // resting untouched.
    let incoming = sim.order(buy_id).unwrap();
    assert_eq!(incoming.state, OrderState::Rejected);
    assert_eq!(incoming.reject_reason, Some(RejectReason::InsufficientResources));
    assert_eq!(sim.order(a1).unwrap().state, OrderState::Active);
    assert_eq!(sim.order(a2).unwrap().state, OrderState::Active);
    assert_eq!(sim.events().len(), 6);
}

// --- Queue and visibility ---

#[test]
fn activation_joins_tail_of_displayed_queue() {
    let mut sim = funded_sim(params_zero_latency());
    let r0 = book_bid1(0, 100, 10, 99, 40, 101, 10);
    sim.step(&r0);

    let id = sim.place_limit(&buy(99, 5));
    sim.step(&r0);

    let o = sim.order(id).unwrap();
    assert_eq!(o.state, OrderState::Active);
    assert_eq!(o.visibility, Visibility::Visible);
    assert_eq!(o.qty_ahead_q, 40);
    assert_eq!(o.last_level_qty_q, 40);
    assert_eq!(o.last_level_idx, Some(1));
}

#[test]
fn activation_within_range_but_absent_is_front_of_queue() {
    let mut sim = funded_sim(params_zero_latency());
    // Visible bids 100 then 98: price 99 is within range but absent.
    let r0 = book_bid1(0, 100, 10, 98, 10, 101, 10);
    sim.step(&r0);

    let id = sim.place_limit(&buy(99, 5));
    sim.step(&r0);

    let o = sim.order(id).unwrap();
    assert_eq!(o.visibility, Visibility::Visible);
    assert_eq!(o.last_level_idx, None);
    assert_eq!(o.qty_ahead_q, 0);
}

#[test]
fn activation_outside_top_n_is_blind() {
    let mut sim = funded_sim(params_zero_latency());
    let r0 = book_bid1(0, 100, 10, 98, 10, 101, 10);
    sim.step(&r0);

    // Deeper than the worst visible bid.
    let deep = sim.place_limit(&buy(95, 5));
    sim.step(&r0);
    let o = sim.order(deep).unwrap();
    assert_eq!(o.visibility, Visibility::Blind);
    assert_eq!(o.qty_ahead_q, 0);
    assert_eq!(o.last_level_idx, None);
}

#[test]
fn queue_advance_uses_min_depletion_rule() {
    let mut p = params_zero_latency();
    p.alpha_ppm = 500_000;
    let mut sim = funded_sim(p);

    let r0 = book_bid1(0, 100, 10, 99, 40, 101, 10);
    sim.step(&r0);
    let id = sim.place_limit(&buy(99, 5));
    sim.step(&r0);
    assert_eq!(sim.order(id).unwrap().qty_ahead_q, 40);

    // One displayed unit vanishes; floor(1 * 0.5) = 0 would stall the
    // queue, the rule floors the effect at 1 instead.
    let r1 = book_bid1(1, 100, 10, 99, 39, 101, 10);
    sim.step(&r1);

    let o = sim.order(id).unwrap();
    assert_eq!(o.qty_ahead_q, 39);
    assert_eq!(o.last_level_qty_q, 39);
    assert_eq!(o.state, OrderState::Active);
    assert!(sim.fills().is_empty());
}

#[test]
fn vanish_freezes_and_reappearance_reanchors() {
    let mut sim = funded_sim(params_zero_latency());

    let r0 = book_bid1(0, 100, 10, 99, 40, 101, 10);
    sim.step(&r0);
    let id = sim.place_limit(&buy(99, 5));
    sim.step(&r0);
    assert_eq!(sim.order(id).unwrap().qty_ahead_q, 40);

    // Level 99 disappears from top-N entirely.
    let r1 = book(1, 100, 10, 101, 10);
    sim.step(&r1);
    assert_eq!(sim.order(id).unwrap().visibility, Visibility::Frozen);

    // Reappears fatter: pessimistic re-anchor, no fill inferred.
    let r2 = book_bid1(2, 100, 10, 99, 77, 101, 10);
    sim.step(&r2);
    let o = sim.order(id).unwrap();
    assert_eq!(o.visibility, Visibility::Visible);
    assert_eq!(o.qty_ahead_q, 77);
    assert_eq!(o.last_level_qty_q, 77);
    assert_eq!(o.last_level_idx, Some(1));
    assert!(sim.fills().is_empty());
}

#[test]
fn alpha_zero_prevents_all_passive_fills() {
    let mut p = params_zero_latency();
    p.alpha_ppm = 0;
    let mut sim = funded_sim(p);

    let r0 = book_bid1(0, 100, 10, 99, 40, 101, 10);
    sim.step(&r0);
    let id = sim.place_limit(&buy(99, 5));
    sim.step(&r0);

    let r1 = book_bid1(1, 100, 10, 99, 4, 101, 10);
    sim.step(&r1);

    let o = sim.order(id).unwrap();
    assert_eq!(o.qty_ahead_q, 40, "no depletion attributed at alpha 0");
    assert!(sim.fills().is_empty());
}

// --- Passive fills ---

#[test]
fn passive_fifo_shares_one_depletion_budget() {
    let mut sim = funded_sim(params_zero_latency());

    // Both buys join behind 4 displayed units at 99.
    let r0 = book_bid1(0, 100 * P, 10 * P, 99 * P, 4 * P, 110 * P, 10 * P);
    sim.step(&r0);
    let first = sim.place_limit(&buy(99 * P, 2 * P));
    let second = sim.place_limit(&buy(99 * P, 2 * P));
    sim.step(&r0);
    assert_eq!(sim.order(first).unwrap().qty_ahead_q, 4 * P);
    assert_eq!(sim.order(second).unwrap().qty_ahead_q, 4 * P);

    // Depletion 3 advances only the head.
    let r1 = book_bid1(1, 100 * P, 10 * P, 99 * P, P, 110 * P, 10 * P);
    sim.step(&r1);
    assert_eq!(sim.order(first).unwrap().qty_ahead_q, P);
    assert_eq!(sim.order(second).unwrap().qty_ahead_q, 4 * P);

    // Level refills; queue positions do not move backwards.
    let r2 = book_bid1(2, 100 * P, 10 * P, 99 * P, 5 * P, 110 * P, 10 * P);
    sim.step(&r2);
    assert_eq!(sim.order(first).unwrap().qty_ahead_q, P);

    // Depletion 4: head advances 1 and fills 2 as maker; the single
    // remaining unit advances the second order only.
    let r3 = book_bid1(3, 100 * P, 10 * P, 99 * P, P, 110 * P, 10 * P);
    sim.step(&r3);

    let head = sim.order(first).unwrap();
    assert_eq!(head.state, OrderState::Filled);
    assert_eq!(head.filled_qty_q, 2 * P);
    let tail = sim.order(second).unwrap();
    assert_eq!(tail.state, OrderState::Active);
    assert_eq!(tail.filled_qty_q, 0);
    assert_eq!(tail.qty_ahead_q, 3 * P);

    assert_eq!(sim.fills().len(), 1);
    let f = sim.fills()[0];
    assert_eq!(f.order_id, first);
    assert_eq!(f.liq, LiquidityFlag::Maker);
    assert_eq!(f.price_q, 99 * P);
    assert_eq!(f.qty_q, 2 * P);
}

#[test]
fn maker_fee_and_lock_release_on_passive_fill() {
    let mut p = params_zero_latency();
    p.fees.maker_fee_ppm = 1_000; // 0.1%
    let mut sim = funded_sim(p);
    let cash_before = sim.ledger().cash_q;

    // Join behind a single displayed unit.
    let r0 = book(0, 100 * P, P, 110 * P, 10 * P);
    sim.step(&r0);
    let id = sim.place_limit(&buy(100 * P, P));
    sim.step(&r0);
    assert_eq!(sim.ledger().locked_cash_q, 100 * P);

    // Refill then deplete through the whole queue: 1 ahead + 1 fill.
    let r1 = book(1, 100 * P, 3 * P, 110 * P, 10 * P);
    sim.step(&r1);
    let r2 = book(2, 100 * P, P, 110 * P, 10 * P);
    sim.step(&r2);

    let o = sim.order(id).unwrap();
    assert_eq!(o.state, OrderState::Filled);

    assert_eq!(sim.fills().len(), 1);
    let f = sim.fills()[0];
    assert_eq!(f.liq, LiquidityFlag::Maker);
    assert_eq!(f.notional_cash_q, 100 * P);
    assert_eq!(f.fee_cash_q, P / 10);

    // Cash moved by exactly notional + fee; every lock released.
    assert_eq!(sim.ledger().cash_q, cash_before - 100 * P - P / 10);
    assert_eq!(sim.ledger().locked_cash_q, 0);
    assert_eq!(sim.ledger().position_qty_q, 1_000_000 * P + P);
}

// --- Aggressive fills ---

#[test]
fn trade_through_fills_takers_sequentially() {
    let mut sim = funded_sim(params_zero_latency());

    let r0 = book_bid1(0, 100 * P, 10 * P, 99 * P, 40 * P, 101 * P, 10 * P);
    sim.step(&r0);
    let first = sim.place_limit(&buy(99 * P, 2 * P));
    let second = sim.place_limit(&buy(99 * P, 2 * P));
    sim.step(&r0);

    // Ask crosses down to 99 with 3 displayed: the first order takes 2,
    // the second takes the remaining 1, both at the opposing price.
    let mut r1 = book_bid1(1, 100 * P, 10 * P, 99 * P, 40 * P, 99 * P, 3 * P);
    r1.set_ask(1, 101 * P, 10 * P);
    sim.step(&r1);

    assert_eq!(sim.fills().len(), 2);
    let f0 = sim.fills()[0];
    let f1 = sim.fills()[1];
    assert_eq!((f0.order_id, f0.qty_q, f0.liq), (first, 2 * P, LiquidityFlag::Taker));
    assert_eq!((f1.order_id, f1.qty_q, f1.liq), (second, P, LiquidityFlag::Taker));
    assert_eq!(f0.price_q, 99 * P);
    assert_eq!(f1.price_q, 99 * P);

    assert_eq!(sim.order(first).unwrap().state, OrderState::Filled);
    let o2 = sim.order(second).unwrap();
    assert_eq!(o2.state, OrderState::Partial);
    assert_eq!(o2.filled_qty_q, P);
    // Trade-through also wiped the queue ahead of the partial remainder.
    assert_eq!(o2.qty_ahead_q, 0);
}

#[test]
fn depletion_on_a_crossed_level_fills_as_taker() {
    let mut sim = funded_sim(params_zero_latency());

    // Rest buy@100 behind 10 displayed.
    let r0 = book(0, 100 * P, 10 * P, 101 * P, 10 * P);
    sim.step(&r0);
    let id = sim.place_limit(&buy(100 * P, 2 * P));
    sim.step(&r0);
    assert_eq!(sim.order(id).unwrap().qty_ahead_q, 10 * P);

    // The ask crosses to 98 while the 100 level also depletes. The
    // depletion must not surface as a maker fill at 100: the order
    // takes the opposing price instead.
    let r1 = book(1, 100 * P, 4 * P, 98 * P, 5 * P);
    sim.step(&r1);

    assert_eq!(sim.fills().len(), 1);
    let f = sim.fills()[0];
    assert_eq!(f.order_id, id);
    assert_eq!(f.liq, LiquidityFlag::Taker);
    assert_eq!(f.price_q, 98 * P);
    assert_eq!(f.qty_q, 2 * P);
    assert_eq!(sim.order(id).unwrap().state, OrderState::Filled);
}

#[test]
fn sweep_spans_levels_and_respects_limit() {
    let mut p = params_zero_latency();
    p.fees.taker_fee_ppm = 500;
    let mut sim = funded_sim(p);
    let cash_before = sim.ledger().cash_q;

    let r0 = book(0, 100 * P, 10 * P, 108 * P, 10 * P);
    sim.step(&r0);
    let id = sim.place_limit(&buy(102 * P, 5 * P));
    sim.step(&r0); // rests: 102 < 108

    // Asks drop: 100/2, 101/1, 103/10. Limit 102 consumes the first two
    // levels and must stop before 103.
    let mut r1 = book(1, 99 * P, 10 * P, 100 * P, 2 * P);
    r1.set_ask(1, 101 * P, P);
    r1.set_ask(2, 103 * P, 10 * P);
    sim.step(&r1);

    assert_eq!(sim.fills().len(), 2);
    let f0 = sim.fills()[0];
    let f1 = sim.fills()[1];
    assert_eq!((f0.price_q, f0.qty_q), (100 * P, 2 * P));
    assert_eq!((f1.price_q, f1.qty_q), (101 * P, P));
    assert_eq!(f0.liq, LiquidityFlag::Taker);

    let o = sim.order(id).unwrap();
    assert_eq!(o.state, OrderState::Partial);
    assert_eq!(o.filled_qty_q, 3 * P);

    // Taker fees on each consumed level's notional.
    let expected_fees = exec_sim::fee_cash(200 * P, 500) + exec_sim::fee_cash(101 * P, 500);
    assert_eq!(
        sim.ledger().cash_q,
        cash_before - 200 * P - 101 * P - expected_fees
    );
    // Lock was sized at the limit price; the filled share is released.
    assert_eq!(sim.ledger().locked_cash_q, 102 * 2 * P);
}

#[test]
fn blind_order_fills_only_through_aggression() {
    let mut sim = funded_sim(params_zero_latency());

    let r0 = book_bid1(0, 100 * P, 10 * P, 98 * P, 10 * P, 101 * P, 10 * P);
    sim.step(&r0);
    let id = sim.place_limit(&buy(95 * P, 3 * P));
    sim.step(&r0);
    assert_eq!(sim.order(id).unwrap().visibility, Visibility::Blind);

    // Deep level churn never passively fills a blind order.
    let r1 = book_bid1(1, 100 * P, 10 * P, 98 * P, 2 * P, 101 * P, 10 * P);
    sim.step(&r1);
    assert!(sim.fills().is_empty());

    // The ask crossing through the blind price fills it as taker, at the
    // opposing (better) price.
    let r2 = book_bid1(2, 93 * P, 10 * P, 92 * P, 10 * P, 94 * P, 5 * P);
    sim.step(&r2);
    assert_eq!(sim.fills().len(), 1);
    let f = sim.fills()[0];
    assert_eq!(f.order_id, id);
    assert_eq!(f.price_q, 94 * P);
    assert_eq!(f.liq, LiquidityFlag::Taker);
    assert_eq!(sim.order(id).unwrap().state, OrderState::Filled);
}

#[test]
fn no_fill_on_activation_step() {
    let mut sim = funded_sim(params_zero_latency());
    let r0 = book(0, 100 * P, 10 * P, 101 * P, 10 * P);

    // Marketable at submission, zero latency: activates within this step
    // but after the sweep, so it cannot fill yet.
    sim.step(&r0);
    let id = sim.place_limit(&buy(101 * P, 2 * P));
    sim.step(&book(1, 100 * P, 10 * P, 101 * P, 10 * P));
    assert_eq!(sim.order(id).unwrap().state, OrderState::Active);
    assert!(sim.fills().is_empty());

    // The next step's sweep takes it.
    sim.step(&book(2, 100 * P, 10 * P, 101 * P, 10 * P));
    assert_eq!(sim.fills().len(), 1);
    assert_eq!(sim.fills()[0].ts, 2);
    assert_eq!(sim.order(id).unwrap().state, OrderState::Filled);
}

// --- Ledger conservation ---

#[test]
fn sell_fill_accounting_balances() {
    let mut p = params_zero_latency();
    p.fees.taker_fee_ppm = 1_000;
    let mut sim = funded_sim(p);
    let before = *sim.ledger();

    let r0 = book(0, 100 * P, 10 * P, 105 * P, 10 * P);
    sim.step(&r0);
    let id = sim.place_limit(&sell(104 * P, 2 * P));
    sim.step(&r0);
    assert_eq!(sim.ledger().locked_position_qty_q, 2 * P);

    // Bid rallies through the sell limit.
    let r1 = book(1, 106 * P, 5 * P, 107 * P, 10 * P);
    sim.step(&r1);

    assert_eq!(sim.order(id).unwrap().state, OrderState::Filled);
    assert_eq!(sim.fills().len(), 1);
    let f = sim.fills()[0];
    assert_eq!(f.price_q, 106 * P);
    assert_eq!(f.notional_cash_q, 212 * P);

    // Cash rises by notional - fee; position falls by qty; locks drained.
    assert_eq!(sim.ledger().cash_q, before.cash_q + 212 * P - f.fee_cash_q);
    assert_eq!(sim.ledger().position_qty_q, before.position_qty_q - 2 * P);
    assert_eq!(sim.ledger().locked_position_qty_q, 0);
    assert_eq!(sim.ledger().locked_cash_q, 0);
}

#[test]
fn shorting_allowed_reserves_no_position() {
    let mut p = params_zero_latency();
    p.risk.spot_no_short = false;
    let mut sim = Simulator::new(p).unwrap();
    // No base held at all.
    sim.reset(0, Ledger::new(1_000_000 * P, 0));

    let r0 = book(0, 100 * P, 10 * P, 105 * P, 10 * P);
    sim.step(&r0);
    let id = sim.place_limit(&sell(104 * P, 2 * P));
    assert_ne!(id, 0);
    assert_eq!(sim.ledger().locked_position_qty_q, 0);
    sim.step(&r0);

    let r1 = book(1, 106 * P, 5 * P, 107 * P, 10 * P);
    sim.step(&r1);

    assert_eq!(sim.order(id).unwrap().state, OrderState::Filled);
    assert_eq!(sim.ledger().position_qty_q, -2 * P);
    assert_eq!(sim.ledger().locked_position_qty_q, 0);
    assert_eq!(sim.ledger().available_position_qty_q(), -2 * P);
}

// --- Determinism ---

fn scripted_run() -> (Vec<exec_sim::Order>, Vec<exec_sim::Event>, Vec<exec_sim::FillEvent>, Ledger)
{
    let mut p = params_zero_latency();
    p.outbound_latency_ns = 5;
    p.alpha_ppm = 750_000;
    p.fees.maker_fee_ppm = 200;
    p.fees.taker_fee_ppm = 700;
    let mut sim = funded_sim(p);

    let r0 = book_bid1(0, 100 * P, 10 * P, 99 * P, 6 * P, 101 * P, 4 * P);
    sim.step(&r0);
    sim.place_limit(&buy(99 * P, 2 * P));
    sim.place_limit(&sell(103 * P, P));
    sim.step(&book_bid1(6, 100 * P, 10 * P, 99 * P, 6 * P, 101 * P, 4 * P));

    sim.place_limit(&buy(101 * P, P));
    sim.step(&book_bid1(12, 100 * P, 9 * P, 99 * P, 3 * P, 101 * P, 4 * P));
    sim.step(&book_bid1(20, 104 * P, 2 * P, 99 * P, 2 * P, 105 * P, 4 * P));
    sim.cancel(1);

    (sim.orders().to_vec(), sim.events().to_vec(), sim.fills().to_vec(), *sim.ledger())
}

#[test]
fn determinism_identical_runs_identical_outputs() {
    let a = scripted_run();
    let b = scripted_run();
    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
    assert_eq!(a.2, b.2);
    assert_eq!(a.3, b.3);
}

#[test]
fn reset_restores_a_clean_timeline() {
    let mut sim = funded_sim(params_zero_latency());
    let r0 = book(0, 100 * P, 10 * P, 101 * P, 10 * P);
    sim.step(&r0);
    sim.place_limit(&buy(100 * P, P));
    sim.step(&r0);
    assert!(!sim.orders().is_empty());

    sim.reset(0, Ledger::new(50 * P, 0));
    assert!(sim.orders().is_empty());
    assert!(sim.events().is_empty());
    assert!(sim.fills().is_empty());
    assert_eq!(sim.ledger().cash_q, 50 * P);
    assert_eq!(sim.ledger().locked_cash_q, 0);

    // Ids restart from 1 on the fresh timeline.
    sim.step(&r0);
    let id = sim.place_limit(&buy(10 * P, P));
    assert_eq!(id, 1);
}
