//! Concurrency tests for last-ticket scenarios.
//!
//! These tests verify that under concurrent load the ledger admits exactly
//! as many orders as there is inventory, and that rejected buyers get a
//! clean `InsufficientInventory` error rather than a partial order.
//!
//! Run with: `cargo test --test concurrency_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use boxoffice_core::clock::{Clock, ManualClock};
use boxoffice_core::{
    Boxoffice, Catalog, CatalogDef, Event, EventId, Money, OrderError, OrderLine, Performance,
    PerformanceId, TicketType, TicketTypeId, TicketVariant, VariantId, VariantKind, Venue, VenueId,
};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

/// One venue, one performance, one ticket type with `capacity` seats and two
/// variants: an uncapped Full and a PCD variant capped at `pcd_cap`.
fn build_catalog(capacity: u32, pcd_cap: u32) -> (CatalogDef, TicketTypeId, VariantId, VariantId) {
    let venue = Venue {
        id: VenueId::new(),
        name: "Arena Norte".to_string(),
        city: "Porto Alegre".to_string(),
    };
    let event = Event {
        id: EventId::new(),
        venue_id: venue.id,
        name: "Last Night Live".to_string(),
    };
    let performance = Performance {
        id: PerformanceId::new(),
        event_id: event.id,
        starts_at: Utc.with_ymd_and_hms(2025, 11, 20, 21, 0, 0).unwrap(),
    };
    let pit = TicketType {
        id: TicketTypeId::new(),
        performance_id: performance.id,
        name: "Pit".to_string(),
        price: Money::from_cents(20_000),
        initial_quantity: capacity,
    };
    let full = TicketVariant {
        id: VariantId::new(),
        ticket_type_id: pit.id,
        kind: VariantKind::Full,
        price: Money::from_cents(20_000),
        fee: Money::from_cents(2_000),
        discount_pct: None,
        cap: None,
        active: true,
    };
    let pcd = TicketVariant {
        id: VariantId::new(),
        ticket_type_id: pit.id,
        kind: VariantKind::Pcd,
        price: Money::from_cents(20_000),
        fee: Money::ZERO,
        discount_pct: Some(50),
        cap: Some(pcd_cap),
        active: true,
    };
    let ids = (pit.id, full.id, pcd.id);

    let def = CatalogDef {
        venues: vec![venue],
        events: vec![event],
        performances: vec![performance],
        ticket_types: vec![pit],
        variants: vec![full, pcd],
    };
    (def, ids.0, ids.1, ids.2)
}

fn build_boxoffice(capacity: u32, pcd_cap: u32) -> (Arc<Boxoffice>, TicketTypeId, VariantId, VariantId) {
    let (def, pit, full, pcd) = build_catalog(capacity, pcd_cap);
    let catalog = Catalog::from_def(def).expect("catalog definition is valid");
    let boxoffice = Boxoffice::new(catalog).expect("engine assembles");
    (Arc::new(boxoffice), pit, full, pcd)
}

/// Test: 100 concurrent orders for the last ticket.
///
/// Verifies that:
/// - Exactly 1 order succeeds
/// - Exactly 99 orders fail with `InsufficientInventory`
/// - The losers see the true shortfall (requested 1, available 0)
/// - Only the winning order exists afterwards
#[tokio::test]
async fn last_ticket_100_concurrent_buyers() {
    println!("🧪 Concurrency Test: 100 concurrent buyers for 1 ticket");

    let (boxoffice, pit, full, _) = build_boxoffice(1, 1);

    println!("  🚀 Launching 100 concurrent orders...");
    let mut handles = vec![];
    for i in 0..100 {
        let engine = Arc::clone(&boxoffice);
        handles.push(tokio::spawn(async move {
            let email = format!("buyer{i}@example.com");
            engine.place_order(&email, &[OrderLine::new(full, 1)])
        }));
    }

    println!("  ⏳ Waiting for all orders to settle...");
    let results: Vec<Result<_, OrderError>> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let failures: Vec<&OrderError> = results.iter().filter_map(|r| r.as_ref().err()).collect();

    println!("  📊 Results:");
    println!("    ✅ Successes: {successes}");
    println!("    ❌ Failures: {}", failures.len());

    assert_eq!(
        successes, 1,
        "Expected exactly 1 order to succeed, but {successes} succeeded"
    );
    assert_eq!(failures.len(), 99);
    for error in failures {
        assert_eq!(
            *error,
            OrderError::InsufficientInventory {
                variant: full,
                requested: 1,
                available: 0,
            },
            "Losers must see the exact shortfall"
        );
    }

    let snapshot = boxoffice.availability(pit).expect("account exists");
    assert_eq!(snapshot.available, 0, "The last ticket is held");
    assert_eq!(snapshot.held, 1);
    assert_eq!(boxoffice.order_count(), 1, "Failed placements leave no order behind");

    println!("  ✅ Exactly 1 winner for the last ticket, no double-booking");
}

/// Test: 50 concurrent buyers, 3 tickets.
#[tokio::test]
async fn three_tickets_fifty_concurrent_buyers() {
    println!("🧪 Concurrency Test: 50 concurrent buyers for 3 tickets");

    let (boxoffice, pit, full, _) = build_boxoffice(3, 1);

    let mut handles = vec![];
    for i in 0..50 {
        let engine = Arc::clone(&boxoffice);
        handles.push(tokio::spawn(async move {
            let email = format!("buyer{i}@example.com");
            engine.place_order(&email, &[OrderLine::new(full, 1)])
        }));
    }

    let results: Vec<Result<_, OrderError>> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let failures = results.len() - successes;

    println!("  📊 Successes: {successes}, Failures: {failures}");
    assert_eq!(successes, 3, "Expected exactly 3 winners, got {successes}");
    assert_eq!(failures, 47);

    let snapshot = boxoffice.availability(pit).expect("account exists");
    assert_eq!(snapshot.available, 0);
    assert_eq!(snapshot.held, 3);

    println!("  ✅ Exactly 3 tickets allocated under contention");
}

/// Test: a per-variant cap holds under a rush even with seats to spare.
///
/// 20 buyers race for a PCD variant capped at 2 while the ticket type has
/// 50 seats. Exactly 2 win; the other 48 seats stay purchasable as Full.
#[tokio::test]
async fn capped_variant_rush_honors_the_cap() {
    println!("🧪 Concurrency Test: 20 concurrent buyers for a variant capped at 2");

    let (boxoffice, pit, _, pcd) = build_boxoffice(50, 2);

    let mut handles = vec![];
    for i in 0..20 {
        let engine = Arc::clone(&boxoffice);
        handles.push(tokio::spawn(async move {
            let email = format!("buyer{i}@example.com");
            engine.place_order(&email, &[OrderLine::new(pcd, 1)])
        }));
    }

    let results: Vec<Result<_, OrderError>> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 2, "Expected the cap to admit exactly 2 orders");

    let snapshot = boxoffice.availability(pit).expect("account exists");
    assert_eq!(snapshot.available, 48, "Uncapped seats stay purchasable");
    assert_eq!(snapshot.held, 2);
    let pcd_remaining = snapshot
        .variants
        .iter()
        .find(|v| v.variant == pcd)
        .expect("capped variant is tracked");
    assert_eq!(pcd_remaining.available, 0);

    println!("  ✅ Cap enforced: 2 winners, 48 seats untouched");
}

/// Test: released inventory is immediately resellable under a second rush.
///
/// 10 buyers race for 4 tickets, every winner's payment then fails, and a
/// second wave of 10 buyers races for the returned inventory. Both waves
/// admit exactly 4 orders.
#[tokio::test]
async fn failed_payments_return_tickets_to_the_next_rush() {
    println!("🧪 Concurrency Test: two rushes over the same 4 tickets");

    let (boxoffice, pit, full, _) = build_boxoffice(4, 1);

    // First wave
    let mut handles = vec![];
    for i in 0..10 {
        let engine = Arc::clone(&boxoffice);
        handles.push(tokio::spawn(async move {
            let email = format!("wave1-{i}@example.com");
            engine.place_order(&email, &[OrderLine::new(full, 1)])
        }));
    }
    let first_wave: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .filter_map(Result::ok)
        .collect();
    assert_eq!(first_wave.len(), 4, "First wave admits exactly 4 orders");

    // Every winner abandons checkout
    for order in &first_wave {
        let session = order.payment_session.clone().expect("placed orders carry a session");
        boxoffice.fail_payment(&session).expect("payment failure is accepted");
    }
    assert_eq!(
        boxoffice.availability(pit).expect("account exists").available,
        4,
        "All tickets return to the pool"
    );

    // Second wave
    let mut handles = vec![];
    for i in 0..10 {
        let engine = Arc::clone(&boxoffice);
        handles.push(tokio::spawn(async move {
            let email = format!("wave2-{i}@example.com");
            engine.place_order(&email, &[OrderLine::new(full, 1)])
        }));
    }
    let second_wave = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .filter(Result::is_ok)
        .count();
    assert_eq!(second_wave, 4, "Second wave admits exactly 4 orders");

    println!("  ✅ Released tickets were resold without loss or duplication");
}

/// Test: two sweep passes racing over the same stale orders.
///
/// 12 one-ticket orders age past the payment window, then two sweeps run at
/// the same time. Between them every order is reclaimed exactly once and
/// every seat comes back exactly once.
#[tokio::test]
async fn simultaneous_sweeps_release_each_order_once() {
    println!("🧪 Concurrency Test: two sweeps racing over 12 stale orders");

    let (def, pit, full, _) = build_catalog(20, 1);
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap(),
    ));
    let boxoffice = Arc::new(
        Boxoffice::builder(Catalog::from_def(def).expect("catalog definition is valid"))
            .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .build()
            .expect("engine assembles"),
    );

    for i in 0..12 {
        let email = format!("stale{i}@example.com");
        boxoffice
            .place_order(&email, &[OrderLine::new(full, 1)])
            .expect("seats are available");
    }
    clock.advance(chrono::Duration::minutes(20));

    let ttl = chrono::Duration::minutes(15);
    let first = tokio::spawn({
        let engine = Arc::clone(&boxoffice);
        async move { engine.sweep_expired(ttl) }
    });
    let second = tokio::spawn({
        let engine = Arc::clone(&boxoffice);
        async move { engine.sweep_expired(ttl) }
    });
    let first = first.await.expect("Task panicked");
    let second = second.await.expect("Task panicked");

    println!("  📊 Pass A reaped {first}, pass B reaped {second}");
    assert_eq!(first + second, 12, "Each stale order is reaped by exactly one pass");

    let snapshot = boxoffice.availability(pit).expect("account exists");
    assert_eq!(snapshot.available, 20, "Every seat returned exactly once");
    assert_eq!(snapshot.held, 0);

    println!("  ✅ Concurrent sweeps split the work without double-crediting");
}

/// Test: interleaved placements, confirmations, and failures keep the books.
///
/// 30 buyers race for 10 seats, and each winner immediately confirms or
/// abandons while other placements are still in flight. A seat abandoned
/// mid-race can be resold, so more than 10 placements may win; what must
/// hold throughout is the conservation equation `available + held == capacity`
/// with exactly the paid seats still held at the end.
#[tokio::test]
async fn mixed_traffic_preserves_the_conservation_invariant() {
    println!("🧪 Concurrency Test: mixed confirm/fail traffic over 10 seats");

    let (boxoffice, pit, full, _) = build_boxoffice(10, 1);

    let mut handles = vec![];
    for i in 0..30 {
        let engine = Arc::clone(&boxoffice);
        handles.push(tokio::spawn(async move {
            let email = format!("buyer{i}@example.com");
            let Ok(order) = engine.place_order(&email, &[OrderLine::new(full, 1)]) else {
                return (false, false);
            };
            let session = order
                .payment_session
                .clone()
                .expect("placed orders carry a session");
            if i % 2 == 0 {
                engine
                    .confirm_payment(&session)
                    .await
                    .expect("confirm of a fresh order is accepted");
                (true, true)
            } else {
                engine
                    .fail_payment(&session)
                    .expect("failure of a fresh order is accepted");
                (true, false)
            }
        }));
    }

    let outcomes: Vec<(bool, bool)> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .collect();

    let placed = outcomes.iter().filter(|(placed, _)| *placed).count();
    let paid = outcomes.iter().filter(|(_, paid)| *paid).count();
    println!("  📊 Placements: {placed}, paid: {paid}, abandoned: {}", placed - paid);
    assert!(placed >= 10, "At least the initial capacity's worth of placements win");
    assert!(paid <= 10, "Paid seats can never exceed capacity");

    let snapshot = boxoffice.availability(pit).expect("account exists");
    assert_eq!(
        snapshot.available + snapshot.held,
        10,
        "Conservation holds after the dust settles"
    );
    assert_eq!(
        usize::try_from(snapshot.held).unwrap(),
        paid,
        "Exactly the paid seats stay held"
    );
    assert_eq!(usize::try_from(snapshot.available).unwrap(), 10 - paid);

    println!("  ✅ Books balanced through interleaved confirms and failures");
}
