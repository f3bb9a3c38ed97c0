//! Box Office Demo
//!
//! Interactive demonstration of the reservation and order lifecycle engine:
//! - Multi-line order placement with price snapshots
//! - Idempotent payment confirmation (webhook replay)
//! - An on-sale rush against a capped variant without overselling
//! - Expiry sweep of an abandoned order
//! - Refund returning tickets to the pool
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```

use boxoffice_core::clock::ManualClock;
use boxoffice_core::{Boxoffice, Catalog, Clock, OrderError, OrderLine, VariantKind};
use boxoffice_server::seed::demo_catalog;
use rand::Rng;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (quiet by default; the demo narrates itself)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🎟️  ============================================");
    println!("   Box Office - Live Demo");
    println!("============================================\n");

    // A manual clock lets the demo fast-forward past the payment window
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));

    println!("⚙️  Assembling the engine from the demo catalog...");
    let catalog = Catalog::from_def(demo_catalog())?;
    let boxoffice = Arc::new(
        Boxoffice::builder(catalog)
            .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .build()?,
    );
    println!("✓ Engine assembled\n");

    // Resolve the demo inventory up front
    let catalog = boxoffice.catalog();
    let stalls = catalog
        .ticket_types()
        .find(|ticket_type| ticket_type.name == "Stalls")
        .ok_or("Demo catalog is missing the Stalls ticket type")?;
    let balcony = catalog
        .ticket_types()
        .find(|ticket_type| ticket_type.name == "Balcony")
        .ok_or("Demo catalog is missing the Balcony ticket type")?;
    let stalls_id = stalls.id;
    let balcony_id = balcony.id;
    let stalls_full = catalog
        .variant_by_kind(stalls_id, VariantKind::Full)
        .ok_or("Demo catalog is missing the Stalls full variant")?
        .id;
    let stalls_half = catalog
        .variant_by_kind(stalls_id, VariantKind::Half)
        .ok_or("Demo catalog is missing the Stalls half variant")?
        .id;
    let balcony_full = catalog
        .variant_by_kind(balcony_id, VariantKind::Full)
        .ok_or("Demo catalog is missing the Balcony full variant")?
        .id;
    let balcony_elderly = catalog
        .variant_by_kind(balcony_id, VariantKind::Elderly)
        .ok_or("Demo catalog is missing the Balcony elderly variant")?
        .id;

    println!("📋 Demo Scenario: Hamlet at the Teatro Municipal");
    println!("   Stalls:  500 seats (full and half-price variants)");
    println!("   Balcony: 200 seats (elderly quota of 40, PCD quota of 20)\n");

    // Step 1: Availability before the sale
    println!("1️⃣  Checking availability before the sale...");
    let before = boxoffice
        .availability(stalls_id)
        .ok_or("Stalls has no ledger account")?;
    println!(
        "   ✓ Stalls: {} of {} seats available\n",
        before.available, before.initial
    );

    // Step 2: A multi-line order
    println!("2️⃣  Clara orders 2 full-price and 1 half-price stalls seats...");
    let clara = boxoffice.place_order(
        "clara@example.com",
        &[
            OrderLine::new(stalls_full, 2),
            OrderLine::new(stalls_half, 1),
        ],
    )?;
    for item in &clara.items {
        println!(
            "   {} × {} @ {} = {}",
            item.quantity,
            item.kind,
            item.unit_price,
            item.line_total()
        );
    }
    println!("   Total: {}", clara.total);
    let clara_session = clara
        .payment_session
        .clone()
        .ok_or("Placed order carries no payment session")?;
    println!("   Payment session: {clara_session}\n");

    // Step 3: Payment confirmation, then a webhook replay
    println!("3️⃣  Payment provider confirms Clara's session...");
    let paid = boxoffice.confirm_payment(&clara_session).await?;
    println!("   ✓ Order {} is now {}", paid.id, paid.status);
    let replay = boxoffice.confirm_payment(&clara_session).await?;
    println!("   ✓ Webhook replay is a no-op: still {}\n", replay.status);

    // Step 4: A declined card
    println!("4️⃣  Dora's card is declined...");
    let dora = boxoffice.place_order("dora@example.com", &[OrderLine::new(stalls_full, 1)])?;
    let dora_session = dora
        .payment_session
        .clone()
        .ok_or("Placed order carries no payment session")?;
    let failed = boxoffice.fail_payment(&dora_session)?;
    let after_decline = boxoffice
        .availability(stalls_id)
        .ok_or("Stalls has no ledger account")?;
    println!(
        "   ✓ Order {} is now {}, seat returned ({} available)\n",
        failed.id, failed.status, after_decline.available
    );

    // Step 5: An on-sale rush against the elderly quota
    println!("5️⃣  On-sale rush: 60 buyers race for the 40 elderly balcony seats...");
    let mut handles = Vec::new();
    for buyer in 0..60 {
        let boxoffice = Arc::clone(&boxoffice);
        handles.push(tokio::spawn(async move {
            let quantity: u32 = rand::thread_rng().gen_range(1..=2);
            let order = boxoffice.place_order(
                &format!("buyer{buyer}@example.com"),
                &[OrderLine::new(balcony_elderly, quantity)],
            )?;
            // Winners pay straight away
            if let Some(session) = order.payment_session.clone() {
                boxoffice.confirm_payment(&session).await?;
            }
            Ok::<u32, OrderError>(quantity)
        }));
    }

    let mut won_orders = 0_u32;
    let mut won_tickets = 0_u32;
    let mut sold_out = 0_u32;
    for handle in handles {
        match handle.await? {
            Ok(quantity) => {
                won_orders += 1;
                won_tickets += quantity;
            }
            Err(OrderError::InsufficientInventory { .. }) => sold_out += 1,
            Err(error) => return Err(error.into()),
        }
    }
    println!("   ✓ {won_orders} orders won {won_tickets} tickets, {sold_out} buyers saw \"sold out\"");
    let rush_snapshot = boxoffice
        .availability(balcony_id)
        .ok_or("Balcony has no ledger account")?;
    println!(
        "   ✓ Balcony: {} of {} seats still available",
        rush_snapshot.available, rush_snapshot.initial
    );
    for variant in &rush_snapshot.variants {
        let label = if variant.variant == balcony_elderly {
            "elderly"
        } else {
            "PCD"
        };
        println!(
            "     {} quota: {} of {} left",
            label, variant.available, variant.cap
        );
    }
    println!();

    // Step 6: An abandoned order gets swept
    println!("6️⃣  Bruno reserves 3 balcony seats and walks away...");
    let bruno = boxoffice.place_order("bruno@example.com", &[OrderLine::new(balcony_full, 3)])?;
    println!("   Order {} awaiting payment", bruno.id);
    println!("   ⏩ Fast-forwarding 16 minutes...");
    clock.advance(chrono::Duration::minutes(16));
    let reaped = boxoffice.sweep_expired(chrono::Duration::minutes(15));
    println!("   ✓ Sweeper reclaimed {reaped} order(s)");
    if let Some(session) = bruno.payment_session.clone() {
        match boxoffice.confirm_payment(&session).await {
            Err(OrderError::InvalidTransition { from, to, .. }) => {
                println!("   ✓ Late payment webhook rejected: {from} → {to} is not allowed");
            }
            Ok(order) => println!("   ✗ Late confirm unexpectedly accepted: {}", order.status),
            Err(error) => println!("   ✗ Unexpected error: {error}"),
        }
    }
    let after_sweep = boxoffice
        .availability(balcony_id)
        .ok_or("Balcony has no ledger account")?;
    println!(
        "   ✓ Balcony back to {} seats available\n",
        after_sweep.available
    );

    // Step 7: A refund
    println!("7️⃣  Clara returns her tickets...");
    let refunded = boxoffice.refund(clara.id).await?;
    let after_refund = boxoffice
        .availability(stalls_id)
        .ok_or("Stalls has no ledger account")?;
    println!(
        "   ✓ Order {} is now {}, {} stalls seats available\n",
        refunded.id, refunded.status, after_refund.available
    );

    // Step 8: The audit trail
    println!("8️⃣  Clara's order history:");
    for record in boxoffice.transitions_for(clara.id) {
        println!("   {} → {} ({})", record.from, record.to, record.trigger);
    }

    println!("\n✅ Demo complete");
    Ok(())
}
