//! Catalog loading and the built-in demo catalog.
//!
//! The server takes its catalog from the JSON file named by `CATALOG_PATH`.
//! When that variable is unset it seeds a small demo catalog instead, so the
//! server and the demo binary run out of the box.

use anyhow::Context as _;
use boxoffice_core::{
    Catalog, CatalogDef, Event, EventId, Money, Performance, PerformanceId, TicketType,
    TicketTypeId, TicketVariant, VariantId, VariantKind, Venue, VenueId,
};
use chrono::{Duration, Utc};

use crate::config::CatalogConfig;

/// Load and validate the catalog the server will sell from.
///
/// # Errors
///
/// Returns an error if the catalog file cannot be read or parsed, or if the
/// definition fails validation (duplicate names, dangling references,
/// discounts over 100%).
pub fn load_catalog(config: &CatalogConfig) -> anyhow::Result<Catalog> {
    let def = match &config.path {
        Some(path) => {
            tracing::info!(path = %path, "Loading catalog definition");
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog file {path}"))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse catalog file {path}"))?
        }
        None => {
            tracing::info!("CATALOG_PATH not set, seeding the demo catalog");
            demo_catalog()
        }
    };
    Catalog::from_def(def).context("Catalog definition failed validation")
}

/// One venue, one hot performance, two ticket types with discounted and
/// capped variants.
#[must_use]
pub fn demo_catalog() -> CatalogDef {
    let venue = Venue {
        id: VenueId::new(),
        name: "Teatro Municipal".to_string(),
        city: "São Paulo".to_string(),
    };
    let event = Event {
        id: EventId::new(),
        venue_id: venue.id,
        name: "Hamlet".to_string(),
    };
    let performance = Performance {
        id: PerformanceId::new(),
        event_id: event.id,
        starts_at: Utc::now() + Duration::days(30),
    };

    let stalls = TicketType {
        id: TicketTypeId::new(),
        performance_id: performance.id,
        name: "Stalls".to_string(),
        price: Money::from_cents(15_000),
        initial_quantity: 500,
    };
    let balcony = TicketType {
        id: TicketTypeId::new(),
        performance_id: performance.id,
        name: "Balcony".to_string(),
        price: Money::from_cents(9_000),
        initial_quantity: 200,
    };

    let variants = vec![
        TicketVariant {
            id: VariantId::new(),
            ticket_type_id: stalls.id,
            kind: VariantKind::Full,
            price: stalls.price,
            fee: Money::from_cents(1_500),
            discount_pct: None,
            cap: None,
            active: true,
        },
        TicketVariant {
            id: VariantId::new(),
            ticket_type_id: stalls.id,
            kind: VariantKind::Half,
            price: stalls.price,
            fee: Money::from_cents(1_500),
            discount_pct: Some(50),
            cap: Some(100),
            active: true,
        },
        TicketVariant {
            id: VariantId::new(),
            ticket_type_id: balcony.id,
            kind: VariantKind::Full,
            price: balcony.price,
            fee: Money::from_cents(900),
            discount_pct: None,
            cap: None,
            active: true,
        },
        TicketVariant {
            id: VariantId::new(),
            ticket_type_id: balcony.id,
            kind: VariantKind::Elderly,
            price: balcony.price,
            fee: Money::from_cents(900),
            discount_pct: Some(50),
            cap: Some(40),
            active: true,
        },
        TicketVariant {
            id: VariantId::new(),
            ticket_type_id: balcony.id,
            kind: VariantKind::Pcd,
            price: balcony.price,
            fee: Money::from_cents(900),
            discount_pct: Some(50),
            cap: Some(20),
            active: true,
        },
    ];

    CatalogDef {
        venues: vec![venue],
        events: vec![event],
        performances: vec![performance],
        ticket_types: vec![stalls, balcony],
        variants,
    }
}
