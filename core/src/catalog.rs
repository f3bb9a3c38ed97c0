//! Catalog store: the read-mostly product hierarchy.
//!
//! Venues contain events, events contain performances, performances offer
//! ticket types, and each ticket type is sold through pricing variants. The
//! catalog is assembled once at startup, validated as it is built, and then
//! shared immutably behind an `Arc`. Inventory levels live in the ledger, not
//! here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CatalogError;
use crate::types::{EventId, Money, PerformanceId, TicketTypeId, VariantId, VariantKind, VenueId};

// ============================================================================
// Entities
// ============================================================================

/// A physical venue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// Unique venue identifier
    pub id: VenueId,
    /// Venue name (e.g., "Teatro Municipal")
    pub name: String,
    /// City the venue is in
    pub city: String,
}

/// An event hosted at a venue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub id: EventId,
    /// Venue hosting the event
    pub venue_id: VenueId,
    /// Event name (e.g., "Hamlet")
    pub name: String,
}

/// A single dated occurrence of an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    /// Unique performance identifier
    pub id: PerformanceId,
    /// Event this performance belongs to
    pub event_id: EventId,
    /// When the curtain rises
    pub starts_at: DateTime<Utc>,
}

/// The capacity-bearing sales unit of a performance (e.g., "Balcony")
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    /// Unique ticket type identifier
    pub id: TicketTypeId,
    /// Performance this type sells seats for
    pub performance_id: PerformanceId,
    /// Type name, unique within the performance
    pub name: String,
    /// Base price before variant discounts
    pub price: Money,
    /// Capacity ceiling the ledger enforces
    pub initial_quantity: u32,
}

/// A purchasable pricing of a ticket type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketVariant {
    /// Unique variant identifier
    pub id: VariantId,
    /// Ticket type this variant prices
    pub ticket_type_id: TicketTypeId,
    /// Audience category, unique within the ticket type
    pub kind: VariantKind,
    /// Price before discount (usually mirrors the type's base price)
    pub price: Money,
    /// Service fee added per ticket, never discounted
    pub fee: Money,
    /// Percentage knocked off `price` (None means full price)
    pub discount_pct: Option<u8>,
    /// Optional per-variant quota within the type's capacity
    pub cap: Option<u32>,
    /// Whether the variant is currently on sale
    pub active: bool,
}

impl TicketVariant {
    /// Returns the effective per-ticket price: discount applied, fee added.
    ///
    /// # Panics
    ///
    /// Panics if the arithmetic would overflow. Registration validates the
    /// discount percentage, so a catalog-resident variant cannot overflow
    /// the discount step.
    #[must_use]
    pub const fn unit_price(&self) -> Money {
        let discount = match self.discount_pct {
            Some(pct) => pct as u32,
            None => 0,
        };
        self.price.apply_discount(discount).add(self.fee)
    }
}

// ============================================================================
// Catalog Definition (serde surface)
// ============================================================================

/// Flat, serializable description of a catalog, e.g. loaded from a JSON file.
///
/// Order matters only in that parents must be resolvable: [`Catalog::from_def`]
/// inserts venues first, then events, and so on down the hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDef {
    /// Venues to register
    pub venues: Vec<Venue>,
    /// Events to register
    pub events: Vec<Event>,
    /// Performances to register
    pub performances: Vec<Performance>,
    /// Ticket types to register
    pub ticket_types: Vec<TicketType>,
    /// Variants to register
    pub variants: Vec<TicketVariant>,
}

// ============================================================================
// Catalog Store
// ============================================================================

/// In-memory catalog with uniqueness and referential checks at registration.
///
/// Mutation happens only while the catalog is being assembled; afterwards it
/// is shared read-only.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    venues: HashMap<VenueId, Venue>,
    events: HashMap<EventId, Event>,
    performances: HashMap<PerformanceId, Performance>,
    ticket_types: HashMap<TicketTypeId, TicketType>,
    variants: HashMap<VariantId, TicketVariant>,
    type_names: HashMap<(PerformanceId, String), TicketTypeId>,
    variant_kinds: HashMap<(TicketTypeId, VariantKind), VariantId>,
}

impl Catalog {
    /// Creates an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a validated catalog from a flat definition
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if any entity references a missing parent,
    /// collides with an existing entity, or carries an out-of-range discount.
    pub fn from_def(def: CatalogDef) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for venue in def.venues {
            catalog.add_venue(venue)?;
        }
        for event in def.events {
            catalog.add_event(event)?;
        }
        for performance in def.performances {
            catalog.add_performance(performance)?;
        }
        for ticket_type in def.ticket_types {
            catalog.add_ticket_type(ticket_type)?;
        }
        for variant in def.variants {
            catalog.add_variant(variant)?;
        }
        Ok(catalog)
    }

    /// Registers a venue
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if the id is already taken.
    pub fn add_venue(&mut self, venue: Venue) -> Result<(), CatalogError> {
        if self.venues.contains_key(&venue.id) {
            return Err(CatalogError::DuplicateId);
        }
        self.venues.insert(venue.id, venue);
        Ok(())
    }

    /// Registers an event under an existing venue
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownVenue`] if the venue does not exist, or
    /// [`CatalogError::DuplicateId`] if the id is already taken.
    pub fn add_event(&mut self, event: Event) -> Result<(), CatalogError> {
        if !self.venues.contains_key(&event.venue_id) {
            return Err(CatalogError::UnknownVenue);
        }
        if self.events.contains_key(&event.id) {
            return Err(CatalogError::DuplicateId);
        }
        self.events.insert(event.id, event);
        Ok(())
    }

    /// Registers a performance under an existing event
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEvent`] if the event does not exist, or
    /// [`CatalogError::DuplicateId`] if the id is already taken.
    pub fn add_performance(&mut self, performance: Performance) -> Result<(), CatalogError> {
        if !self.events.contains_key(&performance.event_id) {
            return Err(CatalogError::UnknownEvent);
        }
        if self.performances.contains_key(&performance.id) {
            return Err(CatalogError::DuplicateId);
        }
        self.performances.insert(performance.id, performance);
        Ok(())
    }

    /// Registers a ticket type under an existing performance.
    ///
    /// Type names are unique within a performance.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownPerformance`] if the performance does
    /// not exist, [`CatalogError::DuplicateTicketTypeName`] on a name
    /// collision, or [`CatalogError::DuplicateId`] if the id is taken.
    pub fn add_ticket_type(&mut self, ticket_type: TicketType) -> Result<(), CatalogError> {
        if !self.performances.contains_key(&ticket_type.performance_id) {
            return Err(CatalogError::UnknownPerformance);
        }
        if self.ticket_types.contains_key(&ticket_type.id) {
            return Err(CatalogError::DuplicateId);
        }
        let name_key = (ticket_type.performance_id, ticket_type.name.clone());
        if self.type_names.contains_key(&name_key) {
            return Err(CatalogError::DuplicateTicketTypeName {
                performance: ticket_type.performance_id,
                name: ticket_type.name,
            });
        }
        self.type_names.insert(name_key, ticket_type.id);
        self.ticket_types.insert(ticket_type.id, ticket_type);
        Ok(())
    }

    /// Registers a variant under an existing ticket type.
    ///
    /// Variant kinds are unique within a ticket type.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownTicketType`] if the type does not
    /// exist, [`CatalogError::DuplicateVariantKind`] on a kind collision,
    /// [`CatalogError::DiscountOutOfRange`] for discounts above 100%, or
    /// [`CatalogError::DuplicateId`] if the id is taken.
    pub fn add_variant(&mut self, variant: TicketVariant) -> Result<(), CatalogError> {
        if !self.ticket_types.contains_key(&variant.ticket_type_id) {
            return Err(CatalogError::UnknownTicketType(variant.ticket_type_id));
        }
        if self.variants.contains_key(&variant.id) {
            return Err(CatalogError::DuplicateId);
        }
        if let Some(pct) = variant.discount_pct {
            if pct > 100 {
                return Err(CatalogError::DiscountOutOfRange(u32::from(pct)));
            }
        }
        let kind_key = (variant.ticket_type_id, variant.kind);
        if self.variant_kinds.contains_key(&kind_key) {
            return Err(CatalogError::DuplicateVariantKind {
                ticket_type: variant.ticket_type_id,
                kind: variant.kind,
            });
        }
        self.variant_kinds.insert(kind_key, variant.id);
        self.variants.insert(variant.id, variant);
        Ok(())
    }

    /// Gets a venue by id
    #[must_use]
    pub fn venue(&self, id: VenueId) -> Option<&Venue> {
        self.venues.get(&id)
    }

    /// Gets an event by id
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    /// Gets a performance by id
    #[must_use]
    pub fn performance(&self, id: PerformanceId) -> Option<&Performance> {
        self.performances.get(&id)
    }

    /// Gets a ticket type by id
    #[must_use]
    pub fn ticket_type(&self, id: TicketTypeId) -> Option<&TicketType> {
        self.ticket_types.get(&id)
    }

    /// Gets a variant by id
    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&TicketVariant> {
        self.variants.get(&id)
    }

    /// Looks up a ticket type by performance and name
    #[must_use]
    pub fn ticket_type_by_name(&self, performance: PerformanceId, name: &str) -> Option<&TicketType> {
        self.type_names
            .get(&(performance, name.to_string()))
            .and_then(|id| self.ticket_types.get(id))
    }

    /// Looks up a variant by ticket type and kind
    #[must_use]
    pub fn variant_by_kind(&self, ticket_type: TicketTypeId, kind: VariantKind) -> Option<&TicketVariant> {
        self.variant_kinds
            .get(&(ticket_type, kind))
            .and_then(|id| self.variants.get(id))
    }

    /// Iterates over all registered ticket types
    pub fn ticket_types(&self) -> impl Iterator<Item = &TicketType> {
        self.ticket_types.values()
    }

    /// Iterates over the variants of one ticket type
    pub fn variants_of(&self, ticket_type: TicketTypeId) -> impl Iterator<Item = &TicketVariant> {
        self.variants
            .values()
            .filter(move |variant| variant.ticket_type_id == ticket_type)
    }

    /// Returns the number of registered ticket types
    #[must_use]
    pub fn ticket_type_count(&self) -> usize {
        self.ticket_types.len()
    }
}
