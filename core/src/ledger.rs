//! Inventory ledger: linearizable availability accounting per ticket type.
//!
//! Each ticket type gets one account protected by its own mutex, so movements
//! on the same type serialize while different types proceed in parallel. An
//! account tracks the type-level availability, a counter per capped variant,
//! and the table of outstanding holds.
//!
//! The conservation invariant `available + Σ holds == initial` holds at every
//! instant. Debits beyond availability are rejected, never queued; credits
//! beyond the capacity ceiling are a fatal [`LedgerError::Corruption`], never
//! clamped. Releases are idempotent: a hold can only be credited back once.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::catalog::{TicketType, TicketVariant};
use crate::error::LedgerError;
use crate::types::{HoldId, TicketTypeId, VariantId};

/// Proof of a successful debit, redeemable exactly once by [`InventoryLedger::release`].
///
/// The token identifies the hold; the authoritative quantity and variant live
/// in the ledger's hold table, so a stale or replayed token can never credit
/// more than was debited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationToken {
    hold_id: HoldId,
    ticket_type: TicketTypeId,
    variant: VariantId,
    quantity: u32,
}

impl ReservationToken {
    /// Ticket type the hold was taken on
    #[must_use]
    pub const fn ticket_type(&self) -> TicketTypeId {
        self.ticket_type
    }

    /// Variant the hold was taken for
    #[must_use]
    pub const fn variant(&self) -> VariantId {
        self.variant
    }

    /// Number of tickets held
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Point-in-time availability of one ticket type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    /// Ticket type the snapshot describes
    pub ticket_type: TicketTypeId,
    /// Capacity ceiling
    pub initial: u32,
    /// Tickets currently purchasable
    pub available: u32,
    /// Tickets tied up in outstanding holds (unpaid and paid orders alike)
    pub held: u32,
    /// Per-variant availability for capped variants
    pub variants: Vec<VariantAvailability>,
}

/// Availability of one capped variant within a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAvailability {
    /// The capped variant
    pub variant: VariantId,
    /// Its quota within the type's capacity
    pub cap: u32,
    /// How much of the quota is left
    pub available: u32,
}

#[derive(Debug)]
struct VariantCounter {
    cap: u32,
    available: u32,
}

#[derive(Debug)]
struct Hold {
    variant: VariantId,
    quantity: u32,
}

#[derive(Debug)]
struct Account {
    initial: u32,
    available: u32,
    // Only variants that declare a cap get a counter; uncapped variants are
    // bounded by the type-level availability alone.
    variants: HashMap<VariantId, VariantCounter>,
    holds: HashMap<HoldId, Hold>,
}

/// The inventory ledger: one linearizable account per ticket type
#[derive(Debug, Default)]
pub struct InventoryLedger {
    accounts: RwLock<HashMap<TicketTypeId, Arc<Mutex<Account>>>>,
}

impl InventoryLedger {
    /// Creates an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account for a ticket type, seeding it at full capacity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyRegistered`] if the type already has an
    /// account.
    pub fn register<'a>(
        &self,
        ticket_type: &TicketType,
        variants: impl IntoIterator<Item = &'a TicketVariant>,
    ) -> Result<(), LedgerError> {
        let mut counters = HashMap::new();
        for variant in variants {
            if let Some(cap) = variant.cap {
                counters.insert(
                    variant.id,
                    VariantCounter {
                        cap,
                        available: cap,
                    },
                );
            }
        }

        let mut accounts = write_accounts(&self.accounts);
        if accounts.contains_key(&ticket_type.id) {
            return Err(LedgerError::AlreadyRegistered(ticket_type.id));
        }
        accounts.insert(
            ticket_type.id,
            Arc::new(Mutex::new(Account {
                initial: ticket_type.initial_quantity,
                available: ticket_type.initial_quantity,
                variants: counters,
                holds: HashMap::new(),
            })),
        );
        tracing::debug!(
            ticket_type = %ticket_type.id,
            capacity = ticket_type.initial_quantity,
            "ledger account opened"
        );
        Ok(())
    }

    /// Atomically debits `quantity` tickets from a type, checking the type
    /// availability and the variant cap (when one exists) under one lock.
    ///
    /// On success the debit is recorded as a hold and a token is returned.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidQuantity`] for a zero quantity,
    /// [`LedgerError::UnknownTicketType`] for an unregistered type, or
    /// [`LedgerError::InsufficientInventory`] when either the type or the
    /// variant quota cannot cover the debit. A rejected debit changes nothing.
    pub fn try_reserve(
        &self,
        ticket_type: TicketTypeId,
        variant: VariantId,
        quantity: u32,
    ) -> Result<ReservationToken, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        let account = self.account(ticket_type)?;
        let mut account = lock_account(&account);

        if account.available < quantity {
            return Err(LedgerError::InsufficientInventory {
                requested: quantity,
                available: account.available,
            });
        }
        if let Some(counter) = account.variants.get(&variant) {
            if counter.available < quantity {
                return Err(LedgerError::InsufficientInventory {
                    requested: quantity,
                    available: counter.available,
                });
            }
        }

        account.available -= quantity;
        if let Some(counter) = account.variants.get_mut(&variant) {
            counter.available -= quantity;
        }
        let hold_id = HoldId::new();
        account.holds.insert(hold_id, Hold { variant, quantity });

        Ok(ReservationToken {
            hold_id,
            ticket_type,
            variant,
            quantity,
        })
    }

    /// Credits a hold back to its account.
    ///
    /// Releasing is idempotent: the first call removes the hold and restores
    /// availability, any further call with the same token is a no-op. Returns
    /// the number of tickets credited (zero for a replay).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownTicketType`] if the token names a type
    /// with no account, or [`LedgerError::Corruption`] if the credit would
    /// push availability past the capacity ceiling or a variant past its cap.
    /// A corrupt credit is aborted with the ledger left untouched.
    pub fn release(&self, token: &ReservationToken) -> Result<u32, LedgerError> {
        let account = self.account(token.ticket_type)?;
        let mut account = lock_account(&account);

        let Some(hold) = account.holds.get(&token.hold_id) else {
            tracing::debug!(
                ticket_type = %token.ticket_type,
                quantity = token.quantity,
                "release replay ignored, hold already credited"
            );
            return Ok(0);
        };
        let quantity = hold.quantity;
        let variant = hold.variant;

        let restored = account.available.checked_add(quantity).filter(|total| *total <= account.initial);
        let Some(restored) = restored else {
            return Err(LedgerError::Corruption {
                ticket_type: token.ticket_type,
                detail: format!(
                    "crediting {quantity} would exceed capacity ({}/{})",
                    account.available, account.initial
                ),
            });
        };
        if let Some(counter) = account.variants.get(&variant) {
            let over_cap = counter
                .available
                .checked_add(quantity)
                .is_none_or(|total| total > counter.cap);
            if over_cap {
                return Err(LedgerError::Corruption {
                    ticket_type: token.ticket_type,
                    detail: format!(
                        "crediting {quantity} would exceed variant cap ({}/{})",
                        counter.available, counter.cap
                    ),
                });
            }
        }

        account.available = restored;
        if let Some(counter) = account.variants.get_mut(&variant) {
            counter.available += quantity;
        }
        account.holds.remove(&token.hold_id);
        Ok(quantity)
    }

    /// Reads a point-in-time availability snapshot for a type
    #[must_use]
    pub fn availability(&self, ticket_type: TicketTypeId) -> Option<AvailabilitySnapshot> {
        let account = self.account(ticket_type).ok()?;
        let account = lock_account(&account);
        let mut variants: Vec<VariantAvailability> = account
            .variants
            .iter()
            .map(|(variant, counter)| VariantAvailability {
                variant: *variant,
                cap: counter.cap,
                available: counter.available,
            })
            .collect();
        variants.sort_by_key(|entry| *entry.variant.as_uuid());
        Some(AvailabilitySnapshot {
            ticket_type,
            initial: account.initial,
            available: account.available,
            held: account.holds.values().map(|hold| hold.quantity).sum(),
            variants,
        })
    }

    fn account(&self, ticket_type: TicketTypeId) -> Result<Arc<Mutex<Account>>, LedgerError> {
        read_accounts(&self.accounts)
            .get(&ticket_type)
            .cloned()
            .ok_or(LedgerError::UnknownTicketType(ticket_type))
    }
}

type AccountMap = HashMap<TicketTypeId, Arc<Mutex<Account>>>;

fn read_accounts(accounts: &RwLock<AccountMap>) -> std::sync::RwLockReadGuard<'_, AccountMap> {
    accounts.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_accounts(accounts: &RwLock<AccountMap>) -> std::sync::RwLockWriteGuard<'_, AccountMap> {
    accounts.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock_account(account: &Mutex<Account>) -> MutexGuard<'_, Account> {
    account.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Money, PerformanceId, VariantKind};
    use proptest::prelude::*;

    fn ticket_type(capacity: u32) -> TicketType {
        TicketType {
            id: TicketTypeId::new(),
            performance_id: PerformanceId::new(),
            name: "Stalls".to_string(),
            price: Money::from_cents(10_000),
            initial_quantity: capacity,
        }
    }

    fn variant(ticket_type: TicketTypeId, kind: VariantKind, cap: Option<u32>) -> TicketVariant {
        TicketVariant {
            id: VariantId::new(),
            ticket_type_id: ticket_type,
            kind,
            price: Money::from_cents(10_000),
            fee: Money::from_cents(500),
            discount_pct: None,
            cap,
            active: true,
        }
    }

    fn snapshot(ledger: &InventoryLedger, tt: TicketTypeId) -> AvailabilitySnapshot {
        ledger.availability(tt).unwrap()
    }

    #[test]
    fn registration_seeds_full_capacity() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(50);
        let full = variant(tt.id, VariantKind::Full, None);
        let pcd = variant(tt.id, VariantKind::Pcd, Some(5));
        ledger.register(&tt, [&full, &pcd]).unwrap();

        let snap = snapshot(&ledger, tt.id);
        assert_eq!(snap.initial, 50);
        assert_eq!(snap.available, 50);
        assert_eq!(snap.held, 0);
        assert_eq!(snap.variants.len(), 1);
        assert_eq!(snap.variants[0].cap, 5);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(10);
        ledger.register(&tt, []).unwrap();
        assert_eq!(
            ledger.register(&tt, []),
            Err(LedgerError::AlreadyRegistered(tt.id))
        );
    }

    #[test]
    fn reserve_debits_type_and_capped_variant() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(20);
        let pcd = variant(tt.id, VariantKind::Pcd, Some(4));
        ledger.register(&tt, [&pcd]).unwrap();

        let token = ledger.try_reserve(tt.id, pcd.id, 3).unwrap();
        assert_eq!(token.quantity(), 3);

        let snap = snapshot(&ledger, tt.id);
        assert_eq!(snap.available, 17);
        assert_eq!(snap.held, 3);
        assert_eq!(snap.variants[0].available, 1);
    }

    #[test]
    fn reserve_rejects_zero_quantity() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(10);
        let full = variant(tt.id, VariantKind::Full, None);
        ledger.register(&tt, [&full]).unwrap();
        assert_eq!(
            ledger.try_reserve(tt.id, full.id, 0),
            Err(LedgerError::InvalidQuantity)
        );
    }

    #[test]
    fn reserve_rejects_unknown_type() {
        let ledger = InventoryLedger::new();
        assert!(matches!(
            ledger.try_reserve(TicketTypeId::new(), VariantId::new(), 1),
            Err(LedgerError::UnknownTicketType(_))
        ));
    }

    #[test]
    fn oversell_is_rejected_not_queued() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(5);
        let full = variant(tt.id, VariantKind::Full, None);
        ledger.register(&tt, [&full]).unwrap();

        ledger.try_reserve(tt.id, full.id, 4).unwrap();
        let err = ledger.try_reserve(tt.id, full.id, 2).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientInventory {
                requested: 2,
                available: 1,
            }
        );
        // The failed debit must not have touched the account
        assert_eq!(snapshot(&ledger, tt.id).available, 1);
    }

    #[test]
    fn variant_cap_binds_even_with_type_availability() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(100);
        let pcd = variant(tt.id, VariantKind::Pcd, Some(2));
        ledger.register(&tt, [&pcd]).unwrap();

        ledger.try_reserve(tt.id, pcd.id, 2).unwrap();
        let err = ledger.try_reserve(tt.id, pcd.id, 1).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientInventory {
                requested: 1,
                available: 0,
            }
        );
        // Type-level pool is still open
        assert_eq!(snapshot(&ledger, tt.id).available, 98);
    }

    #[test]
    fn release_credits_back_and_is_idempotent() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(10);
        let pcd = variant(tt.id, VariantKind::Pcd, Some(5));
        ledger.register(&tt, [&pcd]).unwrap();

        let token = ledger.try_reserve(tt.id, pcd.id, 4).unwrap();
        assert_eq!(ledger.release(&token).unwrap(), 4);

        let snap = snapshot(&ledger, tt.id);
        assert_eq!(snap.available, 10);
        assert_eq!(snap.held, 0);
        assert_eq!(snap.variants[0].available, 5);

        // Replay finds no hold and credits nothing
        assert_eq!(ledger.release(&token).unwrap(), 0);
        assert_eq!(snapshot(&ledger, tt.id).available, 10);
    }

    #[test]
    fn released_inventory_is_purchasable_again() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(2);
        let full = variant(tt.id, VariantKind::Full, None);
        ledger.register(&tt, [&full]).unwrap();

        let token = ledger.try_reserve(tt.id, full.id, 2).unwrap();
        assert!(ledger.try_reserve(tt.id, full.id, 1).is_err());

        ledger.release(&token).unwrap();
        assert!(ledger.try_reserve(tt.id, full.id, 2).is_ok());
    }

    #[test]
    fn over_credit_is_corruption_not_clamp() {
        let ledger = InventoryLedger::new();
        let tt = ticket_type(10);
        let full = variant(tt.id, VariantKind::Full, None);
        ledger.register(&tt, [&full]).unwrap();

        let token = ledger.try_reserve(tt.id, full.id, 3).unwrap();

        // Force the inconsistency a double credit would produce: restore
        // availability by hand while leaving the hold in place.
        {
            let account = ledger.account(tt.id).unwrap();
            let mut account = lock_account(&account);
            account.available = 10;
        }

        let err = ledger.release(&token).unwrap_err();
        assert!(matches!(err, LedgerError::Corruption { .. }));
        // Aborted, not applied: the hold is still on the books
        assert_eq!(snapshot(&ledger, tt.id).held, 3);
    }

    proptest! {
        // Conservation: whatever the interleaving of debits, credits, and
        // replayed credits, `available + Σ holds == initial` and no counter
        // leaves its bounds.
        #[test]
        fn conservation_invariant_holds(
            capacity in 1u32..40,
            ops in proptest::collection::vec((any::<bool>(), 1u32..6), 1..80)
        ) {
            let ledger = InventoryLedger::new();
            let tt = ticket_type(capacity);
            let full = variant(tt.id, VariantKind::Full, None);
            ledger.register(&tt, [&full]).unwrap();

            let mut live_tokens: Vec<ReservationToken> = Vec::new();
            let mut spent_tokens: Vec<ReservationToken> = Vec::new();

            for (reserve, quantity) in ops {
                if reserve {
                    if let Ok(token) = ledger.try_reserve(tt.id, full.id, quantity) {
                        live_tokens.push(token);
                    }
                } else if let Some(token) = live_tokens.pop() {
                    prop_assert_eq!(ledger.release(&token).unwrap(), token.quantity());
                    spent_tokens.push(token);
                } else if let Some(token) = spent_tokens.last() {
                    // Replay of an already-credited hold must be a no-op
                    prop_assert_eq!(ledger.release(token).unwrap(), 0);
                }

                let snap = ledger.availability(tt.id).unwrap();
                prop_assert!(snap.available <= capacity);
                prop_assert_eq!(snap.available + snap.held, capacity);
                let live_total: u32 = live_tokens.iter().map(ReservationToken::quantity).sum();
                prop_assert_eq!(snap.held, live_total);
            }
        }
    }
}
