use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockhold_core::{CartId, OwnerId, ReservationId, VariantId};

use crate::reservation::Reservation;

/// Computed from the cart's live lines: a cart whose holds have all expired
/// or been released shows up as `Emptied` until something is added again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartStatus {
    Active,
    Emptied,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub owner_id: OwnerId,
    pub status: CartStatus,
    pub lines: Vec<ReservationId>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    fn new(owner_id: OwnerId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: CartId::new(),
            owner_id,
            status: CartStatus::Emptied,
            lines: Vec::new(),
            created_at,
        }
    }

    fn recompute_status(&mut self) {
        self.status = if self.lines.is_empty() {
            CartStatus::Emptied
        } else {
            CartStatus::Active
        };
    }
}

#[derive(Debug, Default)]
struct Inner {
    carts: HashMap<CartId, Cart>,
    by_owner: HashMap<OwnerId, CartId>,
    reservations: HashMap<ReservationId, Reservation>,
}

/// In-memory home of carts and their reservations. One cart per owner;
/// the cart is created on first reservation and deleted by a checkout
/// that consumes its last line.
///
/// The store lock is only ever held for short map operations. Callers
/// that also hold stock row locks must take those first.
#[derive(Debug, Default)]
pub struct CartStore {
    inner: RwLock<Inner>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hold against the owner's cart, creating the cart if the
    /// owner does not have one. Resolution and attachment happen under a
    /// single write lock so a concurrently deleted cart cannot strand the
    /// reservation.
    pub fn attach_to_owner(
        &self,
        owner_id: OwnerId,
        variant_id: VariantId,
        quantity: u32,
        unit_price: Decimal,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Reservation {
        let mut inner = self.inner.write();
        let cart_id = match inner.by_owner.get(&owner_id) {
            Some(id) => *id,
            None => {
                let cart = Cart::new(owner_id, created_at);
                let id = cart.id;
                inner.by_owner.insert(owner_id, id);
                inner.carts.insert(id, cart);
                id
            }
        };
        let reservation = Reservation {
            id: ReservationId::new(),
            cart_id,
            variant_id,
            quantity,
            unit_price,
            created_at,
            expires_at,
        };
        inner
            .reservations
            .insert(reservation.id, reservation.clone());
        if let Some(cart) = inner.carts.get_mut(&cart_id) {
            cart.lines.push(reservation.id);
            cart.recompute_status();
        }
        reservation
    }

    pub fn find_by_owner(&self, owner_id: OwnerId) -> Option<Cart> {
        let inner = self.inner.read();
        let cart_id = inner.by_owner.get(&owner_id)?;
        inner.carts.get(cart_id).cloned()
    }

    /// Reservations for the cart in line order.
    pub fn reservations_for(&self, cart_id: CartId) -> Vec<Reservation> {
        let inner = self.inner.read();
        let Some(cart) = inner.carts.get(&cart_id) else {
            return Vec::new();
        };
        cart.lines
            .iter()
            .filter_map(|id| inner.reservations.get(id).cloned())
            .collect()
    }

    /// Detaches a single reservation from its cart. Returns `None` when the
    /// reservation is already gone, which lets racing releases stay
    /// idempotent.
    pub fn remove_reservation(&self, reservation_id: ReservationId) -> Option<Reservation> {
        let mut inner = self.inner.write();
        let reservation = inner.reservations.remove(&reservation_id)?;
        if let Some(cart) = inner.carts.get_mut(&reservation.cart_id) {
            cart.lines.retain(|id| *id != reservation_id);
            cart.recompute_status();
        }
        Some(reservation)
    }

    /// Ids of all holds whose deadline has passed, oldest first.
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<(ReservationId, VariantId)> {
        let inner = self.inner.read();
        let mut expired: Vec<_> = inner
            .reservations
            .values()
            .filter(|r| r.is_expired(now))
            .map(|r| (r.id, r.variant_id))
            .collect();
        expired.sort_unstable_by_key(|(id, _)| *id);
        expired
    }

    /// Removes the consumed lines after a checkout commit. Deletes the cart
    /// when nothing is left in it and reports whether it did.
    pub fn settle(&self, cart_id: CartId, consumed: &[ReservationId]) -> bool {
        let mut inner = self.inner.write();
        for id in consumed {
            inner.reservations.remove(id);
        }
        let Some(cart) = inner.carts.get_mut(&cart_id) else {
            return false;
        };
        cart.lines.retain(|id| !consumed.contains(id));
        if cart.lines.is_empty() {
            let owner_id = cart.owner_id;
            inner.carts.remove(&cart_id);
            inner.by_owner.remove(&owner_id);
            true
        } else {
            cart.recompute_status();
            false
        }
    }
}
