use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use stockhold_core::{
    round_money, CartId, DomainError, DomainResult, OwnerId, ReservationId, VariantId,
};
use stockhold_inventory::StockLedger;
use tracing::{debug, error, info};

use crate::cart::CartStore;
use crate::reservation::Reservation;

/// Where a checkout attempt currently stands. Used for tracing and for the
/// abort log when an attempt fails part-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    Started,
    Validating,
    Committing,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettledLine {
    pub reservation_id: ReservationId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutReceipt {
    pub cart_id: CartId,
    pub lines: Vec<SettledLine>,
    pub total: Decimal,
    pub cart_deleted: bool,
}

/// Converts a cart's live holds into permanent stock deductions, all of
/// them or none of them.
///
/// Every distinct variant in the cart is locked up front, in the ledger's
/// fixed lock order, and every line is validated against the locked rows
/// before the first counter moves. A failure therefore leaves carts and
/// stock exactly as they were.
#[derive(Debug, Clone)]
pub struct CheckoutCoordinator {
    ledger: Arc<StockLedger>,
    store: Arc<CartStore>,
}

impl CheckoutCoordinator {
    pub fn new(ledger: Arc<StockLedger>, store: Arc<CartStore>) -> Self {
        Self { ledger, store }
    }

    pub fn checkout(&self, owner_id: OwnerId) -> DomainResult<CheckoutReceipt> {
        let mut phase = CheckoutPhase::Started;
        match self.run(owner_id, &mut phase) {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                let aborted_from = std::mem::replace(&mut phase, CheckoutPhase::Aborted);
                info!(%owner_id, aborted_from = ?aborted_from, error = %err, "checkout aborted");
                Err(err)
            }
        }
    }

    fn run(&self, owner_id: OwnerId, phase: &mut CheckoutPhase) -> DomainResult<CheckoutReceipt> {
        let cart = self
            .store
            .find_by_owner(owner_id)
            .ok_or_else(|| DomainError::not_found(format!("cart for owner {owner_id}")))?;
        let snapshot = self.store.reservations_for(cart.id);
        if snapshot.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        *phase = CheckoutPhase::Validating;
        debug!(%owner_id, cart_id = %cart.id, lines = snapshot.len(), "checkout validating");
        let variant_ids: Vec<VariantId> = snapshot.iter().map(|line| line.variant_id).collect();
        let mut guards = self.ledger.lock_many(&variant_ids)?;
        let by_variant: HashMap<VariantId, usize> = guards
            .iter()
            .enumerate()
            .map(|(index, guard)| (guard.variant_id(), index))
            .collect();

        // Re-read under the row locks. Holds swept since the snapshot drop
        // out here; lines added meanwhile on variants we do not hold stay
        // in the cart for a later attempt.
        let live: Vec<Reservation> = self
            .store
            .reservations_for(cart.id)
            .into_iter()
            .filter(|line| by_variant.contains_key(&line.variant_id))
            .collect();
        if live.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let mut required: HashMap<VariantId, u64> = HashMap::new();
        for line in &live {
            *required.entry(line.variant_id).or_default() += u64::from(line.quantity);
        }
        for guard in &guards {
            let Some(&needed) = required.get(&guard.variant_id()) else {
                continue;
            };
            let requested = u32::try_from(needed).unwrap_or(u32::MAX);
            if u64::from(guard.total_quantity()) < needed {
                return Err(DomainError::insufficient_stock(
                    guard.variant_id(),
                    requested,
                    guard.total_quantity(),
                ));
            }
            if u64::from(guard.reserved_quantity()) < needed {
                error!(
                    cart_id = %cart.id,
                    variant_id = %guard.variant_id(),
                    needed,
                    reserved = guard.reserved_quantity(),
                    "cart holds exceed the reserved counter"
                );
                return Err(DomainError::invariant(format!(
                    "cart {} holds more of variant {} than is reserved",
                    cart.id,
                    guard.variant_id()
                )));
            }
        }

        *phase = CheckoutPhase::Committing;
        for line in &live {
            let index = by_variant[&line.variant_id];
            guards[index].commit_permanent_deduction(line.quantity)?;
        }
        let consumed: Vec<ReservationId> = live.iter().map(|line| line.id).collect();
        let cart_deleted = self.store.settle(cart.id, &consumed);

        *phase = CheckoutPhase::Done;
        let total = round_money(live.iter().map(Reservation::line_total).sum());
        let lines: Vec<SettledLine> = live
            .into_iter()
            .map(|line| SettledLine {
                reservation_id: line.id,
                variant_id: line.variant_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        info!(
            %owner_id,
            cart_id = %cart.id,
            lines = lines.len(),
            %total,
            cart_deleted,
            "checkout complete"
        );
        Ok(CheckoutReceipt {
            cart_id: cart.id,
            lines,
            total,
            cart_deleted,
        })
    }
}
