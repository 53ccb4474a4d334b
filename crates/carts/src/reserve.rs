use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use stockhold_core::{DomainError, DomainResult, OwnerId, ReservationId, VariantId};
use stockhold_inventory::StockLedger;
use tracing::{debug, warn};

use crate::cart::CartStore;
use crate::reservation::Reservation;

/// Hold length applied when no override is configured.
pub const DEFAULT_HOLD_MINUTES: i64 = 15;

/// Outcome counts for one expiry sweep pass.
///
/// `skipped` counts holds that disappeared between the expiry scan and the
/// release itself, which happens when a checkout or a concurrent sweep got
/// there first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub released: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Creates timed stock holds and releases the ones that lapse.
///
/// Reserving locks the variant's stock row, checks availability, bumps the
/// reserved counter and records the hold in the cart store before the row
/// lock is dropped. A hold can therefore never exist without its counter
/// increment or vice versa.
#[derive(Debug, Clone)]
pub struct ReservationManager {
    ledger: Arc<StockLedger>,
    store: Arc<CartStore>,
    hold_duration: Duration,
}

impl ReservationManager {
    pub fn new(ledger: Arc<StockLedger>, store: Arc<CartStore>, hold_duration: Duration) -> Self {
        Self {
            ledger,
            store,
            hold_duration,
        }
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold_duration
    }

    /// Places a hold on `quantity` units of the variant for the owner's
    /// cart. Fails without touching any counter when the variant has fewer
    /// units available than requested.
    pub fn reserve(
        &self,
        owner_id: OwnerId,
        variant_id: VariantId,
        quantity: u32,
        unit_price: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price < Decimal::ZERO {
            return Err(DomainError::validation("unit price cannot be negative"));
        }

        let mut guard = self.ledger.lock_and_get(variant_id)?;
        let available = guard.available_quantity();
        if available < quantity {
            return Err(DomainError::insufficient_stock(
                variant_id, quantity, available,
            ));
        }
        guard.adjust_reserved(i64::from(quantity))?;
        let reservation = self.store.attach_to_owner(
            owner_id,
            variant_id,
            quantity,
            unit_price,
            now,
            now + self.hold_duration,
        );
        debug!(
            %owner_id,
            %variant_id,
            quantity,
            reservation_id = %reservation.id,
            "stock reserved"
        );
        Ok(reservation)
    }

    /// Releases every hold whose deadline has passed. Each hold is handled
    /// in isolation so one bad row cannot leave the rest expired forever.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        for (reservation_id, variant_id) in self.store.expired(now) {
            match self.release_one(reservation_id, variant_id) {
                Ok(true) => report.released += 1,
                Ok(false) => report.skipped += 1,
                Err(err) => {
                    warn!(
                        %reservation_id,
                        %variant_id,
                        error = %err,
                        "failed to release expired hold"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn release_one(
        &self,
        reservation_id: ReservationId,
        variant_id: VariantId,
    ) -> DomainResult<bool> {
        let mut guard = self.ledger.lock_and_get(variant_id)?;
        // Gone between scan and lock: a checkout or another sweep won.
        let Some(reservation) = self.store.remove_reservation(reservation_id) else {
            return Ok(false);
        };
        guard.adjust_reserved(-i64::from(reservation.quantity))?;
        debug!(%reservation_id, %variant_id, quantity = reservation.quantity, "hold released");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::thread;

    fn fixture(total: u32) -> (Arc<StockLedger>, Arc<CartStore>, ReservationManager, VariantId) {
        let ledger = Arc::new(StockLedger::new(None));
        let variant_id = VariantId::new();
        ledger.create_record(variant_id, total).unwrap();
        let store = Arc::new(CartStore::new());
        let manager = ReservationManager::new(
            Arc::clone(&ledger),
            Arc::clone(&store),
            Duration::minutes(DEFAULT_HOLD_MINUTES),
        );
        (ledger, store, manager, variant_id)
    }

    #[test]
    fn reserve_rejects_zero_quantity() {
        let (_, _, manager, variant_id) = fixture(10);

        let err = manager
            .reserve(OwnerId::new(), variant_id, 0, dec!(10.00), Utc::now())
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn reserve_rejects_negative_unit_price() {
        let (_, _, manager, variant_id) = fixture(10);

        let err = manager
            .reserve(OwnerId::new(), variant_id, 1, dec!(-0.01), Utc::now())
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn reserve_unknown_variant_is_not_found() {
        let (_, _, manager, _) = fixture(10);

        let err = manager
            .reserve(OwnerId::new(), VariantId::new(), 1, dec!(10.00), Utc::now())
            .unwrap_err();
        match err {
            DomainError::NotFound(_) => {}
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn reserve_records_the_hold_and_counts_it_as_reserved() {
        let (ledger, store, manager, variant_id) = fixture(10);
        let owner_id = OwnerId::new();
        let now = Utc::now();

        let reservation = manager
            .reserve(owner_id, variant_id, 2, dec!(49.99), now)
            .unwrap();

        assert_eq!(reservation.quantity, 2);
        assert_eq!(reservation.expires_at, now + Duration::minutes(15));

        let snapshot = ledger.snapshot(variant_id).unwrap();
        assert_eq!(snapshot.total_quantity, 10);
        assert_eq!(snapshot.reserved_quantity, 2);
        assert_eq!(snapshot.available_quantity, 8);

        let cart = store.find_by_owner(owner_id).unwrap();
        assert_eq!(cart.id, reservation.cart_id);
        assert_eq!(store.reservations_for(cart.id), vec![reservation]);
    }

    #[test]
    fn repeat_reserves_share_the_owner_cart() {
        let (_, store, manager, variant_id) = fixture(10);
        let owner_id = OwnerId::new();
        let now = Utc::now();

        let first = manager
            .reserve(owner_id, variant_id, 1, dec!(5.00), now)
            .unwrap();
        let second = manager
            .reserve(owner_id, variant_id, 2, dec!(5.00), now)
            .unwrap();

        assert_eq!(first.cart_id, second.cart_id);
        assert_eq!(store.reservations_for(first.cart_id).len(), 2);
    }

    #[test]
    fn reserve_beyond_available_fails_and_leaves_counters_alone() {
        let (ledger, store, manager, variant_id) = fixture(10);
        let owner_id = OwnerId::new();
        manager
            .reserve(owner_id, variant_id, 4, dec!(10.00), Utc::now())
            .unwrap();

        let err = manager
            .reserve(owner_id, variant_id, 7, dec!(10.00), Utc::now())
            .unwrap_err();
        match err {
            DomainError::InsufficientStock {
                variant_id: v,
                requested,
                available,
            } => {
                assert_eq!(v, variant_id);
                assert_eq!(requested, 7);
                assert_eq!(available, 6);
            }
            other => panic!("Expected InsufficientStock, got {other:?}"),
        }

        let snapshot = ledger.snapshot(variant_id).unwrap();
        assert_eq!(snapshot.reserved_quantity, 4);
        assert_eq!(store.reservations_for(store.find_by_owner(owner_id).unwrap().id).len(), 1);
    }

    #[test]
    fn concurrent_reserves_never_exceed_available_stock() {
        let (ledger, _, manager, variant_id) = fixture(10);

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || {
                    manager
                        .reserve(OwnerId::new(), variant_id, 3, dec!(10.00), Utc::now())
                        .is_ok()
                })
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 3);
        let snapshot = ledger.snapshot(variant_id).unwrap();
        assert_eq!(snapshot.reserved_quantity, 9);
        assert_eq!(snapshot.available_quantity, 1);
    }

    #[test]
    fn sweep_releases_only_lapsed_holds() {
        let (ledger, store, manager, variant_id) = fixture(10);
        let owner_id = OwnerId::new();
        let start = Utc::now();
        manager
            .reserve(owner_id, variant_id, 2, dec!(10.00), start)
            .unwrap();
        manager
            .reserve(owner_id, variant_id, 3, dec!(10.00), start + Duration::minutes(10))
            .unwrap();

        // 16 minutes in: only the first hold is past its deadline.
        let report = manager.sweep_expired(start + Duration::minutes(16));
        assert_eq!(
            report,
            SweepReport {
                released: 1,
                skipped: 0,
                failed: 0
            }
        );

        let snapshot = ledger.snapshot(variant_id).unwrap();
        assert_eq!(snapshot.reserved_quantity, 3);
        let cart = store.find_by_owner(owner_id).unwrap();
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn sweep_with_nothing_expired_reports_zeroes() {
        let (_, _, manager, variant_id) = fixture(10);
        let now = Utc::now();
        manager
            .reserve(OwnerId::new(), variant_id, 2, dec!(10.00), now)
            .unwrap();

        let report = manager.sweep_expired(now + Duration::minutes(14));
        assert_eq!(report, SweepReport::default());
    }

    #[test]
    fn overlapping_sweeps_release_each_hold_exactly_once() {
        let (ledger, _, manager, variant_id) = fixture(50);
        let start = Utc::now();
        for _ in 0..10 {
            manager
                .reserve(OwnerId::new(), variant_id, 5, dec!(1.00), start)
                .unwrap();
        }
        let sweep_at = start + Duration::minutes(16);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || manager.sweep_expired(sweep_at))
            })
            .collect();
        let reports: Vec<SweepReport> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let released: usize = reports.iter().map(|r| r.released).sum();
        let failed: usize = reports.iter().map(|r| r.failed).sum();
        assert_eq!(released, 10);
        assert_eq!(failed, 0);
        let snapshot = ledger.snapshot(variant_id).unwrap();
        assert_eq!(snapshot.reserved_quantity, 0);
        assert_eq!(snapshot.available_quantity, 50);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Reserve(u32),
            AdvanceAndSweep,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..5).prop_map(Op::Reserve),
                Just(Op::AdvanceAndSweep),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// The reserved counter always equals the sum of live hold
            /// quantities, whatever order reserves and sweeps land in.
            #[test]
            fn reserved_counter_tracks_live_holds(
                ops in proptest::collection::vec(op_strategy(), 1..40)
            ) {
                let (ledger, store, manager, variant_id) = fixture(20);
                let owner_id = OwnerId::new();
                let mut now = Utc::now();

                for op in ops {
                    match op {
                        Op::Reserve(quantity) => {
                            let _ = manager.reserve(
                                owner_id,
                                variant_id,
                                quantity,
                                dec!(10.00),
                                now,
                            );
                        }
                        Op::AdvanceAndSweep => {
                            now += Duration::minutes(DEFAULT_HOLD_MINUTES + 5);
                            manager.sweep_expired(now);
                        }
                    }

                    let held: u32 = store
                        .find_by_owner(owner_id)
                        .map(|cart| {
                            store
                                .reservations_for(cart.id)
                                .iter()
                                .map(|r| r.quantity)
                                .sum()
                        })
                        .unwrap_or(0);
                    let snapshot = ledger.snapshot(variant_id).unwrap();
                    prop_assert_eq!(snapshot.reserved_quantity, held);
                    prop_assert_eq!(
                        snapshot.available_quantity,
                        snapshot.total_quantity - held
                    );
                }
            }
        }
    }
}
