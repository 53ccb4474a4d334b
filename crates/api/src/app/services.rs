use std::sync::Arc;

use parking_lot::Mutex;

use stockhold_carts::{CartStore, CheckoutCoordinator, ReservationManager};
use stockhold_catalog::CatalogStore;
use stockhold_infra::sweeper::{ReservationSweeper, ReservationSweeperHandle};
use stockhold_inventory::StockLedger;
use stockhold_pricing::RuleStore;

use crate::app::config::AppConfig;

/// Shared state behind every handler: the stores, the reservation and
/// checkout services built over them, and the sweeper that keeps holds
/// honest. One instance per process (or per test server).
pub struct AppServices {
    pub ledger: Arc<StockLedger>,
    pub catalog: Arc<CatalogStore>,
    pub carts: Arc<CartStore>,
    pub reservations: Arc<ReservationManager>,
    pub checkout: CheckoutCoordinator,
    pub pricing_rules: Arc<RuleStore>,
    sweeper: Mutex<Option<ReservationSweeperHandle>>,
}

pub fn build_services(config: AppConfig) -> AppServices {
    let ledger = Arc::new(StockLedger::new(config.lock_wait));
    let catalog = Arc::new(CatalogStore::new());
    let carts = Arc::new(CartStore::new());
    let reservations = Arc::new(ReservationManager::new(
        Arc::clone(&ledger),
        Arc::clone(&carts),
        config.hold_duration,
    ));
    let checkout = CheckoutCoordinator::new(Arc::clone(&ledger), Arc::clone(&carts));

    let sweeper = ReservationSweeper {
        interval: config.sweep_interval,
    }
    .spawn("reservation.sweeper", Arc::clone(&reservations));

    AppServices {
        ledger,
        catalog,
        carts,
        reservations,
        checkout,
        pricing_rules: Arc::new(RuleStore::new()),
        sweeper: Mutex::new(Some(sweeper)),
    }
}

impl Drop for AppServices {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.shutdown();
        }
    }
}
