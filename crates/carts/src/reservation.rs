use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockhold_core::{CartId, ReservationId, VariantId};

/// A timed hold on stock, created when a line is added to a cart.
///
/// The hold counts against the variant's reserved quantity until it is
/// either consumed by checkout or released by the expiry sweep. The unit
/// price is captured at reservation time and does not track later catalog
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub cart_id: CartId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Reservation {
    /// A hold is expired once `now` has passed `expires_at`. A hold whose
    /// deadline equals `now` is still live.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
