//! Carts domain module: reservations, carts, and checkout.
//!
//! A cart line is a time-bounded hold against the stock ledger. This crate
//! owns the full hold lifecycle: placing it (reserve), reclaiming it after
//! expiry (sweep), and converting it into a permanent deduction (checkout).

pub mod cart;
pub mod checkout;
pub mod reservation;
pub mod reserve;

pub use cart::{Cart, CartStatus, CartStore};
pub use checkout::{CheckoutCoordinator, CheckoutPhase, CheckoutReceipt, SettledLine};
pub use reservation::Reservation;
pub use reserve::{ReservationManager, SweepReport, DEFAULT_HOLD_MINUTES};
