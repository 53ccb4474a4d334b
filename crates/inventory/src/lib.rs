//! Inventory domain module: the authoritative stock ledger.
//!
//! The ledger is the single writer for stock counters. Every mutation runs
//! under that variant's exclusive lock; callers hold a [`StockGuard`] for the
//! whole unit of work, so "lock held" is a type-level precondition rather than
//! a convention.

pub mod ledger;

pub use ledger::{StockGuard, StockLedger, StockSnapshot};
