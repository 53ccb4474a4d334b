use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::error;

use stockhold_core::{DomainError, DomainResult, VariantId};

/// Authoritative stock counters for one variant.
///
/// Invariant: `reserved_quantity <= total_quantity`, so the derived
/// `available_quantity` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StockRecord {
    variant_id: VariantId,
    total_quantity: u32,
    reserved_quantity: u32,
}

impl StockRecord {
    fn new(variant_id: VariantId, total_quantity: u32) -> Self {
        Self {
            variant_id,
            total_quantity,
            reserved_quantity: 0,
        }
    }

    fn snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            variant_id: self.variant_id,
            total_quantity: self.total_quantity,
            reserved_quantity: self.reserved_quantity,
            available_quantity: self.total_quantity - self.reserved_quantity,
        }
    }
}

/// Read-only view of a stock record at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockSnapshot {
    pub variant_id: VariantId,
    pub total_quantity: u32,
    pub reserved_quantity: u32,
    pub available_quantity: u32,
}

type Row = Arc<Mutex<StockRecord>>;
type RowGuard = parking_lot::lock_api::ArcMutexGuard<parking_lot::RawMutex, StockRecord>;

/// Exclusive hold on one variant's stock record.
///
/// The per-variant lock is held for the guard's lifetime; dropping the guard
/// releases it. All counter mutations live here, so no code path can touch a
/// record it has not locked.
pub struct StockGuard {
    inner: RowGuard,
}

impl StockGuard {
    pub fn variant_id(&self) -> VariantId {
        self.inner.variant_id
    }

    pub fn total_quantity(&self) -> u32 {
        self.inner.total_quantity
    }

    pub fn reserved_quantity(&self) -> u32 {
        self.inner.reserved_quantity
    }

    pub fn available_quantity(&self) -> u32 {
        self.inner.total_quantity - self.inner.reserved_quantity
    }

    pub fn snapshot(&self) -> StockSnapshot {
        self.inner.snapshot()
    }

    /// Move the reserved counter by `delta` (positive on reserve, negative on
    /// release). The result must stay within `0..=total_quantity`; anything
    /// else is a broken invariant, not a user error.
    pub fn adjust_reserved(&mut self, delta: i64) -> DomainResult<()> {
        let variant_id = self.inner.variant_id;
        let current = i64::from(self.inner.reserved_quantity);
        let next = current + delta;
        if next < 0 {
            return Err(defect(format!(
                "reserved_quantity for variant {variant_id} would go negative ({current} {delta:+})"
            )));
        }
        if next > i64::from(self.inner.total_quantity) {
            return Err(defect(format!(
                "reserved_quantity for variant {variant_id} would exceed total ({current} {delta:+} > {})",
                self.inner.total_quantity
            )));
        }
        self.inner.reserved_quantity = next as u32;
        Ok(())
    }

    /// Settle a hold: decrement both counters together. This is the only way
    /// stock leaves the ledger.
    pub fn commit_permanent_deduction(&mut self, quantity: u32) -> DomainResult<()> {
        let variant_id = self.inner.variant_id;
        let total = self
            .inner
            .total_quantity
            .checked_sub(quantity)
            .ok_or_else(|| {
                defect(format!(
                    "total_quantity for variant {variant_id} would go negative ({} - {quantity})",
                    self.inner.total_quantity
                ))
            })?;
        let reserved = self
            .inner
            .reserved_quantity
            .checked_sub(quantity)
            .ok_or_else(|| {
                defect(format!(
                    "permanent deduction of {quantity} on variant {variant_id} exceeds reserved ({})",
                    self.inner.reserved_quantity
                ))
            })?;
        self.inner.total_quantity = total;
        self.inner.reserved_quantity = reserved;
        Ok(())
    }

    /// Raise the total counter (goods received). Reserved is untouched.
    pub fn restock(&mut self, quantity: u32) -> DomainResult<()> {
        self.inner.total_quantity = self
            .inner
            .total_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("restock overflows total quantity"))?;
        Ok(())
    }
}

impl core::fmt::Debug for StockGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockGuard")
            .field("record", &*self.inner)
            .finish()
    }
}

fn defect(msg: String) -> DomainError {
    // Counter corruption is a bug, never user input. Surface it loudly.
    error!("stock invariant violated: {msg}");
    DomainError::invariant(msg)
}

/// The stock ledger: one lockable record per variant.
///
/// `lock_wait` bounds how long an acquisition may block before failing with
/// `LockTimeout`; `None` blocks indefinitely.
pub struct StockLedger {
    rows: RwLock<HashMap<VariantId, Row>>,
    lock_wait: Option<Duration>,
}

impl StockLedger {
    pub fn new(lock_wait: Option<Duration>) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            lock_wait,
        }
    }

    /// Register a variant with an initial total. Fails if the variant already
    /// has a record.
    pub fn create_record(
        &self,
        variant_id: VariantId,
        total_quantity: u32,
    ) -> DomainResult<StockSnapshot> {
        let mut rows = self.rows.write();
        if rows.contains_key(&variant_id) {
            return Err(DomainError::validation(format!(
                "stock record already exists for variant {variant_id}"
            )));
        }
        let record = StockRecord::new(variant_id, total_quantity);
        rows.insert(variant_id, Arc::new(Mutex::new(record)));
        Ok(record.snapshot())
    }

    fn row(&self, variant_id: VariantId) -> DomainResult<Row> {
        self.rows
            .read()
            .get(&variant_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("stock record for variant {variant_id}")))
    }

    /// Acquire the exclusive lock for a variant and return the guard.
    pub fn lock_and_get(&self, variant_id: VariantId) -> DomainResult<StockGuard> {
        let row = self.row(variant_id)?;
        let inner = match self.lock_wait {
            None => row.lock_arc(),
            Some(wait) => row
                .try_lock_arc_for(wait)
                .ok_or(DomainError::LockTimeout(variant_id))?,
        };
        Ok(StockGuard { inner })
    }

    /// Acquire locks for several variants.
    ///
    /// Ids are sorted ascending and deduplicated before acquisition, so any
    /// two callers locking overlapping sets walk them in the same global
    /// order and cannot deadlock against each other.
    pub fn lock_many(&self, variant_ids: &[VariantId]) -> DomainResult<Vec<StockGuard>> {
        let mut ids = variant_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.lock_and_get(id)?);
        }
        Ok(guards)
    }

    /// Read-only peek at a record (briefly takes the lock).
    pub fn snapshot(&self, variant_id: VariantId) -> DomainResult<StockSnapshot> {
        let row = self.row(variant_id)?;
        let record = row.lock();
        Ok(record.snapshot())
    }

    /// All registered variants, ascending.
    pub fn variant_ids(&self) -> Vec<VariantId> {
        let mut ids: Vec<VariantId> = self.rows.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for StockLedger {
    fn default() -> Self {
        Self::new(None)
    }
}

impl core::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockLedger")
            .field("variants", &self.rows.read().len())
            .field("lock_wait", &self.lock_wait)
            .finish()
    }
}
