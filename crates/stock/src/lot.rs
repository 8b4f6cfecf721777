use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodbank_core::{AssociationId, LotId, ProductId};

/// Lot lifecycle.
///
/// Only `Available` lots take part in allocation, availability totals and
/// expiration scans. `Reserved` has no producer yet and is treated like the
/// other inert states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotStatus {
    Available,
    Reserved,
    Distributed,
    Expired,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Available => "available",
            LotStatus::Reserved => "reserved",
            LotStatus::Distributed => "distributed",
            LotStatus::Expired => "expired",
        }
    }
}

impl core::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quantity of one product entered into stock at one time.
///
/// Lots are never removed. Once a lot leaves `Available` it is kept only for
/// audit and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLot {
    id: LotId,
    product_id: ProductId,
    /// Catalog name at entry time (display copy, never re-validated).
    product_name: String,
    quantity: i64,
    entry_date: DateTime<Utc>,
    expiration_date: Option<DateTime<Utc>>,
    donation_id: Option<String>,
    location: String,
    association_id: AssociationId,
    status: LotStatus,
}

impl StockLot {
    /// Build a fresh `Available` lot. Callers validate `quantity > 0` first.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: LotId,
        product_id: ProductId,
        product_name: String,
        quantity: i64,
        association_id: AssociationId,
        location: String,
        donation_id: Option<String>,
        expiration_date: Option<DateTime<Utc>>,
        entry_date: DateTime<Utc>,
    ) -> Self {
        debug_assert!(quantity > 0);
        Self {
            id,
            product_id,
            product_name,
            quantity,
            entry_date,
            expiration_date,
            donation_id,
            location,
            association_id,
            status: LotStatus::Available,
        }
    }

    pub fn id(&self) -> LotId {
        self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn entry_date(&self) -> DateTime<Utc> {
        self.entry_date
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    pub fn donation_id(&self) -> Option<&str> {
        self.donation_id.as_deref()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn association_id(&self) -> &AssociationId {
        &self.association_id
    }

    pub fn status(&self) -> LotStatus {
        self.status
    }

    pub fn is_available(&self) -> bool {
        self.status == LotStatus::Available
    }

    /// Can this lot still hand out quantity?
    pub fn is_allocatable(&self) -> bool {
        self.is_available() && self.quantity > 0
    }

    /// Available, dated, and expiring at or before `cutoff`.
    pub fn expires_by(&self, cutoff: DateTime<Utc>) -> bool {
        self.is_available() && self.expiration_date.is_some_and(|d| d <= cutoff)
    }

    /// Remove `amount` from the lot, moving it to `Distributed` when emptied.
    ///
    /// Returns the quantity actually taken, which never exceeds what the lot holds.
    pub(crate) fn take(&mut self, amount: i64) -> i64 {
        if !self.is_allocatable() || amount <= 0 {
            return 0;
        }
        let taken = amount.min(self.quantity);
        self.quantity -= taken;
        if self.quantity == 0 {
            self.status = LotStatus::Distributed;
        }
        taken
    }

    /// Move an available lot to `Expired`. The remaining quantity stays on the
    /// lot as the written-off amount.
    pub(crate) fn mark_expired(&mut self) -> bool {
        if !self.is_available() {
            return false;
        }
        self.status = LotStatus::Expired;
        true
    }
}
