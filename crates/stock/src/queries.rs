//! Read-side aggregates over the ledger and the movement log.
//!
//! Pure functions: the engine calls them under its read lock so each result
//! is a consistent snapshot.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use foodbank_core::{AssociationId, ProductId};

use crate::ledger::{PartitionKey, StockLedger};
use crate::lot::StockLot;
use crate::movement::{MovementLog, StockMovement};

/// A known product whose available stock is below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalStockProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub current_stock: i64,
    pub threshold: i64,
    pub shortage: i64,
}

/// Sum of quantity over available lots of one partition.
pub fn available_quantity(
    ledger: &StockLedger,
    product_id: &ProductId,
    association_id: &AssociationId,
) -> i64 {
    available_in(ledger.partition(&PartitionKey::new(product_id, association_id)))
}

fn available_in(lots: &[StockLot]) -> i64 {
    lots.iter()
        .filter(|l| l.is_available())
        .map(StockLot::quantity)
        .fold(0, i64::saturating_add)
}

/// `now + days`, clamped to the representable range.
pub fn expiry_cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(if days < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// Available, dated lots expiring on or before `now + days_threshold` days,
/// soonest expiration first. Lots already past their date are included until
/// the sweeper transitions them.
pub fn expiring_lots(
    ledger: &StockLedger,
    association_id: &AssociationId,
    days_threshold: i64,
    now: DateTime<Utc>,
) -> Vec<StockLot> {
    let cutoff = expiry_cutoff(now, days_threshold);
    let mut lots: Vec<StockLot> = ledger
        .association_partitions(association_id)
        .flat_map(|(_, lots)| lots.iter())
        .filter(|l| l.expires_by(cutoff))
        .cloned()
        .collect();

    lots.sort_by_key(|l| (l.expiration_date(), l.entry_date()));
    lots
}

/// Products with at least one lot record in the association whose available
/// total is strictly below `threshold`, ordered by product id.
///
/// Products that never entered this association's ledger are not reported.
pub fn critical_products(
    ledger: &StockLedger,
    association_id: &AssociationId,
    threshold: i64,
) -> Vec<CriticalStockProduct> {
    ledger
        .association_partitions(association_id)
        .filter_map(|(key, lots)| {
            let current_stock = available_in(lots);
            if current_stock >= threshold {
                return None;
            }
            // Most recent entry carries the freshest display name.
            let product_name = lots.last().map(|l| l.product_name().to_string())?;
            Some(CriticalStockProduct {
                product_id: key.product_id.clone(),
                product_name,
                current_stock,
                threshold,
                shortage: threshold.saturating_sub(current_stock),
            })
        })
        .collect()
}

/// Movements whose lot matches the given filters, newest first.
///
/// Movements with equal timestamps are returned in reverse recording order.
pub fn movements(
    ledger: &StockLedger,
    log: &MovementLog,
    association_id: Option<&AssociationId>,
    product_id: Option<&ProductId>,
) -> Vec<StockMovement> {
    let mut out: Vec<StockMovement> = log
        .entries()
        .iter()
        .rev()
        .filter(|m| {
            if association_id.is_none() && product_id.is_none() {
                return true;
            }
            let Some(lot) = ledger.get(m.stock_item_id) else {
                return false;
            };
            association_id.is_none_or(|a| lot.association_id() == a)
                && product_id.is_none_or(|p| lot.product_id() == p)
        })
        .cloned()
        .collect();

    // Stable: equal timestamps keep the reversed recording order.
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out
}
