//! Transition of lots past their expiration date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodbank_core::{AssociationId, LotId, ProductId};

use crate::ledger::StockLedger;

/// A lot moved to `Expired` by a sweep, with the quantity written off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredLot {
    pub lot_id: LotId,
    pub product_id: ProductId,
    pub association_id: AssociationId,
    pub quantity: i64,
}

/// Expire every available lot whose expiration date is `<= now`.
///
/// Already-expired (or otherwise inert) lots are not considered, so repeated
/// sweeps with the same `now` return nothing new.
pub(crate) fn expire_due(ledger: &mut StockLedger, now: DateTime<Utc>) -> Vec<ExpiredLot> {
    ledger
        .iter_mut()
        .filter(|lot| lot.expires_by(now))
        .filter_map(|lot| {
            lot.mark_expired().then(|| ExpiredLot {
                lot_id: lot.id(),
                product_id: lot.product_id().clone(),
                association_id: lot.association_id().clone(),
                quantity: lot.quantity(),
            })
        })
        .collect()
}
