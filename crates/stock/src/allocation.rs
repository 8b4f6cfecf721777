//! FIFO withdrawal.
//!
//! Allocation walks a partition oldest-first and takes `min(lot, remaining)`
//! from each lot until the request is met or the partition runs dry. A shortage
//! is not rolled back: whatever was available is consumed and the result says
//! so (`success == false`). Callers that need all-or-nothing must compensate
//! themselves.

use serde::{Deserialize, Serialize};

use foodbank_core::LotId;

use crate::lot::StockLot;

/// Quantity taken from one specific lot by an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedLot {
    pub lot_id: LotId,
    pub quantity_taken: i64,
}

/// Outcome of a `RemoveFromStock` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// True only when the full requested quantity was removed.
    pub success: bool,
    /// Consumed fragments, in the order they were taken (oldest lot first).
    pub consumed_lots: Vec<ConsumedLot>,
    /// Quantity actually removed.
    pub total_quantity: i64,
    pub requested_quantity: i64,
}

impl AllocationResult {
    pub(crate) fn new(requested_quantity: i64, consumed_lots: Vec<ConsumedLot>) -> Self {
        let total_quantity: i64 = consumed_lots.iter().map(|c| c.quantity_taken).sum();
        Self {
            success: total_quantity == requested_quantity,
            consumed_lots,
            total_quantity,
            requested_quantity,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.success
    }

    /// How much of the request could not be served.
    pub fn shortfall(&self) -> i64 {
        self.requested_quantity - self.total_quantity
    }
}

/// Withdraw up to `quantity_needed` from `lots`, which must already be in FIFO
/// order. Inert and empty lots are skipped.
pub(crate) fn withdraw_fifo(lots: &mut [StockLot], quantity_needed: i64) -> Vec<ConsumedLot> {
    let mut remaining = quantity_needed;
    let mut consumed = Vec::new();

    for lot in lots.iter_mut().filter(|l| l.is_allocatable()) {
        if remaining <= 0 {
            break;
        }
        let taken = lot.take(remaining);
        remaining -= taken;
        consumed.push(ConsumedLot {
            lot_id: lot.id(),
            quantity_taken: taken,
        });
    }

    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use foodbank_core::{AssociationId, IdGenerator, ProductId, SequentialIdGenerator};
    use proptest::prelude::*;

    use crate::lot::LotStatus;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
    }

    fn lots(quantities: &[i64]) -> Vec<StockLot> {
        let ids = SequentialIdGenerator::new();
        quantities
            .iter()
            .enumerate()
            .map(|(i, q)| {
                StockLot::new(
                    LotId::from_uuid(ids.next_uuid()),
                    ProductId::new("p1").unwrap(),
                    "Rice".to_string(),
                    *q,
                    AssociationId::new("assoc1").unwrap(),
                    "Shelf B".to_string(),
                    None,
                    None,
                    t0() + Duration::hours(i as i64),
                )
            })
            .collect()
    }

    #[test]
    fn oldest_lot_is_exhausted_before_the_next_is_touched() {
        let mut ls = lots(&[3, 5]);
        let (a, b) = (ls[0].id(), ls[1].id());

        let consumed = withdraw_fifo(&mut ls, 4);

        assert_eq!(
            consumed,
            vec![
                ConsumedLot { lot_id: a, quantity_taken: 3 },
                ConsumedLot { lot_id: b, quantity_taken: 1 },
            ]
        );
        assert_eq!(ls[0].status(), LotStatus::Distributed);
        assert_eq!(ls[1].quantity(), 4);
        assert_eq!(ls[1].status(), LotStatus::Available);
    }

    #[test]
    fn shortage_takes_everything_available() {
        let mut ls = lots(&[3]);
        let consumed = withdraw_fifo(&mut ls, 5);
        let result = AllocationResult::new(5, consumed);

        assert!(!result.success);
        assert!(result.is_partial());
        assert_eq!(result.total_quantity, 3);
        assert_eq!(result.shortfall(), 2);
        assert_eq!(ls[0].quantity(), 0);
        assert_eq!(ls[0].status(), LotStatus::Distributed);
    }

    #[test]
    fn exact_fit_stops_without_touching_later_lots() {
        let mut ls = lots(&[2, 2, 2]);
        let consumed = withdraw_fifo(&mut ls, 4);

        assert_eq!(consumed.len(), 2);
        assert_eq!(ls[2].quantity(), 2);
        assert!(AllocationResult::new(4, consumed).success);
    }

    #[test]
    fn inert_lots_are_skipped() {
        let mut ls = lots(&[4, 4]);
        ls[0].mark_expired();

        let consumed = withdraw_fifo(&mut ls, 3);

        assert_eq!(consumed.len(), 1);
        assert_eq!(consumed[0].lot_id, ls[1].id());
        assert_eq!(ls[0].quantity(), 4);
    }

    #[test]
    fn empty_partition_yields_failed_result() {
        let result = AllocationResult::new(2, withdraw_fifo(&mut [], 2));
        assert!(!result.success);
        assert_eq!(result.total_quantity, 0);
        assert!(result.consumed_lots.is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: withdrawal conserves quantity and never drives a lot negative.
        #[test]
        fn withdrawal_conserves_quantity(
            quantities in prop::collection::vec(1i64..50, 0..8),
            needed in 1i64..300,
        ) {
            let mut ls = lots(&quantities);
            let before: i64 = ls.iter().map(StockLot::quantity).sum();

            let result = AllocationResult::new(needed, withdraw_fifo(&mut ls, needed));
            let after: i64 = ls.iter().map(StockLot::quantity).sum();

            prop_assert_eq!(before - after, result.total_quantity);
            prop_assert_eq!(result.total_quantity, needed.min(before));
            prop_assert_eq!(result.success, before >= needed);
            prop_assert!(ls.iter().all(|l| l.quantity() >= 0));
        }

        /// Property: only the last consumed lot may be left partially filled.
        #[test]
        fn earlier_lots_are_fully_drained(
            quantities in prop::collection::vec(1i64..50, 1..8),
            needed in 1i64..300,
        ) {
            let mut ls = lots(&quantities);
            let consumed = withdraw_fifo(&mut ls, needed);

            if let Some((_, head)) = consumed.split_last() {
                for (fragment, lot) in head.iter().zip(&ls) {
                    prop_assert_eq!(fragment.lot_id, lot.id());
                    prop_assert_eq!(lot.quantity(), 0);
                }
            }
        }
    }
}
