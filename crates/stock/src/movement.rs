//! Append-only movement history.
//!
//! The lot is the source of truth for current state; the movement log is the
//! source of truth for audit. Every quantity change to a lot produces exactly
//! one record here, and records are never edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodbank_core::{LotId, MovementId, OperatorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Entry,
    Exit,
    /// Reserved for inter-association transfers; not produced by the engine.
    Transfer,
    Expiry,
}

impl MovementType {
    /// Sign of this movement's effect on a lot's sellable balance.
    pub fn direction(&self) -> i64 {
        match self {
            MovementType::Entry => 1,
            MovementType::Exit | MovementType::Expiry => -1,
            MovementType::Transfer => 0,
        }
    }
}

/// Who performed a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
}

impl Operator {
    pub fn new(id: OperatorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Immutable audit record of one quantity change to one lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub stock_item_id: LotId,
    #[serde(rename = "type")]
    pub kind: MovementType,
    /// Magnitude of the change; always positive.
    pub quantity: i64,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub operator_id: OperatorId,
    pub operator_name: String,
}

impl StockMovement {
    /// Signed effect on the lot's balance.
    pub fn delta(&self) -> i64 {
        self.kind.direction() * self.quantity
    }
}

/// Append-only store of [`StockMovement`]s, in recording order.
#[derive(Debug, Default, Clone)]
pub struct MovementLog {
    entries: Vec<StockMovement>,
}

impl MovementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one movement. Internal to the engine's mutating operations.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn record(
        &mut self,
        id: MovementId,
        lot_id: LotId,
        kind: MovementType,
        quantity: i64,
        timestamp: DateTime<Utc>,
        reason: impl Into<String>,
        operator: &Operator,
    ) -> &StockMovement {
        debug_assert!(quantity > 0, "movements carry a positive magnitude");
        self.entries.push(StockMovement {
            id,
            stock_item_id: lot_id,
            kind,
            quantity,
            timestamp,
            reason: reason.into(),
            operator_id: operator.id.clone(),
            operator_name: operator.name.clone(),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// All movements in recording order (oldest first).
    pub fn entries(&self) -> &[StockMovement] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_lot(&self, lot_id: LotId) -> impl Iterator<Item = &StockMovement> {
        self.entries.iter().filter(move |m| m.stock_item_id == lot_id)
    }

    /// `Σentry − Σexit − Σexpiry` for one lot, or `None` if the lot never moved.
    pub fn balance(&self, lot_id: LotId) -> Option<i64> {
        let mut seen = false;
        let total: i64 = self
            .for_lot(lot_id)
            .inspect(|_| seen = true)
            .map(StockMovement::delta)
            .sum();
        seen.then_some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodbank_core::{IdGenerator, SequentialIdGenerator};

    fn operator() -> Operator {
        Operator::new(OperatorId::new("op1").unwrap(), "Op One")
    }

    #[test]
    fn balance_sums_signed_deltas_per_lot() {
        let ids = SequentialIdGenerator::new();
        let lot_a = LotId::from_uuid(ids.next_uuid());
        let lot_b = LotId::from_uuid(ids.next_uuid());
        let now = Utc::now();
        let op = operator();

        let mut log = MovementLog::new();
        log.record(MovementId::from_uuid(ids.next_uuid()), lot_a, MovementType::Entry, 10, now, "entry", &op);
        log.record(MovementId::from_uuid(ids.next_uuid()), lot_b, MovementType::Entry, 2, now, "entry", &op);
        log.record(MovementId::from_uuid(ids.next_uuid()), lot_a, MovementType::Exit, 4, now, "distribution", &op);
        log.record(MovementId::from_uuid(ids.next_uuid()), lot_a, MovementType::Expiry, 6, now, "expired", &op);

        assert_eq!(log.len(), 4);
        assert_eq!(log.balance(lot_a), Some(0));
        assert_eq!(log.balance(lot_b), Some(2));
        assert_eq!(log.for_lot(lot_a).count(), 3);
    }

    #[test]
    fn balance_of_unknown_lot_is_none() {
        let log = MovementLog::new();
        let ids = SequentialIdGenerator::new();
        assert_eq!(log.balance(LotId::from_uuid(ids.next_uuid())), None);
        assert!(log.is_empty());
    }

    #[test]
    fn movement_serializes_kind_as_type() {
        let ids = SequentialIdGenerator::new();
        let mut log = MovementLog::new();
        let m = log
            .record(
                MovementId::from_uuid(ids.next_uuid()),
                LotId::from_uuid(ids.next_uuid()),
                MovementType::Exit,
                3,
                Utc::now(),
                "distribution",
                &operator(),
            )
            .clone();

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["type"], "exit");
        assert_eq!(json["quantity"], 3);
        assert_eq!(json["operator_name"], "Op One");
    }
}
