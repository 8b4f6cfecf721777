//! Notifications published after committed stock mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodbank_core::{AssociationId, LotId, OperatorId, ProductId};
use foodbank_events::Event;

use crate::allocation::ConsumedLot;
use crate::expiration::ExpiredLot;

/// Event: LotAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotAdded {
    pub lot_id: LotId,
    pub product_id: ProductId,
    pub product_name: String,
    pub association_id: AssociationId,
    pub quantity: i64,
    pub donation_id: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAllocated.
///
/// Published for full and partial allocations alike; compare `allocated` with
/// `requested` to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAllocated {
    pub product_id: ProductId,
    pub association_id: AssociationId,
    pub requested: i64,
    pub allocated: i64,
    pub consumed_lots: Vec<ConsumedLot>,
    pub operator_id: OperatorId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LotsExpired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotsExpired {
    pub lots: Vec<ExpiredLot>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    LotAdded(LotAdded),
    StockAllocated(StockAllocated),
    LotsExpired(LotsExpired),
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::LotAdded(_) => "stock.lot.added",
            StockEvent::StockAllocated(_) => "stock.allocated",
            StockEvent::LotsExpired(_) => "stock.lots.expired",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::LotAdded(e) => e.occurred_at,
            StockEvent::StockAllocated(e) => e.occurred_at,
            StockEvent::LotsExpired(e) => e.occurred_at,
        }
    }
}
