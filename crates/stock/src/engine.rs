//! Thread-safe stock engine.
//!
//! One `RwLock` guards the ledger and the movement log together:
//! - writers hold it for a whole multi-lot mutation plus its movement records
//! - readers never observe a half-applied allocation
//!
//! Notifications are published after the lock is released.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use foodbank_core::{
    AssociationId, Clock, IdGenerator, LotId, MovementId, ProductId, SystemClock, UuidV7Generator,
};
use foodbank_events::EventBus;

use crate::allocation::{self, AllocationResult};
use crate::config::StockConfig;
use crate::error::{StockError, StockResult};
use crate::event::{LotAdded, LotsExpired, StockAllocated, StockEvent};
use crate::expiration;
use crate::ledger::{PartitionKey, StockLedger};
use crate::lot::StockLot;
use crate::movement::{MovementLog, MovementType, Operator, StockMovement};
use crate::queries::{self, CriticalStockProduct};

/// Command: AddStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddStock {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub association_id: AssociationId,
    pub location: String,
    pub donation_id: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    /// Defaults to the configured system actor.
    pub operator: Option<Operator>,
}

/// Command: RemoveFromStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveFromStock {
    pub product_id: ProductId,
    pub quantity_needed: i64,
    pub association_id: AssociationId,
    pub operator: Operator,
    pub reason: String,
}

/// Receiver of committed stock notifications.
pub trait StockEventSink: Send + Sync {
    fn publish(&self, event: StockEvent);
}

impl<B> StockEventSink for B
where
    B: EventBus<StockEvent>,
{
    fn publish(&self, event: StockEvent) {
        if let Err(e) = <B as EventBus<StockEvent>>::publish(self, event) {
            warn!(error = ?e, "failed to publish stock event");
        }
    }
}

#[derive(Debug, Default)]
struct StockState {
    ledger: StockLedger,
    movements: MovementLog,
}

/// In-memory FIFO stock engine. Share it between callers with `Arc`.
pub struct StockEngine {
    state: RwLock<StockState>,
    config: StockConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    sink: Option<Arc<dyn StockEventSink>>,
}

impl core::fmt::Debug for StockEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockEngine")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("ids", &self.ids)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for StockEngine {
    fn default() -> Self {
        Self::new(StockConfig::default())
    }
}

impl StockEngine {
    pub fn new(config: StockConfig) -> Self {
        Self {
            state: RwLock::new(StockState::default()),
            config,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidV7Generator),
            sink: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn StockEventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &StockConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Create a new available lot and record its entry movement.
    pub fn add_stock(&self, cmd: AddStock) -> StockResult<StockLot> {
        if cmd.quantity <= 0 {
            return Err(StockError::InvalidQuantity {
                quantity: cmd.quantity,
            });
        }
        let operator = match cmd.operator {
            Some(op) => op,
            None => self.config.system_operator()?,
        };
        let reason = match &cmd.donation_id {
            Some(donation) => format!("donation entry ({donation})"),
            None => "donation entry".to_string(),
        };

        let key = PartitionKey::new(&cmd.product_id, &cmd.association_id);

        let lot = {
            let mut state = self.write()?;
            // Partition totals must stay representable.
            let held = state
                .ledger
                .partition(&key)
                .iter()
                .try_fold(0i64, |acc, l| acc.checked_add(l.quantity()));
            if held.and_then(|h| h.checked_add(cmd.quantity)).is_none() {
                return Err(StockError::InvalidQuantity {
                    quantity: cmd.quantity,
                });
            }
            let now = self.clock.now();
            let lot = StockLot::new(
                LotId::from_uuid(self.ids.next_uuid()),
                cmd.product_id,
                cmd.product_name,
                cmd.quantity,
                cmd.association_id,
                cmd.location,
                cmd.donation_id,
                cmd.expiration_date,
                now,
            );
            state.movements.record(
                self.next_movement_id(),
                lot.id(),
                MovementType::Entry,
                lot.quantity(),
                now,
                reason,
                &operator,
            );
            state.ledger.insert(lot.clone());
            lot
        };

        info!(
            lot_id = %lot.id(),
            product_id = %lot.product_id(),
            association_id = %lot.association_id(),
            quantity = lot.quantity(),
            operator_id = %operator.id,
            "stock lot added"
        );

        self.publish(StockEvent::LotAdded(LotAdded {
            lot_id: lot.id(),
            product_id: lot.product_id().clone(),
            product_name: lot.product_name().to_string(),
            association_id: lot.association_id().clone(),
            quantity: lot.quantity(),
            donation_id: lot.donation_id().map(str::to_string),
            expiration_date: lot.expiration_date(),
            occurred_at: lot.entry_date(),
        }));

        Ok(lot)
    }

    /// Withdraw quantity oldest-lot-first.
    ///
    /// A shortage is not an error: everything available is taken and the
    /// result reports `success == false`. Nothing is rolled back.
    pub fn remove_from_stock(&self, cmd: RemoveFromStock) -> StockResult<AllocationResult> {
        if cmd.quantity_needed <= 0 {
            return Err(StockError::InvalidQuantity {
                quantity: cmd.quantity_needed,
            });
        }
        let key = PartitionKey::new(&cmd.product_id, &cmd.association_id);

        let (result, now) = {
            let mut guard = self.write()?;
            let StockState { ledger, movements } = &mut *guard;
            let now = self.clock.now();

            let consumed = match ledger.partition_mut(&key) {
                Some(lots) => allocation::withdraw_fifo(lots, cmd.quantity_needed),
                None => Vec::new(),
            };
            for fragment in &consumed {
                movements.record(
                    self.next_movement_id(),
                    fragment.lot_id,
                    MovementType::Exit,
                    fragment.quantity_taken,
                    now,
                    cmd.reason.as_str(),
                    &cmd.operator,
                );
                debug!(
                    lot_id = %fragment.lot_id,
                    quantity = fragment.quantity_taken,
                    "lot consumed"
                );
            }
            (AllocationResult::new(cmd.quantity_needed, consumed), now)
        };

        if result.success {
            info!(
                product_id = %cmd.product_id,
                association_id = %cmd.association_id,
                quantity = result.total_quantity,
                lots = result.consumed_lots.len(),
                operator_id = %cmd.operator.id,
                "stock allocated"
            );
        } else {
            warn!(
                product_id = %cmd.product_id,
                association_id = %cmd.association_id,
                requested = result.requested_quantity,
                allocated = result.total_quantity,
                operator_id = %cmd.operator.id,
                "partial allocation: insufficient stock"
            );
        }

        if result.total_quantity > 0 {
            self.publish(StockEvent::StockAllocated(StockAllocated {
                product_id: cmd.product_id,
                association_id: cmd.association_id,
                requested: result.requested_quantity,
                allocated: result.total_quantity,
                consumed_lots: result.consumed_lots.clone(),
                operator_id: cmd.operator.id,
                reason: cmd.reason,
                occurred_at: now,
            }));
        }

        Ok(result)
    }

    /// Expire every available lot dated on or before `now`.
    ///
    /// Returns the number of lots transitioned. Idempotent for a given `now`.
    pub fn mark_expired_products(&self, now: DateTime<Utc>) -> StockResult<usize> {
        let operator = self.config.system_operator()?;

        let expired = {
            let mut guard = self.write()?;
            let StockState { ledger, movements } = &mut *guard;

            let expired = expiration::expire_due(ledger, now);
            for lot in expired.iter().filter(|l| l.quantity > 0) {
                movements.record(
                    self.next_movement_id(),
                    lot.lot_id,
                    MovementType::Expiry,
                    lot.quantity,
                    now,
                    "expired",
                    &operator,
                );
            }
            expired
        };

        if expired.is_empty() {
            debug!(%now, "expiration sweep found nothing");
            return Ok(0);
        }

        let count = expired.len();
        info!(
            %now,
            lots = count,
            quantity = expired.iter().map(|l| l.quantity).fold(0, i64::saturating_add),
            "stock lots expired"
        );
        self.publish(StockEvent::LotsExpired(LotsExpired {
            lots: expired,
            occurred_at: now,
        }));

        Ok(count)
    }

    /// Available quantity for one product in one association.
    pub fn check_availability(
        &self,
        product_id: &ProductId,
        association_id: &AssociationId,
    ) -> StockResult<i64> {
        let state = self.read()?;
        Ok(queries::available_quantity(&state.ledger, product_id, association_id))
    }

    /// Available lots expiring within `days_threshold` days (config default when `None`).
    pub fn get_expiring_products(
        &self,
        association_id: &AssociationId,
        days_threshold: Option<i64>,
    ) -> StockResult<Vec<StockLot>> {
        let days = days_threshold.unwrap_or(self.config.expiring_days_threshold);
        let state = self.read()?;
        Ok(queries::expiring_lots(&state.ledger, association_id, days, self.clock.now()))
    }

    /// Known products below `threshold` (config default when `None`).
    pub fn get_critical_stock_products(
        &self,
        association_id: &AssociationId,
        threshold: Option<i64>,
    ) -> StockResult<Vec<CriticalStockProduct>> {
        let threshold = threshold.unwrap_or(self.config.critical_stock_threshold);
        let state = self.read()?;
        Ok(queries::critical_products(&state.ledger, association_id, threshold))
    }

    /// Movement history, newest first.
    pub fn get_movements(
        &self,
        association_id: Option<&AssociationId>,
        product_id: Option<&ProductId>,
    ) -> StockResult<Vec<StockMovement>> {
        let state = self.read()?;
        Ok(queries::movements(&state.ledger, &state.movements, association_id, product_id))
    }

    pub fn get_lot(&self, lot_id: LotId) -> StockResult<Option<StockLot>> {
        let state = self.read()?;
        Ok(state.ledger.get(lot_id).cloned())
    }

    /// Lots of an association in every status, FIFO order within each product.
    pub fn get_lots(
        &self,
        association_id: &AssociationId,
        product_id: Option<&ProductId>,
    ) -> StockResult<Vec<StockLot>> {
        let state = self.read()?;
        let lots = match product_id {
            Some(p) => state
                .ledger
                .partition(&PartitionKey::new(p, association_id))
                .to_vec(),
            None => state
                .ledger
                .association_partitions(association_id)
                .flat_map(|(_, lots)| lots.iter().cloned())
                .collect(),
        };
        Ok(lots)
    }

    /// Sellable balance of a lot derived from its movements.
    pub fn lot_balance(&self, lot_id: LotId) -> StockResult<Option<i64>> {
        let state = self.read()?;
        Ok(state.movements.balance(lot_id))
    }

    fn next_movement_id(&self) -> MovementId {
        MovementId::from_uuid(self.ids.next_uuid())
    }

    fn read(&self) -> StockResult<RwLockReadGuard<'_, StockState>> {
        self.state.read().map_err(|_| StockError::Poisoned)
    }

    fn write(&self) -> StockResult<RwLockWriteGuard<'_, StockState>> {
        self.state.write().map_err(|_| StockError::Poisoned)
    }

    fn publish(&self, event: StockEvent) {
        if let Some(sink) = &self.sink {
            sink.publish(event);
        }
    }
}
