//! FIFO stock engine for a food-donation network.
//!
//! Tracks donated inventory lots per association, withdraws them strictly
//! oldest-first, keeps an append-only movement history, and flags expiring or
//! critically-low stock. All state is in memory and owned by a [`StockEngine`]
//! instance; persistence and presentation belong to callers.

pub mod allocation;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod expiration;
pub mod ledger;
pub mod lot;
pub mod movement;
pub mod queries;
pub mod sweeper;

mod integration_tests;

pub use allocation::{AllocationResult, ConsumedLot};
pub use config::StockConfig;
pub use engine::{AddStock, RemoveFromStock, StockEngine, StockEventSink};
pub use error::{StockError, StockResult};
pub use event::{LotAdded, LotsExpired, StockAllocated, StockEvent};
pub use expiration::ExpiredLot;
pub use ledger::{PartitionKey, StockLedger};
pub use lot::{LotStatus, StockLot};
pub use movement::{MovementLog, MovementType, Operator, StockMovement};
pub use queries::CriticalStockProduct;
pub use sweeper::{ExpirationSweeper, ExpirationSweeperHandle};
