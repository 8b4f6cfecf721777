//! Lot storage, partitioned per `(association, product)`.
//!
//! Each partition keeps its lots in FIFO order (ascending `entry_date`, ties in
//! insertion order), maintained on insert so allocation never has to sort.

use std::collections::{BTreeMap, HashMap};

use foodbank_core::{AssociationId, LotId, ProductId};

use crate::lot::StockLot;

/// Inventory partition: all FIFO accounting is scoped to one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub association_id: AssociationId,
    pub product_id: ProductId,
}

impl PartitionKey {
    pub fn new(product_id: &ProductId, association_id: &AssociationId) -> Self {
        Self {
            association_id: association_id.clone(),
            product_id: product_id.clone(),
        }
    }

    fn of(lot: &StockLot) -> Self {
        Self::new(lot.product_id(), lot.association_id())
    }
}

/// Owned collection of every lot the engine has ever seen.
#[derive(Debug, Default, Clone)]
pub struct StockLedger {
    partitions: BTreeMap<PartitionKey, Vec<StockLot>>,
    index: HashMap<LotId, PartitionKey>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new lot at its FIFO position within its partition.
    pub(crate) fn insert(&mut self, lot: StockLot) {
        let key = PartitionKey::of(&lot);
        self.index.insert(lot.id(), key.clone());

        let lots = self.partitions.entry(key).or_default();
        let pos = lots.partition_point(|l| l.entry_date() <= lot.entry_date());
        lots.insert(pos, lot);
    }

    pub fn get(&self, lot_id: LotId) -> Option<&StockLot> {
        let key = self.index.get(&lot_id)?;
        self.partitions
            .get(key)?
            .iter()
            .find(|l| l.id() == lot_id)
    }

    /// Lots of one partition, oldest first.
    pub fn partition(&self, key: &PartitionKey) -> &[StockLot] {
        self.partitions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn partition_mut(&mut self, key: &PartitionKey) -> Option<&mut [StockLot]> {
        self.partitions.get_mut(key).map(Vec::as_mut_slice)
    }

    /// Every partition of an association, ordered by product id.
    pub fn association_partitions<'a>(
        &'a self,
        association_id: &'a AssociationId,
    ) -> impl Iterator<Item = (&'a PartitionKey, &'a [StockLot])> + 'a {
        self.partitions
            .iter()
            .filter(move |(k, _)| &k.association_id == association_id)
            .map(|(k, lots)| (k, lots.as_slice()))
    }

    /// All lots, partition by partition.
    pub fn iter(&self) -> impl Iterator<Item = &StockLot> {
        self.partitions.values().flatten()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut StockLot> {
        self.partitions.values_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
