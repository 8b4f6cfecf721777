use chrono::{DateTime, Utc};
use serde::Deserialize;

use foodbank_core::{AssociationId, DomainError, OperatorId, ProductId};
use foodbank_stock::{AddStock, Operator, RemoveFromStock};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub association_id: String,
    pub location: String,
    pub donation_id: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveStockRequest {
    pub product_id: String,
    pub quantity_needed: i64,
    pub association_id: String,
    pub operator_id: String,
    pub operator_name: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub product_id: String,
    pub association_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub association_id: String,
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CriticalQuery {
    pub association_id: String,
    pub threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub association_id: Option<String>,
    pub product_id: Option<String>,
}

// -------------------------
// Mapping into engine commands
// -------------------------

impl AddStockRequest {
    pub fn into_command(self) -> Result<AddStock, DomainError> {
        let operator = match self.operator_id {
            Some(id) => {
                let name = self.operator_name.unwrap_or_else(|| id.clone());
                Some(Operator::new(OperatorId::new(id)?, name))
            }
            None => None,
        };

        Ok(AddStock {
            product_id: ProductId::new(self.product_id)?,
            product_name: self.product_name,
            quantity: self.quantity,
            association_id: AssociationId::new(self.association_id)?,
            location: self.location,
            donation_id: self.donation_id.filter(|d| !d.trim().is_empty()),
            expiration_date: self.expiration_date,
            operator,
        })
    }
}

impl RemoveStockRequest {
    pub fn into_command(self) -> Result<RemoveFromStock, DomainError> {
        Ok(RemoveFromStock {
            product_id: ProductId::new(self.product_id)?,
            quantity_needed: self.quantity_needed,
            association_id: AssociationId::new(self.association_id)?,
            operator: Operator::new(OperatorId::new(self.operator_id)?, self.operator_name),
            reason: self.reason,
        })
    }
}

pub fn optional_association(raw: Option<String>) -> Result<Option<AssociationId>, DomainError> {
    raw.map(AssociationId::new).transpose()
}

pub fn optional_product(raw: Option<String>) -> Result<Option<ProductId>, DomainError> {
    raw.map(ProductId::new).transpose()
}
