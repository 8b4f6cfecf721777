//! `foodbank-core`: domain foundation building blocks.
//!
//! Pure primitives shared by the stock engine and its collaborators:
//! identifiers, the domain error model, and the injected clock / id seams.
//! No IO lives here.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{
    AssociationId, IdGenerator, LotId, MovementId, OperatorId, ProductId, SequentialIdGenerator,
    UuidV7Generator,
};
