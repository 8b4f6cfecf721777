//! Domain-agnostic event mechanics.
//!
//! Stock mutations are announced as events so collaborators (notification
//! senders, dashboards) can react without calling back into the engine.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
