//! `motorlot-events` — domain event plumbing.
//!
//! Events are immutable facts raised by the domain aggregates. During a
//! command they accumulate in an append-only [`Outbox`]; the unit of work
//! flushes them to an [`EventBus`] strictly after its transaction commits.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod outbox;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::EventHandler;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use outbox::{Outbox, OutboxError, OutboxRecord};
