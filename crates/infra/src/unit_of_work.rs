//! Unit of work: the transaction boundary.
//!
//! Commands stage every write into one [`WriteBatch`] and record every domain
//! event into one [`Outbox`]; `commit` applies the batch atomically and only
//! then flushes the outbox to the event bus. Dropping the unit of work (or
//! calling `rollback`) discards both - a failed command publishes nothing and
//! writes nothing.

use serde::Serialize;
use serde_json::Value as JsonValue;

use motorlot_core::AggregateId;
use motorlot_events::{Event, EventBus, EventEnvelope, Outbox};

use crate::handlers::CommandError;
use crate::store::{DealershipStore, WriteBatch, WriteOp};

/// Transaction scope over a store and an event bus.
pub struct UnitOfWork<'a, S, B> {
    store: &'a S,
    bus: &'a B,
    batch: WriteBatch,
    outbox: Outbox,
}

impl<'a, S, B> UnitOfWork<'a, S, B>
where
    S: DealershipStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: &'a S, bus: &'a B) -> Self {
        Self {
            store,
            bus,
            batch: WriteBatch::new(),
            outbox: Outbox::new(),
        }
    }

    /// Stage a write; nothing is visible until `commit`.
    pub fn stage(&mut self, op: WriteOp) {
        self.batch.push(op);
    }

    /// Record a domain event for post-commit publication.
    pub fn record<E>(
        &mut self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        event: &E,
    ) -> Result<(), CommandError>
    where
        E: Event + Serialize,
    {
        self.outbox.append(aggregate_id, aggregate_type, event)?;
        Ok(())
    }

    /// Apply all staged writes atomically, then flush the outbox.
    ///
    /// If the batch fails (concurrency conflict, duplicate id) nothing is
    /// written and nothing is published. If publication fails after a
    /// successful apply, the writes stand and the error surfaces as
    /// [`CommandError::Publish`] (at-least-once; retrying publication is safe).
    pub fn commit(self) -> Result<(), CommandError> {
        let staged = self.batch.len();
        self.store.apply(self.batch)?;

        let envelopes = self.outbox.drain_into_envelopes();
        let published = envelopes.len();
        for envelope in envelopes {
            self.bus
                .publish(envelope)
                .map_err(|e| CommandError::Publish(format!("{e:?}")))?;
        }

        tracing::debug!(staged, published, "transaction committed");
        Ok(())
    }

    /// Discard all staged writes and recorded events.
    pub fn rollback(self) {
        tracing::debug!(
            staged = self.batch.len(),
            discarded_events = self.outbox.len(),
            "transaction rolled back"
        );
    }
}
