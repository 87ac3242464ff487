//! Append-only outbox for domain events raised during a command.
//!
//! Aggregates raise events; the command handler appends them here in the
//! order they happened. The unit of work drains the outbox into envelopes
//! **only after** its transaction has committed - a failed or rolled-back
//! command publishes nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use motorlot_core::AggregateId;

use crate::envelope::EventEnvelope;
use crate::event::Event;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("event payload serialization failed: {0}")]
    Serialize(String),
}

/// One recorded event, not yet flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    pub event_id: Uuid,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,
    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,
    pub payload: JsonValue,
}

/// Append-only buffer of events awaiting the owning transaction's commit.
#[derive(Debug, Default)]
pub struct Outbox {
    records: Vec<OutboxRecord>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Append a typed domain event, capturing its metadata for dispatch.
    pub fn append<E>(
        &mut self,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event: &E,
    ) -> Result<(), OutboxError>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| OutboxError::Serialize(e.to_string()))?;

        self.records.push(OutboxRecord {
            event_id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        });

        Ok(())
    }

    /// Drain into envelopes, assigning flush-order sequence numbers (1-based).
    pub fn drain_into_envelopes(self) -> Vec<EventEnvelope<JsonValue>> {
        self.records
            .into_iter()
            .enumerate()
            .map(|(idx, r)| {
                EventEnvelope::new(
                    r.event_id,
                    r.aggregate_id,
                    r.aggregate_type,
                    (idx as u64) + 1,
                    r.event_type,
                    r.occurred_at,
                    r.payload,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Pinged {
        label: String,
        occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    enum TestEvent {
        Pinged(Pinged),
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            "test.pinged"
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            match self {
                TestEvent::Pinged(e) => e.occurred_at,
            }
        }
    }

    fn ping(label: &str) -> TestEvent {
        TestEvent::Pinged(Pinged {
            label: label.to_string(),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn drain_preserves_append_order_and_numbers_sequences() {
        let aggregate_id = AggregateId::new();
        let mut outbox = Outbox::new();
        outbox.append(aggregate_id, "test", &ping("first")).unwrap();
        outbox.append(aggregate_id, "test", &ping("second")).unwrap();
        outbox.append(aggregate_id, "test", &ping("third")).unwrap();

        let envelopes = outbox.drain_into_envelopes();
        assert_eq!(envelopes.len(), 3);
        let sequences: Vec<u64> = envelopes.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(envelopes[0].payload()["Pinged"]["label"], "first");
        assert_eq!(envelopes[2].payload()["Pinged"]["label"], "third");
    }

    #[test]
    fn append_captures_event_metadata() {
        let aggregate_id = AggregateId::new();
        let mut outbox = Outbox::new();
        outbox.append(aggregate_id, "test", &ping("x")).unwrap();

        let envelope = &outbox.drain_into_envelopes()[0];
        assert_eq!(envelope.event_type(), "test.pinged");
        assert_eq!(envelope.aggregate_type(), "test");
        assert_eq!(envelope.aggregate_id(), aggregate_id);
    }
}
