//! Event handler registration interface.

use serde_json::Value as JsonValue;

use crate::envelope::EventEnvelope;

/// A consumer of committed domain events (email notification, audit log, ...).
///
/// Handlers run **outside** the transaction boundary: by the time an envelope
/// reaches a handler, the owning command has committed. Delivery is
/// at-least-once, so handlers must tolerate duplicates.
///
/// Handler failures are the handler's problem - they never unwind the
/// committed command. The error type is deliberately opaque (`anyhow`) because
/// external collaborators fail in heterogeneous ways.
pub trait EventHandler: Send + Sync {
    /// Stable handler name, used for logging.
    fn name(&self) -> &'static str;

    fn handle(&self, envelope: &EventEnvelope<JsonValue>) -> anyhow::Result<()>;
}
