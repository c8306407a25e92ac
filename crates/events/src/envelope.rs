use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::{AggregateId, Scope, TenantId};

/// Envelope for a published event, carrying scope + stream metadata.
///
/// This is the unit consumers receive from the bus.
///
/// Notes:
/// - **Isolation** is enforced here via `scope` (tenant + branch).
/// - `sequence_number` is monotonically increasing per aggregate; consumers
///   use it to skip duplicate deliveries.
/// - `payload` is the domain-agnostic event payload (typically JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    scope: Scope,

    aggregate_id: AggregateId,
    aggregate_type: String,

    /// Monotonically increasing position in the aggregate's event sequence.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        scope: Scope,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            scope,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn tenant_id(&self) -> TenantId {
        self.scope.tenant_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
