//! Ingestion router: one decoded [`Snapshot`] in, one store write out.

use serde::Serialize;
use tornkeep_types::{EntityKind, ObservationKind, RecordId, Routed, Snapshot};

use crate::error::WriteError;
use crate::sqlite::Store;

/// What a snapshot turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// A current-state row was inserted or overwritten.
    Upserted {
        /// Entity kind.
        kind: EntityKind,
        /// External ID.
        id: i64,
    },
    /// A history row was appended.
    Appended {
        /// Observation kind.
        kind: ObservationKind,
        /// New row ID.
        record_id: RecordId,
    },
}

/// Routes snapshots to the State Store or the History Recorder.
pub struct Ingestor<'a> {
    store: &'a Store,
}

impl<'a> Ingestor<'a> {
    /// Create an ingestor over an open store.
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Write one decoded snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] from the upsert or append it routes to.
    pub async fn ingest(&self, snapshot: Snapshot) -> Result<IngestOutcome, WriteError> {
        match snapshot.route() {
            Routed::Entity(entity) => {
                self.store.state().upsert(&entity).await?;
                Ok(IngestOutcome::Upserted {
                    kind: entity.kind(),
                    id: entity.id(),
                })
            }
            Routed::Observation(observation) => {
                let record_id = self.store.history().append(&observation).await?;
                Ok(IngestOutcome::Appended {
                    kind: observation.kind(),
                    record_id,
                })
            }
        }
    }

    /// Decode, validate and write one raw `{"kind", "data"}` payload.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Validation`] with
    /// [`tornkeep_types::ValidationError::Malformed`] for unknown kinds or fields, and any
    /// error [`Ingestor::ingest`] returns.
    pub async fn ingest_json(&self, value: serde_json::Value) -> Result<IngestOutcome, WriteError> {
        let snapshot = Snapshot::from_json(value).map_err(WriteError::Validation)?;
        self.ingest(snapshot).await
    }
}
