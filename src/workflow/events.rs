//! Workflow domain events
//!
//! Operations emit events through a dependency-injected dispatcher; the
//! notification fan-out consuming them lives outside this backend.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::tracking::TrackingStatut;

/// Domain events emitted by workflow operations
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    AnnonceCreated {
        annonce_id: Uuid,
        client_id: Uuid,
    },
    AnnonceCancelled {
        annonce_id: Uuid,
        client_id: Uuid,
    },
    DevisSubmitted {
        devis_id: Uuid,
        annonce_id: Uuid,
        transporteur_id: Uuid,
        client_id: Uuid,
    },
    /// Notifies both parties of the acceptance
    DevisAccepted {
        devis_id: Uuid,
        annonce_id: Uuid,
        transporteur_id: Uuid,
        client_id: Uuid,
    },
    DevisRefused {
        devis_id: Uuid,
        annonce_id: Uuid,
        transporteur_id: Uuid,
    },
    DevisCancelled {
        devis_id: Uuid,
        annonce_id: Uuid,
        client_id: Uuid,
    },
    DevisExpired {
        devis_id: Uuid,
    },
    TrackingAdvanced {
        annonce_id: Uuid,
        statut: TrackingStatut,
    },
    Delivered {
        annonce_id: Uuid,
        devis_id: Uuid,
        signataire: String,
    },
}

/// Broadcast dispatcher for workflow events
///
/// Constructed once per process and injected through application state.
/// Having no subscriber is not an error: the dispatcher is a seam, not a
/// delivery guarantee.
#[derive(Clone)]
pub struct EventDispatcher {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { tx }
    }

    /// Emit an event to all current subscribers
    pub fn emit(&self, event: WorkflowEvent) {
        match self.tx.send(event) {
            Ok(n) => tracing::debug!(subscribers = n, "Workflow event dispatched"),
            Err(_) => tracing::debug!("Workflow event dropped: no subscribers"),
        }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
