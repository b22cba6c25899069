//! Tracking models and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shipment status, strictly ordered up to `livre`
///
/// `probleme` sits outside the ordering: it can be reported from any
/// non-terminal state and does not move the progression forward.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "tracking_statut", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatut {
    EnAttente,
    PrisEnCharge,
    EnTransit,
    EnLivraison,
    Livre,
    Probleme,
}

impl TrackingStatut {
    /// Position along the ordered sequence; `None` for the exception branch
    pub fn rank(self) -> Option<u8> {
        match self {
            TrackingStatut::EnAttente => Some(0),
            TrackingStatut::PrisEnCharge => Some(1),
            TrackingStatut::EnTransit => Some(2),
            TrackingStatut::EnLivraison => Some(3),
            TrackingStatut::Livre => Some(4),
            TrackingStatut::Probleme => None,
        }
    }

    /// Whether the shipment is delivered
    pub fn is_terminal(self) -> bool {
        matches!(self, TrackingStatut::Livre)
    }
}

/// Tracking record, one per listing, created lazily on first status update
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Tracking {
    pub id: Uuid,
    pub annonce_id: Uuid,
    /// The accepted quote this shipment executes
    pub devis_id: Uuid,
    pub transporteur_id: Uuid,
    pub statut: TrackingStatut,
    /// Captured signature payload, set on delivery
    pub signature: Option<String>,
    pub signataire: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only history entry
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TrackingEvent {
    pub id: Uuid,
    pub tracking_id: Uuid,
    pub statut: TrackingStatut,
    pub commentaire: Option<String>,
    pub localisation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Tracking record with its full history
#[derive(Debug, Serialize)]
pub struct TrackingWithEvents {
    #[serde(flatten)]
    pub tracking: Tracking,
    pub evenements: Vec<TrackingEvent>,
}

/// Request DTO for advancing the shipment status
#[derive(Debug, Deserialize)]
pub struct AdvanceTrackingRequest {
    pub statut: TrackingStatut,
    pub commentaire: Option<String>,
    pub localisation: Option<String>,
}

/// Request DTO for marking the shipment delivered
#[derive(Debug, Deserialize)]
pub struct DeliverRequest {
    /// Base64-encoded signature capture
    pub signature: String,
    /// Name of the person who signed
    pub signataire: String,
    pub commentaire: Option<String>,
    pub localisation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statut_ordering() {
        assert!(TrackingStatut::EnAttente.rank() < TrackingStatut::PrisEnCharge.rank());
        assert!(TrackingStatut::PrisEnCharge.rank() < TrackingStatut::EnTransit.rank());
        assert!(TrackingStatut::EnTransit.rank() < TrackingStatut::EnLivraison.rank());
        assert!(TrackingStatut::EnLivraison.rank() < TrackingStatut::Livre.rank());
        assert_eq!(TrackingStatut::Probleme.rank(), None);
    }

    #[test]
    fn test_terminal_statut() {
        assert!(TrackingStatut::Livre.is_terminal());
        assert!(!TrackingStatut::EnLivraison.is_terminal());
        assert!(!TrackingStatut::Probleme.is_terminal());
    }

    #[test]
    fn test_statut_serialization() {
        let json = serde_json::to_string(&TrackingStatut::PrisEnCharge).unwrap();
        assert_eq!(json, "\"pris_en_charge\"");
        let back: TrackingStatut = serde_json::from_str("\"en_livraison\"").unwrap();
        assert_eq!(back, TrackingStatut::EnLivraison);
    }
}
