//! Devis models and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Quote lifecycle status
///
/// A pending quote resolves to `accepte`, `refuse`, `annule` or `expire`.
/// An accepted quote then follows the shipment: `en_cours` once the
/// transporter starts moving, `termine` on signed delivery.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "devis_statut", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DevisStatut {
    EnAttente,
    Accepte,
    Refuse,
    Annule,
    Expire,
    EnCours,
    Termine,
}

impl DevisStatut {
    /// Whether this quote is the live accepted quote of its listing
    pub fn is_live_accepted(&self) -> bool {
        matches!(self, DevisStatut::Accepte | DevisStatut::EnCours)
    }
}

/// Devis model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Devis {
    pub id: Uuid,
    pub annonce_id: Uuid,
    pub transporteur_id: Uuid,
    /// Owner of the listing, denormalized at creation time
    pub client_id: Uuid,
    /// Amount in cents
    pub montant: i64,
    pub message: String,
    pub date_livraison_prevue: Option<DateTime<Utc>>,
    /// Reason given on refusal or cancellation
    pub motif: Option<String>,
    pub statut: DevisStatut,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for submitting a quote
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDevisRequest {
    pub annonce_id: Uuid,
    #[validate(range(min = 1, message = "montant must be positive"))]
    pub montant: i64,
    #[serde(default)]
    pub message: String,
    pub date_livraison_prevue: Option<DateTime<Utc>>,
}

/// Request DTO for refusing or cancelling a quote
#[derive(Debug, Deserialize, Default)]
pub struct DecideDevisRequest {
    pub motif: Option<String>,
}

/// Query parameters for listing quotes
#[derive(Debug, Deserialize, Default)]
pub struct ListDevisQuery {
    pub annonce_id: Option<Uuid>,
    pub transporteur_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub statut: Option<DevisStatut>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}
