//! Annonce models and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Nature of the goods to transport
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "type_transport", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TypeTransport {
    Colis,
    Meuble,
    Marchandise,
    Palette,
    Demenagement,
    Vehicule,
    Autre,
}

/// Listing lifecycle status
///
/// `disponible` means open for quotes; `en_cours` means a quote has been
/// accepted and the transport is underway. Both terminal states
/// (`termine`, `annule`) are soft-terminal: the document stays readable.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "annonce_statut", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnnonceStatut {
    Disponible,
    EnCours,
    Termine,
    Annule,
}

/// Annonce model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Annonce {
    pub id: Uuid,
    pub client_id: Uuid,
    pub titre: String,
    pub description: String,
    pub type_transport: TypeTransport,
    pub ville_depart: String,
    pub adresse_depart: String,
    pub ville_arrivee: String,
    pub adresse_arrivee: String,
    pub date_depart: DateTime<Utc>,
    pub poids: Option<f64>,
    pub volume: Option<f64>,
    pub dimensions: Option<String>,
    pub valeur_declaree: Option<i64>,
    pub urgent: bool,
    /// Stored file paths produced by the external upload service
    pub photos: Vec<String>,
    pub statut: AnnonceStatut,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a listing
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnnonceRequest {
    #[validate(length(min = 1, message = "titre is required"))]
    pub titre: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub type_transport: TypeTransport,
    #[validate(length(min = 1, message = "ville_depart is required"))]
    pub ville_depart: String,
    #[validate(length(min = 1, message = "adresse_depart is required"))]
    pub adresse_depart: String,
    #[validate(length(min = 1, message = "ville_arrivee is required"))]
    pub ville_arrivee: String,
    #[validate(length(min = 1, message = "adresse_arrivee is required"))]
    pub adresse_arrivee: String,
    pub date_depart: DateTime<Utc>,
    #[validate(range(min = 0.0))]
    pub poids: Option<f64>,
    #[validate(range(min = 0.0))]
    pub volume: Option<f64>,
    pub dimensions: Option<String>,
    #[validate(range(min = 0))]
    pub valeur_declaree: Option<i64>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Request DTO for editing a listing (all fields optional)
#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateAnnonceRequest {
    #[validate(length(min = 1, message = "titre cannot be empty"))]
    pub titre: Option<String>,
    #[validate(length(min = 1, message = "description cannot be empty"))]
    pub description: Option<String>,
    pub type_transport: Option<TypeTransport>,
    pub ville_depart: Option<String>,
    pub adresse_depart: Option<String>,
    pub ville_arrivee: Option<String>,
    pub adresse_arrivee: Option<String>,
    pub date_depart: Option<DateTime<Utc>>,
    pub poids: Option<f64>,
    pub volume: Option<f64>,
    pub dimensions: Option<String>,
    pub valeur_declaree: Option<i64>,
    pub urgent: Option<bool>,
    pub photos: Option<Vec<String>>,
}

/// Query parameters for listing annonces
#[derive(Debug, Deserialize, Default)]
pub struct ListAnnoncesQuery {
    pub statut: Option<AnnonceStatut>,
    pub client_id: Option<Uuid>,
    pub type_transport: Option<TypeTransport>,
    pub ville_depart: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}
