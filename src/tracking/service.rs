//! Tracking service layer - shipment progress management
//!
//! The delivery branch is the three-document synchronization point of the
//! whole workflow: tracking `livre`, devis `termine` and annonce `termine`
//! are committed in one transaction, with status-conditional updates so a
//! replayed delivery appends history without re-running the terminal
//! effects.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::annonce::Annonce;
use crate::devis::Devis;
use crate::tracking::{Tracking, TrackingEvent, TrackingStatut, TrackingWithEvents};
use crate::workflow::{engine, Actor, DeliveryProof, WorkflowError, WorkflowResult};

/// Tracking service for managing shipment lifecycle
#[derive(Clone)]
pub struct TrackingService {
    db_pool: PgPool,
}

impl TrackingService {
    /// Create a new tracking service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Get the tracking record and history for a listing
    pub async fn get(&self, annonce_id: &Uuid) -> WorkflowResult<TrackingWithEvents> {
        let tracking =
            sqlx::query_as::<_, Tracking>("SELECT * FROM trackings WHERE annonce_id = $1")
                .bind(annonce_id)
                .fetch_optional(&self.db_pool)
                .await?
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!("no tracking for listing {}", annonce_id))
                })?;

        let evenements = self.load_events(&tracking.id).await?;

        Ok(TrackingWithEvents {
            tracking,
            evenements,
        })
    }

    /// Advance the shipment status for a listing.
    ///
    /// Creates the tracking record lazily on first call (initial status
    /// `en_attente`), appends a history event, and applies whatever
    /// cross-entity synchronization the engine decided.
    pub async fn advance(
        &self,
        actor: &Actor,
        annonce_id: &Uuid,
        nouveau: TrackingStatut,
        commentaire: Option<String>,
        localisation: Option<String>,
        preuve: Option<DeliveryProof>,
    ) -> WorkflowResult<TrackingWithEvents> {
        let annonce = self.load_annonce(annonce_id).await?;
        let devis = self.load_assigned_devis(&annonce).await?;

        let tracking =
            sqlx::query_as::<_, Tracking>("SELECT * FROM trackings WHERE annonce_id = $1")
                .bind(annonce_id)
                .fetch_optional(&self.db_pool)
                .await?;
        let history = match &tracking {
            Some(t) => self.load_events(&t.id).await?,
            None => Vec::new(),
        };

        let decision = engine::advance_tracking(
            actor,
            &devis,
            tracking.as_ref(),
            &history,
            nouveau,
            preuve.as_ref(),
        )?;

        let mut tx = self.db_pool.begin().await?;

        let tracking_id = match &tracking {
            Some(t) => t.id,
            None => self.create_record(&mut tx, &annonce, &devis).await?,
        };

        // Append-only history entry, then the current-status update
        sqlx::query(
            r#"
            INSERT INTO tracking_events (id, tracking_id, statut, commentaire, localisation, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tracking_id)
        .bind(decision.statut)
        .bind(&commentaire)
        .bind(&localisation)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE trackings SET
                statut = $1,
                signature = COALESCE($2, signature),
                signataire = COALESCE($3, signataire),
                updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(decision.statut)
        .bind(preuve.as_ref().map(|p| p.signature.clone()))
        .bind(preuve.as_ref().map(|p| p.signataire.clone()))
        .bind(Utc::now())
        .bind(tracking_id)
        .execute(&mut *tx)
        .await?;

        if decision.demarre_devis {
            sqlx::query(
                "UPDATE devis SET statut = 'en_cours', updated_at = $1 WHERE id = $2 AND statut = 'accepte'",
            )
            .bind(Utc::now())
            .bind(devis.id)
            .execute(&mut *tx)
            .await?;
        }

        if decision.terminal {
            // Conditional writes keep a replayed delivery from re-running
            // the terminal effects
            sqlx::query(
                "UPDATE devis SET statut = 'termine', updated_at = $1 WHERE id = $2 AND statut IN ('accepte', 'en_cours')",
            )
            .bind(Utc::now())
            .bind(devis.id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE annonces SET statut = 'termine', updated_at = $1 WHERE id = $2 AND statut = 'en_cours'",
            )
            .bind(Utc::now())
            .bind(annonce.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            annonce_id = %annonce_id,
            statut = ?decision.statut,
            terminal = decision.terminal,
            "Shipment status advanced"
        );

        self.get(annonce_id).await
    }

    // ===== Private helpers =====

    async fn create_record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        annonce: &Annonce,
        devis: &Devis,
    ) -> WorkflowResult<Uuid> {
        let id = Uuid::new_v4();

        let inserted = sqlx::query(
            r#"
            INSERT INTO trackings (
                id, annonce_id, devis_id, transporteur_id, statut, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(annonce.id)
        .bind(devis.id)
        .bind(devis.transporteur_id)
        .bind(TrackingStatut::EnAttente)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&mut **tx)
        .await;

        match inserted {
            Ok(_) => {
                tracing::info!(annonce_id = %annonce.id, "Tracking record created");
                Ok(id)
            }
            // A concurrent first advancement created the record between our
            // read and this insert; the caller's snapshot is stale
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(WorkflowError::StateConflict(format!(
                    "tracking for listing {} was just initialized, retry",
                    annonce.id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_events(&self, tracking_id: &Uuid) -> WorkflowResult<Vec<TrackingEvent>> {
        let events = sqlx::query_as::<_, TrackingEvent>(
            "SELECT * FROM tracking_events WHERE tracking_id = $1 ORDER BY created_at ASC",
        )
        .bind(tracking_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(events)
    }

    async fn load_annonce(&self, annonce_id: &Uuid) -> WorkflowResult<Annonce> {
        sqlx::query_as::<_, Annonce>("SELECT * FROM annonces WHERE id = $1")
            .bind(annonce_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("listing {} not found", annonce_id)))
    }

    /// The quote currently executing this transport: the accepted one,
    /// possibly already `en_cours` or `termine` (for re-reports)
    async fn load_assigned_devis(&self, annonce: &Annonce) -> WorkflowResult<Devis> {
        sqlx::query_as::<_, Devis>(
            r#"
            SELECT * FROM devis
            WHERE annonce_id = $1 AND statut IN ('accepte', 'en_cours', 'termine')
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(annonce.id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| {
            WorkflowError::StateConflict(format!(
                "listing {} has no accepted quote",
                annonce.id
            ))
        })
    }
}
