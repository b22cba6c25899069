//! Devis service layer - quote lifecycle management
//!
//! Acceptance is the racy transition: two clients (or one client twice)
//! must never both lock the same listing. The engine validates the loaded
//! snapshot; the write then re-checks the status inline (compare-and-swap)
//! inside a transaction, so the second acceptance loses cleanly with a
//! state conflict instead of corrupting either document.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::annonce::{Annonce, AnnonceStatut};
use crate::devis::{CreateDevisRequest, Devis, DevisStatut, ListDevisQuery};
use crate::models::pagination;
use crate::workflow::{engine, Actor, EventDispatcher, WorkflowError, WorkflowEvent, WorkflowResult};

/// Devis service for managing quote lifecycle
#[derive(Clone)]
pub struct DevisService {
    db_pool: PgPool,
}

impl DevisService {
    /// Create a new devis service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Submit a quote against an open listing
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateDevisRequest,
    ) -> WorkflowResult<Devis> {
        let annonce = self.load_annonce(&request.annonce_id).await?;
        engine::submit_devis(actor, &annonce)?;

        let devis = sqlx::query_as::<_, Devis>(
            r#"
            INSERT INTO devis (
                id, annonce_id, transporteur_id, client_id, montant,
                message, date_livraison_prevue, statut, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.annonce_id)
        .bind(actor.user_id)
        .bind(annonce.client_id)
        .bind(request.montant)
        .bind(&request.message)
        .bind(request.date_livraison_prevue)
        .bind(DevisStatut::EnAttente)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            devis_id = %devis.id,
            annonce_id = %devis.annonce_id,
            montant = devis.montant,
            "Quote submitted"
        );

        Ok(devis)
    }

    /// Get a single quote by ID
    pub async fn get(&self, id: &Uuid) -> WorkflowResult<Devis> {
        sqlx::query_as::<_, Devis>("SELECT * FROM devis WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("quote {} not found", id)))
    }

    /// List quotes with filtering and pagination
    pub async fn list(&self, query: ListDevisQuery) -> WorkflowResult<Vec<Devis>> {
        let (limit, offset) = pagination(query.page, query.limit);

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM devis WHERE 1=1");

        if let Some(annonce_id) = query.annonce_id {
            query_builder.push(" AND annonce_id = ");
            query_builder.push_bind(annonce_id);
        }
        if let Some(transporteur_id) = query.transporteur_id {
            query_builder.push(" AND transporteur_id = ");
            query_builder.push_bind(transporteur_id);
        }
        if let Some(client_id) = query.client_id {
            query_builder.push(" AND client_id = ");
            query_builder.push_bind(client_id);
        }
        if let Some(statut) = query.statut {
            query_builder.push(" AND statut = ");
            query_builder.push_bind(statut);
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let devis = query_builder
            .build_query_as::<Devis>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(devis)
    }

    /// Accept a quote on behalf of the listing owner.
    ///
    /// The listing transition `disponible -> en_cours` is a conditional
    /// update: if another acceptance landed first, zero rows match and the
    /// whole operation rolls back with a state conflict.
    pub async fn accept(&self, actor: &Actor, devis_id: &Uuid) -> WorkflowResult<Devis> {
        let devis = self.get(devis_id).await?;
        let annonce = self.load_annonce(&devis.annonce_id).await?;
        let decision = engine::accept_devis(actor, &devis, &annonce)?;

        let mut tx = self.db_pool.begin().await?;

        let locked = sqlx::query(
            "UPDATE annonces SET statut = $1, updated_at = $2 WHERE id = $3 AND statut = 'disponible'",
        )
        .bind(decision.annonce_statut.unwrap_or(AnnonceStatut::EnCours))
        .bind(Utc::now())
        .bind(devis.annonce_id)
        .execute(&mut *tx)
        .await?;

        if locked.rows_affected() == 0 {
            return Err(WorkflowError::StateConflict(format!(
                "listing {} already has an accepted quote or is closed",
                devis.annonce_id
            )));
        }

        let accepted = sqlx::query_as::<_, Devis>(
            r#"
            UPDATE devis SET statut = $1, updated_at = $2
            WHERE id = $3 AND statut = 'en_attente'
            RETURNING *
            "#,
        )
        .bind(decision.devis_statut)
        .bind(Utc::now())
        .bind(devis_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            WorkflowError::StateConflict(format!("quote {} is already resolved", devis_id))
        })?;

        tx.commit().await?;

        tracing::info!(
            devis_id = %devis_id,
            annonce_id = %devis.annonce_id,
            "Quote accepted, listing locked"
        );

        Ok(accepted)
    }

    /// Refuse a quote on behalf of the listing owner; the listing stays
    /// open for the remaining quotes
    pub async fn refuse(
        &self,
        actor: &Actor,
        devis_id: &Uuid,
        motif: Option<String>,
    ) -> WorkflowResult<Devis> {
        let devis = self.get(devis_id).await?;
        let annonce = self.load_annonce(&devis.annonce_id).await?;
        let decision = engine::refuse_devis(actor, &devis, &annonce)?;

        self.resolve(devis_id, decision.devis_statut, motif).await
    }

    /// Withdraw a quote on behalf of the bidding transporter
    pub async fn cancel(
        &self,
        actor: &Actor,
        devis_id: &Uuid,
        motif: Option<String>,
    ) -> WorkflowResult<Devis> {
        let devis = self.get(devis_id).await?;
        let decision = engine::cancel_devis(actor, &devis)?;

        self.resolve(devis_id, decision.devis_statut, motif).await
    }

    /// Expire pending quotes whose listing departure date has passed.
    ///
    /// Called by the background sweeper; returns the expired quote ids.
    pub async fn expire_stale(&self) -> WorkflowResult<Vec<Uuid>> {
        let expired = sqlx::query_as::<_, (Uuid,)>(
            r#"
            UPDATE devis d SET statut = 'expire', updated_at = $1
            FROM annonces a
            WHERE d.annonce_id = a.id
              AND d.statut = 'en_attente'
              AND a.date_depart < $1
            RETURNING d.id
            "#,
        )
        .bind(Utc::now())
        .fetch_all(&self.db_pool)
        .await?;

        Ok(expired.into_iter().map(|(id,)| id).collect())
    }

    // ===== Private helpers =====

    /// Conditional single-quote resolution (refuse / cancel)
    async fn resolve(
        &self,
        devis_id: &Uuid,
        statut: DevisStatut,
        motif: Option<String>,
    ) -> WorkflowResult<Devis> {
        let resolved = sqlx::query_as::<_, Devis>(
            r#"
            UPDATE devis SET statut = $1, motif = COALESCE($2, motif), updated_at = $3
            WHERE id = $4 AND statut = 'en_attente'
            RETURNING *
            "#,
        )
        .bind(statut)
        .bind(motif)
        .bind(Utc::now())
        .bind(devis_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| {
            WorkflowError::StateConflict(format!("quote {} is already resolved", devis_id))
        })?;

        tracing::info!(devis_id = %devis_id, statut = ?statut, "Quote resolved");

        Ok(resolved)
    }

    async fn load_annonce(&self, annonce_id: &Uuid) -> WorkflowResult<Annonce> {
        sqlx::query_as::<_, Annonce>("SELECT * FROM annonces WHERE id = $1")
            .bind(annonce_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("listing {} not found", annonce_id)))
    }
}

/// Background job expiring stale pending quotes
pub async fn expiry_sweeper(
    devis_service: Arc<DevisService>,
    dispatcher: EventDispatcher,
    interval: Duration,
) {
    tracing::info!("Starting quote expiry sweeper");

    loop {
        tokio::time::sleep(interval).await;

        match devis_service.expire_stale().await {
            Ok(expired) => {
                for devis_id in expired {
                    dispatcher.emit(WorkflowEvent::DevisExpired { devis_id });
                    tracing::info!(devis_id = %devis_id, "Quote expired");
                }
            }
            Err(e) => {
                tracing::error!("Error expiring quotes: {}", e);
            }
        }
    }
}
