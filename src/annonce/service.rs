//! Annonce service layer - listing lifecycle management
//!
//! Create/read/list plus the gated mutations: edits and deletion are only
//! legal while the listing is `disponible`, cancellation until `termine`.
//! Gating decisions come from the workflow engine; mutations are applied
//! with status-conditional writes so a concurrent acceptance cannot slip
//! between the check and the write.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::annonce::{
    Annonce, AnnonceStatut, CreateAnnonceRequest, ListAnnoncesQuery, UpdateAnnonceRequest,
};
use crate::devis::DevisStatut;
use crate::models::pagination;
use crate::workflow::{engine, Actor, WorkflowError, WorkflowResult};

/// Annonce service for managing listing lifecycle
#[derive(Clone)]
pub struct AnnonceService {
    db_pool: PgPool,
}

impl AnnonceService {
    /// Create a new annonce service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Publish a new listing owned by the acting client
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateAnnonceRequest,
    ) -> WorkflowResult<Annonce> {
        engine::publish_annonce(actor)?;

        let annonce = sqlx::query_as::<_, Annonce>(
            r#"
            INSERT INTO annonces (
                id, client_id, titre, description, type_transport,
                ville_depart, adresse_depart, ville_arrivee, adresse_arrivee,
                date_depart, poids, volume, dimensions, valeur_declaree,
                urgent, photos, statut, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id)
        .bind(&request.titre)
        .bind(&request.description)
        .bind(request.type_transport)
        .bind(&request.ville_depart)
        .bind(&request.adresse_depart)
        .bind(&request.ville_arrivee)
        .bind(&request.adresse_arrivee)
        .bind(request.date_depart)
        .bind(request.poids)
        .bind(request.volume)
        .bind(&request.dimensions)
        .bind(request.valeur_declaree)
        .bind(request.urgent)
        .bind(&request.photos)
        .bind(AnnonceStatut::Disponible)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(annonce_id = %annonce.id, client_id = %actor.user_id, "Listing published");

        Ok(annonce)
    }

    /// Get a single listing by ID
    pub async fn get(&self, id: &Uuid) -> WorkflowResult<Annonce> {
        sqlx::query_as::<_, Annonce>("SELECT * FROM annonces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("listing {} not found", id)))
    }

    /// List listings with filtering and pagination
    pub async fn list(&self, query: ListAnnoncesQuery) -> WorkflowResult<Vec<Annonce>> {
        let (limit, offset) = pagination(query.page, query.limit);

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM annonces WHERE 1=1");

        if let Some(statut) = query.statut {
            query_builder.push(" AND statut = ");
            query_builder.push_bind(statut);
        }
        if let Some(client_id) = query.client_id {
            query_builder.push(" AND client_id = ");
            query_builder.push_bind(client_id);
        }
        if let Some(type_transport) = query.type_transport {
            query_builder.push(" AND type_transport = ");
            query_builder.push_bind(type_transport);
        }
        if let Some(ville_depart) = query.ville_depart {
            query_builder.push(" AND ville_depart ILIKE ");
            query_builder.push_bind(ville_depart);
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let annonces = query_builder
            .build_query_as::<Annonce>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(annonces)
    }

    /// Edit a listing; only legal while no quote has been accepted
    pub async fn update(
        &self,
        actor: &Actor,
        id: &Uuid,
        request: UpdateAnnonceRequest,
    ) -> WorkflowResult<Annonce> {
        let annonce = self.get(id).await?;
        engine::modify_annonce(actor, &annonce)?;

        let updated = sqlx::query_as::<_, Annonce>(
            r#"
            UPDATE annonces SET
                titre = COALESCE($2, titre),
                description = COALESCE($3, description),
                type_transport = COALESCE($4, type_transport),
                ville_depart = COALESCE($5, ville_depart),
                adresse_depart = COALESCE($6, adresse_depart),
                ville_arrivee = COALESCE($7, ville_arrivee),
                adresse_arrivee = COALESCE($8, adresse_arrivee),
                date_depart = COALESCE($9, date_depart),
                poids = COALESCE($10, poids),
                volume = COALESCE($11, volume),
                dimensions = COALESCE($12, dimensions),
                valeur_declaree = COALESCE($13, valeur_declaree),
                urgent = COALESCE($14, urgent),
                photos = COALESCE($15, photos),
                updated_at = $16
            WHERE id = $1 AND statut = 'disponible'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.titre)
        .bind(request.description)
        .bind(request.type_transport)
        .bind(request.ville_depart)
        .bind(request.adresse_depart)
        .bind(request.ville_arrivee)
        .bind(request.adresse_arrivee)
        .bind(request.date_depart)
        .bind(request.poids)
        .bind(request.volume)
        .bind(request.dimensions)
        .bind(request.valeur_declaree)
        .bind(request.urgent)
        .bind(request.photos)
        .bind(Utc::now())
        .fetch_optional(&self.db_pool)
        .await?;

        updated.ok_or_else(|| {
            WorkflowError::StateConflict(format!("listing {} can no longer be modified", id))
        })
    }

    /// Delete a listing; only legal while no quote has been accepted.
    ///
    /// Its quotes go with it (cascade); a listing past `disponible` can
    /// only be cancelled, never deleted.
    pub async fn delete(&self, actor: &Actor, id: &Uuid) -> WorkflowResult<()> {
        let annonce = self.get(id).await?;
        engine::modify_annonce(actor, &annonce)?;

        let result = sqlx::query("DELETE FROM annonces WHERE id = $1 AND statut = 'disponible'")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::StateConflict(format!(
                "listing {} can no longer be deleted",
                id
            )));
        }

        tracing::info!(annonce_id = %id, "Listing deleted");

        Ok(())
    }

    /// Cancel a listing; allowed at any point before `termine`.
    ///
    /// A live accepted quote is cancelled in the same transaction so the
    /// transporter side cannot keep advancing a cancelled transport.
    pub async fn cancel(&self, actor: &Actor, id: &Uuid) -> WorkflowResult<Annonce> {
        let annonce = self.get(id).await?;
        engine::cancel_annonce(actor, &annonce)?;

        let mut tx = self.db_pool.begin().await?;

        let cancelled = sqlx::query_as::<_, Annonce>(
            r#"
            UPDATE annonces SET statut = $1, updated_at = $2
            WHERE id = $3 AND statut IN ('disponible', 'en_cours')
            RETURNING *
            "#,
        )
        .bind(AnnonceStatut::Annule)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            WorkflowError::StateConflict(format!("listing {} is already closed", id))
        })?;

        sqlx::query(
            r#"
            UPDATE devis SET statut = $1, updated_at = $2
            WHERE annonce_id = $3 AND statut IN ('accepte', 'en_cours')
            "#,
        )
        .bind(DevisStatut::Annule)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(annonce_id = %id, "Listing cancelled");

        Ok(cancelled)
    }
}
