//! Devis-related API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::devis::{CreateDevisRequest, DecideDevisRequest, Devis, ListDevisQuery};
use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::workflow::WorkflowEvent;

/// Submit a quote against a listing
pub async fn create_devis(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateDevisRequest>,
) -> ApiResult<Json<ApiResponse<Devis>>> {
    request.validate()?;

    let devis = state.devis_service.create(&user.actor(), request).await?;

    state.dispatcher.emit(WorkflowEvent::DevisSubmitted {
        devis_id: devis.id,
        annonce_id: devis.annonce_id,
        transporteur_id: devis.transporteur_id,
        client_id: devis.client_id,
    });

    Ok(Json(ApiResponse::ok(devis)))
}

/// Get a single quote by ID
pub async fn get_devis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Devis>>> {
    let devis = state.devis_service.get(&id).await?;
    Ok(Json(ApiResponse::ok(devis)))
}

/// List quotes with filtering and pagination
pub async fn list_devis(
    State(state): State<AppState>,
    Query(query): Query<ListDevisQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Devis>>>> {
    let devis = state.devis_service.list(query).await?;
    Ok(Json(ApiResponse::ok(devis)))
}

/// Accept a quote (listing owner); locks the listing
pub async fn accept_devis(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Devis>>> {
    let devis = state.devis_service.accept(&user.actor(), &id).await?;

    // Both parties are notified of the acceptance
    state.dispatcher.emit(WorkflowEvent::DevisAccepted {
        devis_id: devis.id,
        annonce_id: devis.annonce_id,
        transporteur_id: devis.transporteur_id,
        client_id: devis.client_id,
    });

    Ok(Json(ApiResponse::ok(devis)))
}

/// Refuse a quote (listing owner); the listing stays open
pub async fn refuse_devis(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<DecideDevisRequest>,
) -> ApiResult<Json<ApiResponse<Devis>>> {
    let devis = state
        .devis_service
        .refuse(&user.actor(), &id, request.motif)
        .await?;

    state.dispatcher.emit(WorkflowEvent::DevisRefused {
        devis_id: devis.id,
        annonce_id: devis.annonce_id,
        transporteur_id: devis.transporteur_id,
    });

    Ok(Json(ApiResponse::ok(devis)))
}

/// Withdraw a quote (bidding transporter)
pub async fn cancel_devis(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<DecideDevisRequest>,
) -> ApiResult<Json<ApiResponse<Devis>>> {
    let devis = state
        .devis_service
        .cancel(&user.actor(), &id, request.motif)
        .await?;

    state.dispatcher.emit(WorkflowEvent::DevisCancelled {
        devis_id: devis.id,
        annonce_id: devis.annonce_id,
        client_id: devis.client_id,
    });

    Ok(Json(ApiResponse::ok(devis)))
}
