//! Annonce-related API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::annonce::{Annonce, CreateAnnonceRequest, ListAnnoncesQuery, UpdateAnnonceRequest};
use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::workflow::WorkflowEvent;

/// Publish a new listing
pub async fn create_annonce(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateAnnonceRequest>,
) -> ApiResult<Json<ApiResponse<Annonce>>> {
    request.validate()?;

    let annonce = state
        .annonce_service
        .create(&user.actor(), request)
        .await?;

    state.dispatcher.emit(WorkflowEvent::AnnonceCreated {
        annonce_id: annonce.id,
        client_id: annonce.client_id,
    });

    Ok(Json(ApiResponse::ok(annonce)))
}

/// Get a single listing by ID
pub async fn get_annonce(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Annonce>>> {
    let annonce = state.annonce_service.get(&id).await?;
    Ok(Json(ApiResponse::ok(annonce)))
}

/// List listings with filtering and pagination
pub async fn list_annonces(
    State(state): State<AppState>,
    Query(query): Query<ListAnnoncesQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Annonce>>>> {
    let annonces = state.annonce_service.list(query).await?;
    Ok(Json(ApiResponse::ok(annonces)))
}

/// Edit a listing (only while it has no accepted quote)
pub async fn update_annonce(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAnnonceRequest>,
) -> ApiResult<Json<ApiResponse<Annonce>>> {
    request.validate()?;

    let annonce = state
        .annonce_service
        .update(&user.actor(), &id, request)
        .await?;

    Ok(Json(ApiResponse::ok(annonce)))
}

/// Delete a listing (only while it has no accepted quote)
pub async fn delete_annonce(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.annonce_service.delete(&user.actor(), &id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// Cancel a listing (any point before completion)
pub async fn cancel_annonce(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Annonce>>> {
    let annonce = state.annonce_service.cancel(&user.actor(), &id).await?;

    state.dispatcher.emit(WorkflowEvent::AnnonceCancelled {
        annonce_id: annonce.id,
        client_id: annonce.client_id,
    });

    Ok(Json(ApiResponse::ok(annonce)))
}
