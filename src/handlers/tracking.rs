//! Tracking-related API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::tracking::{
    AdvanceTrackingRequest, DeliverRequest, TrackingStatut, TrackingWithEvents,
};
use crate::workflow::{DeliveryProof, WorkflowEvent};

/// Get the tracking record and history for a listing
pub async fn get_tracking(
    State(state): State<AppState>,
    Path(annonce_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TrackingWithEvents>>> {
    let tracking = state.tracking_service.get(&annonce_id).await?;
    Ok(Json(ApiResponse::ok(tracking)))
}

/// Advance the shipment status (assigned transporter)
pub async fn advance_tracking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(annonce_id): Path<Uuid>,
    Json(request): Json<AdvanceTrackingRequest>,
) -> ApiResult<Json<ApiResponse<TrackingWithEvents>>> {
    // Delivery carries a signature and goes through the dedicated route
    if request.statut == TrackingStatut::Livre {
        return Err(ApiError::ValidationError(
            "delivery must go through the livraison endpoint with a signature".to_string(),
        ));
    }

    let tracking = state
        .tracking_service
        .advance(
            &user.actor(),
            &annonce_id,
            request.statut,
            request.commentaire,
            request.localisation,
            None,
        )
        .await?;

    state.dispatcher.emit(WorkflowEvent::TrackingAdvanced {
        annonce_id,
        statut: tracking.tracking.statut,
    });

    Ok(Json(ApiResponse::ok(tracking)))
}

/// Mark the shipment delivered with the captured signature
/// (assigned transporter)
pub async fn deliver_tracking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(annonce_id): Path<Uuid>,
    Json(request): Json<DeliverRequest>,
) -> ApiResult<Json<ApiResponse<TrackingWithEvents>>> {
    let signataire = request.signataire.clone();
    let preuve = DeliveryProof {
        signature: request.signature,
        signataire: request.signataire,
    };

    let tracking = state
        .tracking_service
        .advance(
            &user.actor(),
            &annonce_id,
            TrackingStatut::Livre,
            request.commentaire,
            request.localisation,
            Some(preuve),
        )
        .await?;

    state.dispatcher.emit(WorkflowEvent::Delivered {
        annonce_id,
        devis_id: tracking.tracking.devis_id,
        signataire,
    });

    Ok(Json(ApiResponse::ok(tracking)))
}
