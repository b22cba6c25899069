//! Devis route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn devis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/devis", post(create_devis))
        .route("/api/devis", get(list_devis))
        .route("/api/devis/:id", get(get_devis))
        .route("/api/devis/:id/accepter", post(accept_devis))
        .route("/api/devis/:id/refuser", post(refuse_devis))
        .route("/api/devis/:id/annuler", post(cancel_devis))
}
