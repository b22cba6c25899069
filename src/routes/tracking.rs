//! Tracking route definitions
//!
//! Tracking hangs off the listing: one record per annonce.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/annonces/:id/tracking",
            get(get_tracking).post(advance_tracking),
        )
        .route(
            "/api/annonces/:id/tracking/livraison",
            post(deliver_tracking),
        )
}
