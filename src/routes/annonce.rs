//! Annonce route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn annonce_routes() -> Router<AppState> {
    Router::new()
        .route("/api/annonces", post(create_annonce))
        .route("/api/annonces", get(list_annonces))
        .route(
            "/api/annonces/:id",
            get(get_annonce)
                .put(update_annonce)
                .delete(delete_annonce),
        )
        .route("/api/annonces/:id/annuler", post(cancel_annonce))
}
