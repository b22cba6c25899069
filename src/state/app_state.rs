//! Application state shared across handlers
//!
//! Services and the event dispatcher are constructed once at startup and
//! injected here; nothing in the request path reaches for ambient globals.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::annonce::AnnonceService;
use crate::devis::DevisService;
use crate::middleware::JwtVerifier;
use crate::tracking::TrackingService;
use crate::workflow::EventDispatcher;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub annonce_service: Arc<AnnonceService>,
    pub devis_service: Arc<DevisService>,
    pub tracking_service: Arc<TrackingService>,
    pub dispatcher: EventDispatcher,
    pub jwt_verifier: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(
        annonce_service: Arc<AnnonceService>,
        devis_service: Arc<DevisService>,
        tracking_service: Arc<TrackingService>,
        dispatcher: EventDispatcher,
        jwt_verifier: Arc<JwtVerifier>,
    ) -> Self {
        Self {
            annonce_service,
            devis_service,
            tracking_service,
            dispatcher,
            jwt_verifier,
        }
    }
}

impl FromRef<AppState> for Arc<AnnonceService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.annonce_service.clone()
    }
}

impl FromRef<AppState> for Arc<DevisService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.devis_service.clone()
    }
}

impl FromRef<AppState> for Arc<TrackingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tracking_service.clone()
    }
}

impl FromRef<AppState> for EventDispatcher {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.dispatcher.clone()
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.jwt_verifier.clone()
    }
}
