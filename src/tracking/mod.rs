//! Tracking (shipment progress) domain module
//!
//! Contains models and service for the per-listing tracking record and its
//! append-only event history.

mod model;
mod service;

pub use model::*;
pub use service::TrackingService;
