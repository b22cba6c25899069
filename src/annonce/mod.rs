//! Annonce (transport listing) domain module
//!
//! Contains models and service for listing lifecycle management.

mod model;
mod service;

pub use model::*;
pub use service::AnnonceService;
