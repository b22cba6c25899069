//! Devis (quote) domain module
//!
//! Contains models, service, and the stale-quote expiry sweeper.

mod model;
mod service;

pub use model::*;
pub use service::{expiry_sweeper, DevisService};
