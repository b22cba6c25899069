//! API handlers for the Pro-Trans backend

mod annonce;
mod devis;
mod tracking;

pub use annonce::*;
pub use devis::*;
pub use tracking::*;

// Re-export AuthenticatedUser from middleware for handler use
pub use crate::middleware::auth::AuthenticatedUser;
