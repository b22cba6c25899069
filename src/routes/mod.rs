//! Route definitions for the Pro-Trans API

mod annonce;
mod devis;
mod tracking;

pub use annonce::annonce_routes;
pub use devis::devis_routes;
pub use tracking::tracking_routes;
