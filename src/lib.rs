//! Pro-Trans Backend Library
//!
//! This library exports the core modules for the Pro-Trans marketplace
//! backend server: listing (annonce), quote (devis) and shipment tracking
//! domains, plus the workflow engine that governs their correlated states.

pub mod annonce;
pub mod config;
pub mod db;
pub mod devis;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod tracking;
pub mod workflow;
