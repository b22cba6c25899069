//! Shared data models for the Pro-Trans backend

use serde::{Deserialize, Serialize};

pub mod auth;
pub use auth::*;

/// User roles, as asserted by the external identity provider
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Transporteur,
    Admin,
}

/// Workflow capabilities gated by role.
///
/// Every operation in the workflow engine goes through `UserRole::can`
/// rather than comparing role strings inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, edit, delete or cancel a listing
    PublishAnnonce,
    /// Bid on a listing with a quote
    SubmitDevis,
    /// Accept or refuse a quote on an owned listing
    DecideDevis,
    /// Advance the shipment tracking of an assigned transport
    AdvanceTracking,
}

impl UserRole {
    /// Check whether this role carries the given capability.
    pub fn can(&self, capability: Capability) -> bool {
        match (self, capability) {
            (UserRole::Admin, _) => true,
            (UserRole::Client, Capability::PublishAnnonce | Capability::DecideDevis) => true,
            (UserRole::Transporteur, Capability::SubmitDevis | Capability::AdvanceTracking) => true,
            _ => false,
        }
    }
}

/// API response wrapper: `{ success, data | message }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

/// Clamp pagination query values and compute `(limit, offset)` for SQL.
///
/// Computed in i64 so an extreme `page` value cannot overflow.
pub fn pagination(page: Option<i32>, limit: Option<i32>) -> (i64, i64) {
    let page = i64::from(page.unwrap_or(1).max(1));
    let limit = i64::from(limit.unwrap_or(20).clamp(1, 100));
    (limit, (page - 1) * limit)
}
