//! Authentication models for Pro-Trans
//!
//! Session credentials are issued by the external identity provider; this
//! backend only verifies them and extracts `{ user_id, role }`.

use serde::{Deserialize, Serialize};

/// JWT claims expected on incoming access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    /// Role name as issued by the identity provider
    pub role: String,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
}
