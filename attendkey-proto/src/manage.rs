//! Wire types for managing enrolled credentials.
//!
//! These records are owned by the server; the client only reads,
//! renames, and deletes them outside any ceremony.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored credential as listed by `GET /biometric/credentials`.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCredential {
    /// The credential id, transport encoded.
    pub id: String,
    /// The label the user gave the credential at enrollment.
    pub name: String,
    /// When the credential was enrolled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the credential last answered an authentication ceremony.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Response of `GET /biometric/credentials`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct CredentialList {
    /// The caller's enrolled credentials.
    pub credentials: Vec<EnrolledCredential>,
}

/// Body of `PUT /biometric/credentials/:id`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct RenameCredentialRequest {
    /// The new label.
    pub name: String,
}
