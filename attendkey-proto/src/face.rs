//! Wire types for the face-embedding capture flow.
//!
//! The client computes a face descriptor with a vision library and only
//! exchanges the resulting vector with the server. Model loading and
//! inference are not this crate's concern.

use serde::{Deserialize, Serialize};

/// Body of `POST /face/enroll`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct FaceEnrollRequest {
    /// The face descriptor vector.
    pub embedding: Vec<f32>,
    /// An optional label for the stored descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Response of `POST /face/enroll`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct FaceEnrollResponse {
    /// True when the descriptor was stored.
    pub enrolled: bool,
}

/// Body of `POST /face/verify`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct FaceVerifyRequest {
    /// The face descriptor vector to compare against enrollment.
    pub embedding: Vec<f32>,
}

/// Response of `POST /face/verify`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct FaceVerifyResponse {
    /// True when the descriptor matched the enrolled one.
    pub verified: bool,
    /// The measured distance between descriptors, when the server
    /// discloses it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}
