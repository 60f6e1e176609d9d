//! Wire types for the enrollment (registration) ceremony.

use crate::codec::TransportBytes;
use crate::manage::EnrolledCredential;
use crate::options::*;
use serde::{Deserialize, Serialize};

/// Body of `POST /biometric/enroll/start`.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollStartRequest {
    /// The human readable label for the new credential, e.g.
    /// "Office laptop".
    pub credential_name: String,
}

/// The server's answer to an enrollment start request: a one-time
/// ceremony configuration.
///
/// The challenge stays a plain string here. The server compares the
/// echoed challenge byte for byte when the ceremony completes, so the
/// client must retain the exact value it was issued; decoding to bytes
/// for the authenticator happens downstream.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentChallenge {
    /// The one-time challenge for the new credential to sign.
    pub challenge: String,
    /// The relying party the credential will be bound to.
    pub rp: RelyingParty,
    /// The user the credential belongs to.
    pub user: UserEntity,
    /// Algorithms the server accepts, in order of preference.
    pub pub_key_cred_params: Vec<PubKeyCredParams>,
    /// How long the authenticator should accept the operation, in
    /// milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// The requested attestation level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation: Option<AttestationConveyancePreference>,
    /// Criteria for which authenticators may be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
}

/// The authenticator's attestation response, transport encoded.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct AttestationResponsePayload {
    /// The collected client data the authenticator signed over.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: TransportBytes,
    /// The CBOR attestation object.
    #[serde(rename = "attestationObject")]
    pub attestation_object: TransportBytes,
    /// The credential public key, when the authenticator exposes it.
    /// Serialised as an explicit `null` when absent; the server relies
    /// on distinguishing "not provided" from "empty".
    #[serde(rename = "publicKey", default)]
    pub public_key: Option<TransportBytes>,
    /// Transports the authenticator reports for this credential.
    #[serde(default)]
    pub transports: Vec<AuthenticatorTransport>,
}

/// A new credential as submitted to the server for verification.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct RegisterCredentialPayload {
    /// The credential id, as binary.
    pub id: TransportBytes,
    /// The type of credential. Always `public-key`.
    #[serde(rename = "type")]
    pub type_: String,
    /// The authenticator's attestation response.
    pub response: AttestationResponsePayload,
}

/// Body of `POST /biometric/enroll/complete`.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollCompleteRequest {
    /// The label chosen when the ceremony started.
    pub credential_name: String,
    /// The challenge exactly as issued by the server for this attempt.
    pub challenge: String,
    /// The encoded attestation result.
    pub credential: RegisterCredentialPayload,
}

/// Confirmation that a credential was verified and stored.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollCompleteResponse {
    /// True when the attestation verified and the credential was stored.
    pub verified: bool,
    /// The stored credential record.
    pub credential: EnrolledCredential,
}
