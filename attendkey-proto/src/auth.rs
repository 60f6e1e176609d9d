//! Wire types for the authentication (assertion) ceremony.

use crate::codec::TransportBytes;
use crate::options::{AllowCredentials, UserVerificationPolicy};
use serde::{Deserialize, Serialize};

/// Body of `POST /biometric/authenticate/start`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct AuthStartRequest {
    /// The account identity attempting to sign in.
    pub email: String,
}

/// The server's answer to an authentication start request.
///
/// As with enrollment, the challenge stays a string so the exact issued
/// value can be echoed back at completion.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionChallenge {
    /// The one-time challenge to be signed by an enrolled credential.
    pub challenge: String,
    /// The relying party id the assertion must be scoped to.
    pub rp_id: String,
    /// How long the authenticator should wait for the user, in
    /// milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// The verification policy for this ceremony.
    #[serde(default)]
    pub user_verification: UserVerificationPolicy,
    /// The credentials allowed to answer. Empty means any credential
    /// bound to this relying party.
    #[serde(default)]
    pub allow_credentials: Vec<AllowCredentials>,
}

/// The authenticator's assertion response, transport encoded.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponsePayload {
    /// The collected client data the authenticator signed over.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: TransportBytes,
    /// Raw authenticator data, including the signature counter.
    pub authenticator_data: TransportBytes,
    /// The assertion signature.
    pub signature: TransportBytes,
    /// The user handle, when the authenticator discloses one.
    /// Serialised as an explicit `null` when absent.
    #[serde(default)]
    pub user_handle: Option<TransportBytes>,
    /// The authenticator-reported signature counter, forwarded verbatim.
    /// The server owns counter-regression policy; the client never
    /// fabricates a value here.
    pub sign_count: u32,
}

/// An assertion as submitted to the server for verification.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct AssertionPayload {
    /// The credential id that produced the assertion, as binary.
    pub id: TransportBytes,
    /// The type of credential. Always `public-key`.
    #[serde(rename = "type")]
    pub type_: String,
    /// The authenticator's assertion response.
    pub response: AssertionResponsePayload,
}

/// Body of `POST /biometric/authenticate/complete`.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct AuthCompleteRequest {
    /// The account identity attempting to sign in.
    pub email: String,
    /// The challenge exactly as issued by the server for this attempt.
    pub challenge: String,
    /// The encoded assertion result.
    pub assertion: AssertionPayload,
}

/// The signed-in account, as returned on successful verification.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct AccountSummary {
    /// The account id.
    pub id: String,
    /// The account's display name.
    pub name: String,
    /// The account email.
    pub email: String,
    /// The account role, e.g. `admin` or `employee`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A verified session: the outcome of a successful authentication
/// ceremony.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct SessionGrant {
    /// The bearer token for subsequent API calls.
    pub token: String,
    /// The authenticated account.
    pub user: AccountSummary,
}
