//! Shared vocabulary for ceremony options issued by the attendance
//! server to the client before a registration or authentication
//! ceremony.

use crate::codec::TransportBytes;
use serde::{Deserialize, Serialize};

/// The only credential type the attendance server issues.
pub const PUBLIC_KEY_TYPE: &str = "public-key";

/// Defines the user verification policy requested of the authenticator.
///
/// Verification means the authenticator performs a supplementary check of
/// who the user is, such as a fingerprint match or a PIN, rather than
/// only confirming that somebody is present.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationPolicy {
    /// The ceremony fails unless the authenticator verified the user.
    Required,
    /// Verify when the authenticator is able to, otherwise presence only.
    Preferred,
    /// Ask the authenticator to skip verification.
    Discouraged,
}

impl Default for UserVerificationPolicy {
    fn default() -> Self {
        UserVerificationPolicy::Preferred
    }
}

/// Relying Party entity: the attendance service on whose behalf
/// credentials are issued.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelyingParty {
    /// The id the credential will be bound to. Always server-supplied;
    /// clients must never substitute their own hostname.
    pub id: String,
    /// The human readable name of the relying party.
    pub name: String,
}

/// User entity a new credential is created for.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// The user's opaque id. Unique, stable, and free of personally
    /// identifying information.
    pub id: TransportBytes,
    /// The account name, typically the employee's email address.
    pub name: String,
    /// The name shown during the ceremony.
    pub display_name: String,
}

/// A public key algorithm the server is willing to accept.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct PubKeyCredParams {
    /// The type of credential. Always `public-key`.
    #[serde(rename = "type")]
    pub type_: String,
    /// The COSE algorithm identifier, e.g. -7 for ES256.
    pub alg: i64,
}

/// How much attestation detail the server asks the authenticator for.
#[derive(Debug, Serialize, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    /// Do not request attestation.
    None,
    /// Request attestation in a semi-anonymised form.
    Indirect,
    /// Request attestation in a direct form.
    Direct,
}

/// Transport hints for reaching a credential. Hints only, not enforced.
#[derive(Debug, Serialize, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorTransport {
    /// An external token over USB.
    Usb,
    /// An external token over NFC.
    Nfc,
    /// An external token over Bluetooth Low Energy.
    Ble,
    /// A platform authenticator built into the device.
    Internal,
    /// A phone acting as an authenticator over a hybrid transport.
    Hybrid,
    /// A transport this client does not recognise. Preserved so newer
    /// servers do not break older clients.
    #[serde(other)]
    Unknown,
}

/// Which kind of authenticator the user should be steered towards.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthenticatorAttachment {
    /// A device that is part of the machine.
    #[serde(rename = "platform")]
    Platform,
    /// A removable token.
    #[serde(rename = "cross-platform")]
    CrossPlatform,
}

/// Criteria restricting which authenticators may take part in a
/// registration ceremony.
#[derive(Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    /// The preferred attachment. A hint, not enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,

    /// Ask for a resident key. The authenticator may ignore this.
    #[serde(default)]
    pub require_resident_key: bool,

    /// The verification level to request during registration.
    #[serde(default)]
    pub user_verification: UserVerificationPolicy,
}

/// A descriptor of an already-enrolled credential that may answer an
/// authentication challenge.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct AllowCredentials {
    /// The type of credential. Always `public-key`.
    #[serde(rename = "type")]
    pub type_: String,
    /// The credential id.
    pub id: TransportBytes,
    /// Transport hints for this credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}
