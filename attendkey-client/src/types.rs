//! Decoded ceremony options and authenticator results.
//!
//! The wire DTOs in attendkey-proto carry transport strings; the types
//! here are their byte-decoded counterparts, ready for an
//! [crate::AuthenticatorBackend]. Decoding happens once, at the fetch
//! boundary, so the rest of the ceremony never touches base64.

use crate::error::CeremonyError;
use attendkey_proto::{
    AssertionChallenge, AttestationConveyancePreference, AuthenticatorSelectionCriteria,
    AuthenticatorTransport, EnrolledCredential, EnrollmentChallenge, PubKeyCredParams,
    RelyingParty, SessionGrant, TransportBytes, UserVerificationPolicy,
};

/// Decoded options for a registration ceremony.
///
/// `challenge_echo` preserves the server's challenge string exactly as
/// issued; the completion request must echo it byte for byte, even when
/// the server used a non-canonical base64 flavour.
#[derive(Debug, Clone)]
pub struct CreationOptions {
    /// The decoded one-time challenge.
    pub challenge: Vec<u8>,
    /// The challenge string verbatim, for the completion request.
    pub challenge_echo: String,
    /// The relying party the credential will be bound to.
    pub rp: RelyingParty,
    /// The decoded user id.
    pub user_id: Vec<u8>,
    /// The account name.
    pub user_name: String,
    /// The name shown during the ceremony.
    pub user_display_name: String,
    /// Acceptable algorithms, in server preference order.
    pub pub_key_cred_params: Vec<PubKeyCredParams>,
    /// Requested authenticator window in milliseconds.
    pub timeout: Option<u32>,
    /// Requested attestation level.
    pub attestation: Option<AttestationConveyancePreference>,
    /// Authenticator selection criteria.
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
}

impl TryFrom<EnrollmentChallenge> for CreationOptions {
    type Error = CeremonyError;

    fn try_from(wire: EnrollmentChallenge) -> Result<Self, Self::Error> {
        let challenge = TransportBytes::decode(&wire.challenge)?;
        if challenge.is_empty() {
            return Err(CeremonyError::OptionsUnavailable {
                reason: "server issued an empty challenge".to_string(),
            });
        }
        if wire.user.id.is_empty() {
            return Err(CeremonyError::OptionsUnavailable {
                reason: "server issued enrollment options without a user id".to_string(),
            });
        }

        Ok(CreationOptions {
            challenge: challenge.into(),
            challenge_echo: wire.challenge,
            rp: wire.rp,
            user_id: wire.user.id.into(),
            user_name: wire.user.name,
            user_display_name: wire.user.display_name,
            pub_key_cred_params: wire.pub_key_cred_params,
            timeout: wire.timeout,
            attestation: wire.attestation,
            authenticator_selection: wire.authenticator_selection,
        })
    }
}

/// A credential an authentication ceremony may be answered with.
#[derive(Debug, Clone)]
pub struct AllowedCredential {
    /// The decoded credential id.
    pub id: Vec<u8>,
    /// Transport hints for this credential.
    pub transports: Vec<AuthenticatorTransport>,
}

/// Decoded options for an authentication ceremony.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// The decoded one-time challenge.
    pub challenge: Vec<u8>,
    /// The challenge string verbatim, for the completion request.
    pub challenge_echo: String,
    /// The relying party id the assertion is scoped to.
    pub rp_id: String,
    /// Credentials allowed to answer. Empty means any credential bound
    /// to this relying party.
    pub allow_credentials: Vec<AllowedCredential>,
    /// Requested authenticator window in milliseconds.
    pub timeout: Option<u32>,
    /// The verification policy for this ceremony.
    pub user_verification: UserVerificationPolicy,
}

impl TryFrom<AssertionChallenge> for RequestOptions {
    type Error = CeremonyError;

    fn try_from(wire: AssertionChallenge) -> Result<Self, Self::Error> {
        let challenge = TransportBytes::decode(&wire.challenge)?;
        if challenge.is_empty() {
            return Err(CeremonyError::OptionsUnavailable {
                reason: "server issued an empty challenge".to_string(),
            });
        }

        let allow_credentials = wire
            .allow_credentials
            .into_iter()
            .map(|cred| AllowedCredential {
                id: cred.id.into(),
                transports: cred.transports.unwrap_or_default(),
            })
            .collect();

        Ok(RequestOptions {
            challenge: challenge.into(),
            challenge_echo: wire.challenge,
            rp_id: wire.rp_id,
            allow_credentials,
            timeout: wire.timeout,
            user_verification: wire.user_verification,
        })
    }
}

/// What the authenticator produced for a registration ceremony.
///
/// Produced once per successful ceremony and consumed immediately by the
/// response encoder; never persisted.
#[derive(Debug, Clone)]
pub struct CredentialResult {
    /// The new credential's id.
    pub credential_id: Vec<u8>,
    /// The CBOR attestation object.
    pub attestation_object: Vec<u8>,
    /// The collected client data the authenticator signed over.
    pub client_data_json: Vec<u8>,
    /// The credential public key, when the authenticator exposes one.
    /// `None` must survive all the way to the wire as an explicit null.
    pub public_key: Option<Vec<u8>>,
    /// Transports the authenticator reports for this credential.
    pub transports: Vec<AuthenticatorTransport>,
}

/// What the authenticator produced for an authentication ceremony.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// The id of the credential that answered.
    pub credential_id: Vec<u8>,
    /// Raw authenticator data, including the signature counter.
    pub authenticator_data: Vec<u8>,
    /// The assertion signature.
    pub signature: Vec<u8>,
    /// The collected client data the authenticator signed over.
    pub client_data_json: Vec<u8>,
    /// The user handle, when the authenticator discloses one.
    pub user_handle: Option<Vec<u8>>,
    /// The authenticator-reported signature counter, forwarded verbatim.
    pub sign_count: u32,
}

/// The outcome of a completed ceremony.
///
/// One tagged type for both ceremonies, so callers match on the variant
/// instead of wiring up differently-shaped callbacks.
#[derive(Debug, Clone)]
pub enum CeremonyOutcome {
    /// A registration ceremony verified and stored a credential.
    Enrolled(EnrolledCredential),
    /// An authentication ceremony verified and granted a session.
    Verified(SessionGrant),
}

#[cfg(test)]
mod tests {
    use super::{CreationOptions, RequestOptions};
    use crate::error::CeremonyError;
    use attendkey_proto::{
        AssertionChallenge, EnrollmentChallenge, RelyingParty, TransportBytes, UserEntity,
        UserVerificationPolicy,
    };

    fn enrollment_wire(challenge: &str, user_id: &[u8]) -> EnrollmentChallenge {
        EnrollmentChallenge {
            challenge: challenge.to_string(),
            rp: RelyingParty {
                id: "attendance.example.com".to_string(),
                name: "Employee Attendance System".to_string(),
            },
            user: UserEntity {
                id: TransportBytes::from(user_id),
                name: "a@b.com".to_string(),
                display_name: "A".to_string(),
            },
            pub_key_cred_params: Vec::new(),
            timeout: Some(60_000),
            attestation: None,
            authenticator_selection: None,
        }
    }

    #[test]
    fn decodes_and_keeps_the_verbatim_challenge() {
        let options =
            CreationOptions::try_from(enrollment_wire("Y2hhbA==", b"user1")).expect("decode");
        assert_eq!(options.challenge, b"chal");
        assert_eq!(options.challenge_echo, "Y2hhbA==");
        assert_eq!(options.user_id, b"user1");
    }

    #[test]
    fn empty_challenge_is_refused() {
        let err = CreationOptions::try_from(enrollment_wire("", b"user1"))
            .err()
            .expect("must refuse");
        assert!(matches!(err, CeremonyError::OptionsUnavailable { .. }));
    }

    #[test]
    fn missing_user_id_is_refused() {
        let err = CreationOptions::try_from(enrollment_wire("Y2hhbA==", b""))
            .err()
            .expect("must refuse");
        assert!(matches!(err, CeremonyError::OptionsUnavailable { .. }));
    }

    #[test]
    fn malformed_challenge_is_a_decode_error() {
        let err = CreationOptions::try_from(enrollment_wire("not base64!", b"user1"))
            .err()
            .expect("must refuse");
        assert!(matches!(err, CeremonyError::Decode(_)));
    }

    #[test]
    fn assertion_options_decode_allow_list() {
        let wire: AssertionChallenge = serde_json::from_str(
            r#"{
            "challenge": "AAEC",
            "rpId": "attendance.example.com",
            "allowCredentials": [
                { "type": "public-key", "id": "AQID" }
            ]
        }"#,
        )
        .expect("wire parse");

        let options = RequestOptions::try_from(wire).expect("decode");
        assert_eq!(options.challenge, &[0, 1, 2]);
        assert_eq!(options.allow_credentials.len(), 1);
        assert_eq!(options.allow_credentials[0].id, &[1, 2, 3]);
        assert_eq!(options.user_verification, UserVerificationPolicy::Preferred);
    }
}
