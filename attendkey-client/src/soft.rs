//! A software authenticator for tests and demos.
//!
//! [SoftKey] fabricates credentials without any hardware or real
//! asymmetric cryptography: attestation objects are genuine CBOR in the
//! `none` format, assertion signatures are keyed hashes over the same
//! inputs a real authenticator signs, and the per-credential signature
//! counter advances monotonically. That is enough to drive every
//! ceremony path end to end; it is not, and must never be used as, a
//! production credential store.

use crate::error::CeremonyError;
use crate::types::{AssertionResult, CredentialResult, CreationOptions, RequestOptions};
use crate::AuthenticatorBackend;
use async_trait::async_trait;
use attendkey_proto::{AuthenticatorTransport, TransportBytes, PUBLIC_KEY_TYPE};
use rand::RngCore;
use serde_cbor_2::value::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use url::Url;
use uuid::Uuid;

const COSE_ES256: i64 = -7;
const COSE_RS256: i64 = -257;

/// Authenticator data flags: user present, user verified, attested
/// credential data included.
const FLAGS_REGISTER: u8 = 0x01 | 0x04 | 0x40;
/// Authenticator data flags for assertions: user present, user verified.
const FLAGS_ASSERT: u8 = 0x01 | 0x04;

struct SoftCredential {
    secret: [u8; 32],
    rp_id: String,
    user_handle: Vec<u8>,
    counter: u32,
}

/// An in-memory software authenticator.
pub struct SoftKey {
    aaguid: Uuid,
    expose_public_key: bool,
    credentials: HashMap<Vec<u8>, SoftCredential>,
}

impl SoftKey {
    /// Create a soft authenticator. `expose_public_key` controls whether
    /// registration results carry the credential public key, mirroring
    /// real authenticators that do not implement `getPublicKey()`.
    pub fn new(expose_public_key: bool) -> Self {
        SoftKey {
            aaguid: Uuid::new_v4(),
            expose_public_key,
            credentials: HashMap::new(),
        }
    }

    /// Number of credentials held.
    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    fn collected_client_data(
        ceremony_type: &str,
        challenge: &[u8],
        origin: &Url,
    ) -> Result<Vec<u8>, CeremonyError> {
        let document = serde_json::json!({
            "type": ceremony_type,
            "challenge": TransportBytes::from(challenge).to_string(),
            "origin": origin.as_str().trim_end_matches('/'),
            "crossOrigin": false,
        });
        serde_json::to_vec(&document).map_err(|e| CeremonyError::Internal(e.to_string()))
    }

    fn derive(secret: &[u8; 32], label: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret);
        hasher.update(label);
        hasher.finalize().to_vec()
    }

    /// A syntactically valid COSE EC2 key whose coordinates are derived
    /// from the credential secret. Not a usable curve point.
    fn stub_cose_key(secret: &[u8; 32]) -> Value {
        let mut map = BTreeMap::new();
        map.insert(Value::Integer(1), Value::Integer(2)); // kty: EC2
        map.insert(Value::Integer(3), Value::Integer(COSE_ES256 as i128));
        map.insert(Value::Integer(-1), Value::Integer(1)); // crv: P-256
        map.insert(Value::Integer(-2), Value::Bytes(Self::derive(secret, b"x")));
        map.insert(Value::Integer(-3), Value::Bytes(Self::derive(secret, b"y")));
        Value::Map(map)
    }

    fn registration_auth_data(
        &self,
        rp_id: &str,
        credential_id: &[u8],
        cose_key: &Value,
    ) -> Result<Vec<u8>, CeremonyError> {
        let encoded_key =
            serde_cbor_2::to_vec(cose_key).map_err(|e| CeremonyError::Internal(e.to_string()))?;

        let mut data = Vec::with_capacity(55 + credential_id.len() + encoded_key.len());
        data.extend_from_slice(&Sha256::digest(rp_id.as_bytes()));
        data.push(FLAGS_REGISTER);
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(self.aaguid.as_bytes());
        data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(credential_id);
        data.extend_from_slice(&encoded_key);
        Ok(data)
    }

    fn attestation_object(auth_data: Vec<u8>) -> Result<Vec<u8>, CeremonyError> {
        let mut map = BTreeMap::new();
        map.insert(
            Value::Text("fmt".to_string()),
            Value::Text("none".to_string()),
        );
        map.insert(Value::Text("attStmt".to_string()), Value::Map(BTreeMap::new()));
        map.insert(Value::Text("authData".to_string()), Value::Bytes(auth_data));
        serde_cbor_2::to_vec(&Value::Map(map)).map_err(|e| CeremonyError::Internal(e.to_string()))
    }

    fn assertion_auth_data(rp_id: &str, counter: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(37);
        data.extend_from_slice(&Sha256::digest(rp_id.as_bytes()));
        data.push(FLAGS_ASSERT);
        data.extend_from_slice(&counter.to_be_bytes());
        data
    }
}

impl Default for SoftKey {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl AuthenticatorBackend for SoftKey {
    fn is_supported(&self) -> bool {
        true
    }

    async fn perform_register(
        &mut self,
        origin: Url,
        options: CreationOptions,
        _timeout_ms: u32,
    ) -> Result<CredentialResult, CeremonyError> {
        let acceptable = options.pub_key_cred_params.iter().any(|param| {
            param.type_ == PUBLIC_KEY_TYPE && (param.alg == COSE_ES256 || param.alg == COSE_RS256)
        });
        if !acceptable {
            warn!("no acceptable algorithm offered; soft key only speaks ES256/RS256");
            return Err(CeremonyError::CapabilityUnsupported);
        }

        let client_data_json =
            Self::collected_client_data("webauthn.create", &options.challenge, &origin)?;

        let mut credential_id = vec![0u8; 16];
        rand::thread_rng().fill_bytes(&mut credential_id);
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);

        let cose_key = Self::stub_cose_key(&secret);
        let auth_data =
            self.registration_auth_data(&options.rp.id, &credential_id, &cose_key)?;
        let attestation_object = Self::attestation_object(auth_data)?;

        let public_key = if self.expose_public_key {
            Some(
                serde_cbor_2::to_vec(&cose_key)
                    .map_err(|e| CeremonyError::Internal(e.to_string()))?,
            )
        } else {
            None
        };

        trace!(rp = %options.rp.id, "soft key minted a credential");
        self.credentials.insert(
            credential_id.clone(),
            SoftCredential {
                secret,
                rp_id: options.rp.id.clone(),
                user_handle: options.user_id.clone(),
                counter: 0,
            },
        );

        Ok(CredentialResult {
            credential_id,
            attestation_object,
            client_data_json,
            public_key,
            transports: vec![AuthenticatorTransport::Internal],
        })
    }

    async fn perform_auth(
        &mut self,
        origin: Url,
        options: RequestOptions,
        _timeout_ms: u32,
    ) -> Result<AssertionResult, CeremonyError> {
        let credential_id = if options.allow_credentials.is_empty() {
            self.credentials
                .iter()
                .find(|(_, cred)| cred.rp_id == options.rp_id)
                .map(|(id, _)| id.clone())
        } else {
            options
                .allow_credentials
                .iter()
                .map(|allowed| &allowed.id)
                .find(|id| {
                    self.credentials
                        .get(*id)
                        .is_some_and(|cred| cred.rp_id == options.rp_id)
                })
                .cloned()
        };

        let credential_id = credential_id.ok_or_else(|| {
            CeremonyError::Internal("soft key holds no matching credential".to_string())
        })?;

        let client_data_json =
            Self::collected_client_data("webauthn.get", &options.challenge, &origin)?;
        let client_data_hash = Sha256::digest(&client_data_json);

        let credential = self
            .credentials
            .get_mut(&credential_id)
            .ok_or_else(|| CeremonyError::Internal("credential vanished".to_string()))?;
        credential.counter += 1;

        let authenticator_data = Self::assertion_auth_data(&options.rp_id, credential.counter);

        // Keyed hash standing in for an ECDSA signature: same signed
        // inputs, no key pair.
        let mut hasher = Sha256::new();
        hasher.update(credential.secret);
        hasher.update(&authenticator_data);
        hasher.update(client_data_hash);
        let signature = hasher.finalize().to_vec();

        Ok(AssertionResult {
            credential_id,
            authenticator_data,
            signature,
            client_data_json,
            user_handle: Some(credential.user_handle.clone()),
            sign_count: credential.counter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SoftKey;
    use crate::types::{AllowedCredential, CreationOptions, RequestOptions};
    use crate::AuthenticatorBackend;
    use attendkey_proto::{PubKeyCredParams, RelyingParty, UserVerificationPolicy};
    use serde_cbor_2::value::Value;
    use url::Url;

    fn creation_options() -> CreationOptions {
        CreationOptions {
            challenge: b"chal".to_vec(),
            challenge_echo: "Y2hhbA==".to_string(),
            rp: RelyingParty {
                id: "localhost".to_string(),
                name: "Employee Attendance System".to_string(),
            },
            user_id: b"user1".to_vec(),
            user_name: "a@b.com".to_string(),
            user_display_name: "A".to_string(),
            pub_key_cred_params: vec![PubKeyCredParams {
                type_: "public-key".to_string(),
                alg: -7,
            }],
            timeout: Some(60_000),
            attestation: None,
            authenticator_selection: None,
        }
    }

    fn request_options(allow: Vec<AllowedCredential>) -> RequestOptions {
        RequestOptions {
            challenge: b"chal2".to_vec(),
            challenge_echo: "Y2hhbDI=".to_string(),
            rp_id: "localhost".to_string(),
            allow_credentials: allow,
            timeout: Some(60_000),
            user_verification: UserVerificationPolicy::Preferred,
        }
    }

    #[tokio::test]
    async fn registers_and_asserts_with_advancing_counter() {
        let origin = Url::parse("http://localhost").expect("origin");
        let mut key = SoftKey::new(true);

        let created = key
            .perform_register(origin.clone(), creation_options(), 60_000)
            .await
            .expect("register");
        assert_eq!(key.credential_count(), 1);
        assert!(created.public_key.is_some());

        // The attestation object is real CBOR in the `none` format.
        let decoded: Value =
            serde_cbor_2::from_slice(&created.attestation_object).expect("cbor attestation");
        match decoded {
            Value::Map(map) => {
                assert_eq!(
                    map.get(&Value::Text("fmt".to_string())),
                    Some(&Value::Text("none".to_string()))
                );
                assert!(map.contains_key(&Value::Text("authData".to_string())));
            }
            other => panic!("expected a CBOR map, got {:?}", other),
        }

        // The client data carries the canonical base64url challenge.
        let client_data: serde_json::Value =
            serde_json::from_slice(&created.client_data_json).expect("client data json");
        assert_eq!(client_data["type"], "webauthn.create");
        assert_eq!(client_data["challenge"], "Y2hhbA");
        assert_eq!(client_data["origin"], "http://localhost");

        let allow = vec![AllowedCredential {
            id: created.credential_id.clone(),
            transports: Vec::new(),
        }];

        let first = key
            .perform_auth(origin.clone(), request_options(allow.clone()), 60_000)
            .await
            .expect("first assertion");
        let second = key
            .perform_auth(origin, request_options(allow), 60_000)
            .await
            .expect("second assertion");

        assert_eq!(first.sign_count, 1);
        assert_eq!(second.sign_count, 2);
        assert_ne!(first.signature, second.signature);
        assert_eq!(first.user_handle.as_deref(), Some(b"user1".as_slice()));
    }

    #[tokio::test]
    async fn withholds_public_key_when_asked() {
        let origin = Url::parse("http://localhost").expect("origin");
        let mut key = SoftKey::new(false);
        let created = key
            .perform_register(origin, creation_options(), 60_000)
            .await
            .expect("register");
        assert!(created.public_key.is_none());
    }

    #[tokio::test]
    async fn refuses_unknown_algorithms() {
        let origin = Url::parse("http://localhost").expect("origin");
        let mut key = SoftKey::default();
        let mut options = creation_options();
        options.pub_key_cred_params = vec![PubKeyCredParams {
            type_: "public-key".to_string(),
            alg: -8, // EdDSA, not offered by this soft key
        }];
        let err = key
            .perform_register(origin, options, 60_000)
            .await
            .err()
            .expect("must refuse");
        assert!(matches!(err, crate::error::CeremonyError::CapabilityUnsupported));
    }
}
