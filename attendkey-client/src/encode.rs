//! Transport encoding of authenticator results.
//!
//! Every byte field goes through the codec; scalar fields pass through
//! unchanged. Optional fields the authenticator withheld stay `None`
//! so they reach the wire as an explicit null rather than disappearing
//! or becoming an empty string.

use crate::types::{AssertionResult, CredentialResult};
use attendkey_proto::{
    AssertionPayload, AssertionResponsePayload, AttestationResponsePayload,
    RegisterCredentialPayload, TransportBytes, PUBLIC_KEY_TYPE,
};

/// Serialise a registration result for submission.
pub fn encode_credential(result: &CredentialResult) -> RegisterCredentialPayload {
    RegisterCredentialPayload {
        id: TransportBytes::from(result.credential_id.as_slice()),
        type_: PUBLIC_KEY_TYPE.to_string(),
        response: AttestationResponsePayload {
            client_data_json: TransportBytes::from(result.client_data_json.as_slice()),
            attestation_object: TransportBytes::from(result.attestation_object.as_slice()),
            public_key: result
                .public_key
                .as_deref()
                .map(TransportBytes::from),
            transports: result.transports.clone(),
        },
    }
}

/// Serialise an authentication result for submission.
pub fn encode_assertion(result: &AssertionResult) -> AssertionPayload {
    AssertionPayload {
        id: TransportBytes::from(result.credential_id.as_slice()),
        type_: PUBLIC_KEY_TYPE.to_string(),
        response: AssertionResponsePayload {
            client_data_json: TransportBytes::from(result.client_data_json.as_slice()),
            authenticator_data: TransportBytes::from(result.authenticator_data.as_slice()),
            signature: TransportBytes::from(result.signature.as_slice()),
            user_handle: result
                .user_handle
                .as_deref()
                .map(TransportBytes::from),
            sign_count: result.sign_count,
        },
    }
}
