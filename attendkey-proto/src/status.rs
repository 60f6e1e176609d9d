//! Server verdicts and error bodies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The reason a verification endpoint declined a ceremony result.
///
/// Every reason is terminal for the attempt: the challenge has been
/// consumed, so the client must restart from options-fetch rather than
/// resubmit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyFailureReason {
    /// The echoed challenge did not match an outstanding one, or the
    /// challenge was already consumed.
    ChallengeMismatch,
    /// The attestation or assertion signature did not verify.
    SignatureInvalid,
    /// The reported signature counter regressed, suggesting a cloned
    /// credential.
    CounterRegression,
    /// No enrolled credential matches the submitted id.
    UnknownCredential,
    /// The server declined for a reason this client does not recognise.
    #[serde(other)]
    Unspecified,
}

impl fmt::Display for VerifyFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            VerifyFailureReason::ChallengeMismatch => "challenge mismatch",
            VerifyFailureReason::SignatureInvalid => "invalid signature",
            VerifyFailureReason::CounterRegression => "signature counter regression",
            VerifyFailureReason::UnknownCredential => "unknown credential",
            VerifyFailureReason::Unspecified => "request declined",
        };
        write!(f, "{}", msg)
    }
}

/// The JSON body the server attaches to declined requests.
#[derive(Debug, Serialize, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// A short human readable message. Never verbatim internals.
    pub error: String,
    /// The machine readable reason, when the endpoint declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<VerifyFailureReason>,
}
