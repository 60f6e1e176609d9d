//! The ceremony failure taxonomy.
//!
//! Every variant maps to one user-facing message class. None of these
//! are retried automatically: a ceremony's challenge is single-use, so
//! after any failure the flow restarts from options-fetch or not at all.

use attendkey_proto::codec::DecodeError;
use attendkey_proto::status::VerifyFailureReason;
use thiserror::Error;

/// Shorthand for ceremony results.
pub type CeremonyResult<T> = Result<T, CeremonyError>;

/// Everything that can end a ceremony attempt early.
#[derive(Debug, Error)]
pub enum CeremonyError {
    /// The hosting environment exposes no public-key credential
    /// capability. Detected before any network call.
    #[error("this device does not support biometric credentials")]
    CapabilityUnsupported,

    /// The server could not or would not issue ceremony options.
    #[error("could not obtain ceremony options: {reason}")]
    OptionsUnavailable {
        /// What went wrong, suitable for display.
        reason: String,
    },

    /// The user dismissed the authenticator prompt, or cancelled the
    /// attempt from the surrounding UI.
    #[error("the ceremony was cancelled")]
    UserCancelled,

    /// The authenticator did not complete within the configured window.
    #[error("timed out waiting for the authenticator")]
    Timeout,

    /// A transport string could not be decoded into bytes.
    #[error("malformed transport data: {0}")]
    Decode(#[from] DecodeError),

    /// The server verified the ceremony result and declined it.
    #[error("the server rejected the ceremony: {0}")]
    Verification(VerifyFailureReason),

    /// The network transport failed while talking to the server.
    #[error("network failure while contacting the server")]
    Network(#[source] reqwest::Error),

    /// A non-ceremony endpoint declined the request.
    #[error("the server declined the request ({status}): {reason}")]
    Rejected {
        /// The HTTP status the server answered with.
        status: u16,
        /// The server's short reason, when it gave one.
        reason: String,
    },

    /// The ceremony options violate the relying-party security rules,
    /// e.g. an RP id that is not a suffix of the origin domain.
    #[error("ceremony options violate relying party security rules")]
    SecurityViolation,

    /// A fault inside the client or a backend, not attributable to the
    /// user or the server.
    #[error("internal ceremony error: {0}")]
    Internal(String),
}
