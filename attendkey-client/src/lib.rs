//! attendkey-client drives the biometric enrollment and authentication
//! ceremonies of the Employee Attendance System.
//!
//! This performs the actions a client application takes to register a
//! platform credential with the attendance server and to sign in with
//! one: fetching one-time ceremony options, invoking the platform
//! authenticator capability, transport-encoding the result, and
//! submitting it for verification.
//!
//! The platform authenticator is abstracted behind the
//! [AuthenticatorBackend] trait so the ceremony logic can be exercised
//! with a software authenticator ([soft::SoftKey]) instead of real
//! hardware.

#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
extern crate tracing;

use crate::error::CeremonyError;
use crate::types::{AssertionResult, CreationOptions, CredentialResult, RequestOptions};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

pub mod ceremony;
pub mod encode;
pub mod error;
pub mod rp;
pub mod soft;
pub mod types;

pub mod prelude {
    //! Types most callers need.
    pub use crate::ceremony::{CancelHandle, Ceremony, CeremonyState};
    pub use crate::error::CeremonyError;
    pub use crate::rp::{RpClient, RpClientBuilder};
    pub use crate::types::CeremonyOutcome;
    pub use crate::{AuthenticatorBackend, BiometricAuthenticator};
    pub use url::Url;
}

/// The longest hardware wait we will configure, regardless of what the
/// server asks for.
pub const MAX_CEREMONY_TIMEOUT_MS: u32 = 60_000;

/// A platform public-key credential capability.
///
/// Implementations wrap whatever the hosting environment provides: a
/// browser credential manager, an OS API, or a software key for tests.
/// Both operations suspend until the user completes the interaction,
/// cancels it, or the caller's timeout elapses.
#[async_trait]
pub trait AuthenticatorBackend {
    /// Feature detection. When this returns false no ceremony may be
    /// attempted and no network traffic should be generated.
    fn is_supported(&self) -> bool;

    /// Create a new credential bound to the relying party and user in
    /// `options`. Requires user presence.
    async fn perform_register(
        &mut self,
        origin: Url,
        options: CreationOptions,
        timeout_ms: u32,
    ) -> Result<CredentialResult, CeremonyError>;

    /// Produce an assertion proving possession of an enrolled
    /// credential, constrained to `options.allow_credentials` when that
    /// list is non-empty.
    async fn perform_auth(
        &mut self,
        origin: Url,
        options: RequestOptions,
        timeout_ms: u32,
    ) -> Result<AssertionResult, CeremonyError>;
}

/// Wraps an [AuthenticatorBackend] with the client-side checks that must
/// happen before any authenticator is invoked: timeout clamping,
/// relying-party binding validation, and origin scheme rules.
pub struct BiometricAuthenticator<T>
where
    T: AuthenticatorBackend,
{
    backend: T,
}

impl<T> BiometricAuthenticator<T>
where
    T: AuthenticatorBackend,
{
    /// Wrap a backend.
    pub fn new(backend: T) -> Self {
        BiometricAuthenticator { backend }
    }

    /// Feature detection, forwarded from the backend.
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Drive credential creation, bounded by the clamped timeout.
    pub async fn do_registration(
        &mut self,
        origin: Url,
        options: CreationOptions,
    ) -> Result<CredentialResult, CeremonyError> {
        let timeout_ms = clamp_timeout(options.timeout);
        validate_rp_binding(&origin, &options.rp.id)?;

        match tokio::time::timeout(
            Duration::from_millis(timeout_ms.into()),
            self.backend.perform_register(origin, options, timeout_ms),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("registration ceremony timed out waiting for the authenticator");
                Err(CeremonyError::Timeout)
            }
        }
    }

    /// Drive assertion generation, bounded by the clamped timeout.
    pub async fn do_authentication(
        &mut self,
        origin: Url,
        options: RequestOptions,
    ) -> Result<AssertionResult, CeremonyError> {
        let timeout_ms = clamp_timeout(options.timeout);
        validate_rp_binding(&origin, &options.rp_id)?;

        match tokio::time::timeout(
            Duration::from_millis(timeout_ms.into()),
            self.backend.perform_auth(origin, options, timeout_ms),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("authentication ceremony timed out waiting for the authenticator");
                Err(CeremonyError::Timeout)
            }
        }
    }
}

fn clamp_timeout(requested: Option<u32>) -> u32 {
    requested
        .map(|t| t.min(MAX_CEREMONY_TIMEOUT_MS))
        .unwrap_or(MAX_CEREMONY_TIMEOUT_MS)
}

/// The relying party id is always server-supplied. It must still be a
/// registrable suffix of (or equal to) the origin's effective domain,
/// and the origin must be https unless it is localhost.
fn validate_rp_binding(origin: &Url, rp_id: &str) -> Result<(), CeremonyError> {
    let effective_domain = match origin.domain() {
        Some(d) => d,
        None => {
            error!("origin has no domain (ip address only?)");
            return Err(CeremonyError::SecurityViolation);
        }
    };

    trace!(%effective_domain, %rp_id, "validating relying party binding");

    if !(effective_domain == rp_id || effective_domain.ends_with(&format!(".{}", rp_id))) {
        error!("relying party id is not a registrable suffix of the origin domain");
        return Err(CeremonyError::SecurityViolation);
    }

    if !(effective_domain == "localhost" || origin.scheme() == "https") {
        error!("insecure origin; must be localhost or served over https");
        return Err(CeremonyError::SecurityViolation);
    }

    Ok(())
}
