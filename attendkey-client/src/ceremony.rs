//! The ceremony state machine.
//!
//! Both ceremonies share one shape: fetch options, invoke the
//! authenticator, encode the result, submit it for verification. Each
//! stage is awaited sequentially; at most one attempt exists per
//! [Ceremony] at a time, and a cancelled attempt can never have its
//! stale result applied because every suspension point is guarded by a
//! per-attempt generation.

use crate::encode::{encode_assertion, encode_credential};
use crate::error::CeremonyError;
use crate::rp::RpClient;
use crate::types::CeremonyOutcome;
use crate::{AuthenticatorBackend, BiometricAuthenticator};
use attendkey_proto::{AuthCompleteRequest, EnrollCompleteRequest, VerifyFailureReason};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use url::Url;

/// Where a ceremony currently stands.
///
/// `Success`, `VerificationFailed` and `CeremonyFailed` are terminal:
/// they only give way to `Idle` through an explicit restart, which
/// re-fetches options. There is no implicit retry loop anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyState {
    /// Nothing in flight.
    Idle,
    /// Waiting for the server to issue ceremony options.
    OptionsRequested,
    /// Options received and decoded.
    OptionsReady,
    /// Waiting on the authenticator and the user.
    CeremonyInProgress,
    /// The authenticator produced a result.
    CeremonyComplete,
    /// Waiting for the server's verification verdict.
    Verifying,
    /// The server verified the result.
    Success,
    /// The server declined the result.
    VerificationFailed,
    /// The attempt failed before anything could be submitted.
    CeremonyFailed,
}

impl CeremonyState {
    /// True for the three states a finished attempt can rest in.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CeremonyState::Success
                | CeremonyState::VerificationFailed
                | CeremonyState::CeremonyFailed
        )
    }

    /// True while an attempt is between start and settlement.
    pub fn is_in_flight(self) -> bool {
        !matches!(self, CeremonyState::Idle) && !self.is_terminal()
    }
}

struct CancelInner {
    generation: AtomicU64,
    notify: Notify,
}

/// Cancels the in-flight ceremony attempt, if any. Cloneable and safe to
/// trigger from another task, e.g. a dialog-dismiss handler.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

impl CancelHandle {
    /// Cancel the current attempt. Later attempts are unaffected.
    pub fn cancel(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.notify.notify_waiters();
    }
}

/// Drives enrollment and authentication ceremonies against one relying
/// party with one authenticator backend.
pub struct Ceremony<T>
where
    T: AuthenticatorBackend,
{
    rp: RpClient,
    authenticator: BiometricAuthenticator<T>,
    origin: Url,
    state: CeremonyState,
    cancel: Arc<CancelInner>,
}

impl<T> Ceremony<T>
where
    T: AuthenticatorBackend + Send,
{
    /// Build a ceremony driver. `origin` is the web origin the client
    /// runs under; the server-supplied relying party id is validated
    /// against it on every attempt.
    pub fn new(rp: RpClient, backend: T, origin: Url) -> Self {
        Ceremony {
            rp,
            authenticator: BiometricAuthenticator::new(backend),
            origin,
            state: CeremonyState::Idle,
            cancel: Arc::new(CancelInner {
                generation: AtomicU64::new(0),
                notify: Notify::new(),
            }),
        }
    }

    /// The current state.
    pub fn state(&self) -> CeremonyState {
        self.state
    }

    /// A handle that cancels the in-flight attempt.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            inner: Arc::clone(&self.cancel),
        }
    }

    /// Return a terminal ceremony to `Idle` without starting a new one.
    pub fn reset(&mut self) {
        self.state = CeremonyState::Idle;
    }

    /// Run a full enrollment ceremony for a credential named
    /// `credential_name`.
    pub async fn enroll(
        &mut self,
        credential_name: &str,
    ) -> Result<CeremonyOutcome, CeremonyError> {
        self.begin();
        let generation = self.cancel.generation.load(Ordering::Acquire);
        let result = self.run_enroll(credential_name, generation).await;
        self.settle(&result);
        result
    }

    /// Run a full authentication ceremony for `email`.
    pub async fn authenticate(&mut self, email: &str) -> Result<CeremonyOutcome, CeremonyError> {
        self.begin();
        let generation = self.cancel.generation.load(Ordering::Acquire);
        let result = self.run_authenticate(email, generation).await;
        self.settle(&result);
        result
    }

    async fn run_enroll(
        &mut self,
        credential_name: &str,
        generation: u64,
    ) -> Result<CeremonyOutcome, CeremonyError> {
        if !self.authenticator.is_supported() {
            warn!("no public-key credential capability; refusing before any network call");
            return Err(CeremonyError::CapabilityUnsupported);
        }
        let cancel = Arc::clone(&self.cancel);

        self.state = CeremonyState::OptionsRequested;
        let options =
            with_cancel(&cancel, generation, self.rp.enroll_start(credential_name)).await?;
        self.state = CeremonyState::OptionsReady;

        let challenge_echo = options.challenge_echo.clone();
        self.state = CeremonyState::CeremonyInProgress;
        let created = with_cancel(
            &cancel,
            generation,
            self.authenticator
                .do_registration(self.origin.clone(), options),
        )
        .await?;
        self.state = CeremonyState::CeremonyComplete;

        let request = EnrollCompleteRequest {
            credential_name: credential_name.to_string(),
            challenge: challenge_echo,
            credential: encode_credential(&created),
        };
        self.state = CeremonyState::Verifying;
        let response = with_cancel(&cancel, generation, self.rp.enroll_complete(&request)).await?;

        if !response.verified {
            return Err(CeremonyError::Verification(VerifyFailureReason::Unspecified));
        }
        info!(credential = %response.credential.id, "credential enrolled");
        Ok(CeremonyOutcome::Enrolled(response.credential))
    }

    async fn run_authenticate(
        &mut self,
        email: &str,
        generation: u64,
    ) -> Result<CeremonyOutcome, CeremonyError> {
        if !self.authenticator.is_supported() {
            warn!("no public-key credential capability; refusing before any network call");
            return Err(CeremonyError::CapabilityUnsupported);
        }
        let cancel = Arc::clone(&self.cancel);

        self.state = CeremonyState::OptionsRequested;
        let options = with_cancel(&cancel, generation, self.rp.auth_start(email)).await?;
        self.state = CeremonyState::OptionsReady;

        let challenge_echo = options.challenge_echo.clone();
        self.state = CeremonyState::CeremonyInProgress;
        let asserted = with_cancel(
            &cancel,
            generation,
            self.authenticator
                .do_authentication(self.origin.clone(), options),
        )
        .await?;
        self.state = CeremonyState::CeremonyComplete;

        let request = AuthCompleteRequest {
            email: email.to_string(),
            challenge: challenge_echo,
            assertion: encode_assertion(&asserted),
        };
        self.state = CeremonyState::Verifying;
        let grant = with_cancel(&cancel, generation, self.rp.auth_complete(&request)).await?;

        info!(user = %grant.user.email, "authentication verified");
        Ok(CeremonyOutcome::Verified(grant))
    }

    /// Prepare for a fresh attempt. A previous attempt whose future was
    /// dropped mid-flight is implicitly cancelled here; true overlap is
    /// impossible because attempts hold `&mut self`.
    fn begin(&mut self) {
        if self.state.is_in_flight() {
            warn!(state = ?self.state, "abandoned ceremony attempt; cancelling it");
            self.cancel.generation.fetch_add(1, Ordering::AcqRel);
            self.cancel.notify.notify_waiters();
        }
        self.state = CeremonyState::Idle;
    }

    fn settle(&mut self, result: &Result<CeremonyOutcome, CeremonyError>) {
        self.state = match result {
            Ok(_) => CeremonyState::Success,
            // Cancellation is not an outcome; the machine rests.
            Err(CeremonyError::UserCancelled) => CeremonyState::Idle,
            Err(CeremonyError::Verification(_)) => CeremonyState::VerificationFailed,
            Err(_) => CeremonyState::CeremonyFailed,
        };
    }
}

/// Await `operation`, racing it against cancellation of this attempt.
/// A cancellation that lands while `operation` runs wins even if the
/// operation also completed: its result is discarded, never applied.
async fn with_cancel<F, O>(
    cancel: &CancelInner,
    generation: u64,
    operation: F,
) -> Result<O, CeremonyError>
where
    F: Future<Output = Result<O, CeremonyError>>,
{
    if cancel.generation.load(Ordering::Acquire) != generation {
        return Err(CeremonyError::UserCancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.notify.notified() => {
            trace!("attempt cancelled at a suspension point");
            Err(CeremonyError::UserCancelled)
        }
        outcome = operation => {
            if cancel.generation.load(Ordering::Acquire) != generation {
                trace!("attempt cancelled; discarding a stale stage result");
                Err(CeremonyError::UserCancelled)
            } else {
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CeremonyState;

    #[test]
    fn terminal_and_in_flight_are_disjoint() {
        let all = [
            CeremonyState::Idle,
            CeremonyState::OptionsRequested,
            CeremonyState::OptionsReady,
            CeremonyState::CeremonyInProgress,
            CeremonyState::CeremonyComplete,
            CeremonyState::Verifying,
            CeremonyState::Success,
            CeremonyState::VerificationFailed,
            CeremonyState::CeremonyFailed,
        ];
        for state in all {
            assert!(!(state.is_terminal() && state.is_in_flight()));
        }
        assert!(!CeremonyState::Idle.is_terminal());
        assert!(!CeremonyState::Idle.is_in_flight());
        assert!(CeremonyState::Verifying.is_in_flight());
        assert!(CeremonyState::Success.is_terminal());
    }
}
