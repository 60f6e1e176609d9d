//! The relying-party HTTP client.
//!
//! One consistent endpoint set replaces the drifting paths of earlier
//! clients:
//!
//! - `POST biometric/enroll/start` / `POST biometric/enroll/complete`
//! - `POST biometric/authenticate/start` / `POST biometric/authenticate/complete`
//! - `GET/PUT/DELETE biometric/credentials[/:id]`
//! - `POST face/enroll` / `POST face/verify`
//!
//! Nothing here retries. A failed verification submission means the
//! ceremony's challenge is spent; the caller restarts from options-fetch
//! or gives up.

use crate::error::CeremonyError;
use crate::types::{CreationOptions, RequestOptions};
use attendkey_proto::{
    ApiErrorBody, AssertionChallenge, AuthCompleteRequest, AuthStartRequest, CredentialList,
    EnrollCompleteRequest, EnrollCompleteResponse, EnrollStartRequest, EnrolledCredential,
    EnrollmentChallenge, FaceEnrollRequest, FaceEnrollResponse, FaceVerifyRequest,
    FaceVerifyResponse, RenameCredentialRequest, SessionGrant, VerifyFailureReason,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Constructs an [RpClient]. Configuration that applies to every request
/// of the attendance API lives here.
#[derive(Debug)]
pub struct RpClientBuilder {
    base_url: Url,
    bearer_token: Option<String>,
    request_timeout: Duration,
}

impl RpClientBuilder {
    /// Start a builder for the API rooted at `base_url`.
    pub fn new(base_url: Url) -> Self {
        RpClientBuilder {
            base_url,
            bearer_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Authenticate requests with a bearer token. Required for
    /// enrollment and credential management, absent for login.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Override the per-request network timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<RpClient, CeremonyError> {
        let mut base_url = self.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(CeremonyError::Network)?;

        Ok(RpClient {
            http,
            base_url,
            bearer_token: self.bearer_token,
        })
    }
}

/// The attendance relying-party API client: the options fetcher and the
/// verification submitter of the ceremony flow, plus the surrounding
/// credential-management and face endpoints.
#[derive(Debug, Clone)]
pub struct RpClient {
    http: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl RpClient {
    /// Fetch and decode registration options for a new credential named
    /// `credential_name`. Fails with [CeremonyError::OptionsUnavailable]
    /// when the server declines or answers without a usable challenge or
    /// user id.
    pub async fn enroll_start(
        &self,
        credential_name: &str,
    ) -> Result<CreationOptions, CeremonyError> {
        debug!(credential_name, "requesting enrollment options");
        let wire: EnrollmentChallenge = self
            .post_options(
                "biometric/enroll/start",
                &EnrollStartRequest {
                    credential_name: credential_name.to_string(),
                },
            )
            .await?;
        CreationOptions::try_from(wire)
    }

    /// Submit an encoded registration result together with the verbatim
    /// challenge it answers.
    pub async fn enroll_complete(
        &self,
        request: &EnrollCompleteRequest,
    ) -> Result<EnrollCompleteResponse, CeremonyError> {
        debug!("submitting enrollment result for verification");
        self.post_verify("biometric/enroll/complete", request).await
    }

    /// Fetch and decode authentication options for `email`.
    pub async fn auth_start(&self, email: &str) -> Result<RequestOptions, CeremonyError> {
        debug!(email, "requesting authentication options");
        let wire: AssertionChallenge = self
            .post_options(
                "biometric/authenticate/start",
                &AuthStartRequest {
                    email: email.to_string(),
                },
            )
            .await?;
        RequestOptions::try_from(wire)
    }

    /// Submit an encoded assertion together with the verbatim challenge
    /// it answers. Success grants a session.
    pub async fn auth_complete(
        &self,
        request: &AuthCompleteRequest,
    ) -> Result<SessionGrant, CeremonyError> {
        debug!("submitting assertion for verification");
        self.post_verify("biometric/authenticate/complete", request)
            .await
    }

    /// List the caller's enrolled credentials.
    pub async fn credentials(&self) -> Result<Vec<EnrolledCredential>, CeremonyError> {
        let url = self.endpoint("biometric/credentials")?;
        let response = self
            .with_auth(self.http.get(url))
            .send()
            .await
            .map_err(CeremonyError::Network)?;
        let list: CredentialList = Self::read_managed(response).await?;
        Ok(list.credentials)
    }

    /// Rename an enrolled credential.
    pub async fn rename_credential(&self, id: &str, name: &str) -> Result<(), CeremonyError> {
        let url = self.endpoint(&format!("biometric/credentials/{}", id))?;
        let response = self
            .with_auth(self.http.put(url))
            .json(&RenameCredentialRequest {
                name: name.to_string(),
            })
            .send()
            .await
            .map_err(CeremonyError::Network)?;
        Self::read_managed_empty(response).await
    }

    /// Delete an enrolled credential.
    pub async fn delete_credential(&self, id: &str) -> Result<(), CeremonyError> {
        let url = self.endpoint(&format!("biometric/credentials/{}", id))?;
        let response = self
            .with_auth(self.http.delete(url))
            .send()
            .await
            .map_err(CeremonyError::Network)?;
        Self::read_managed_empty(response).await
    }

    /// Store a face descriptor for the signed-in account.
    pub async fn enroll_face(
        &self,
        request: &FaceEnrollRequest,
    ) -> Result<FaceEnrollResponse, CeremonyError> {
        let url = self.endpoint("face/enroll")?;
        let response = self
            .with_auth(self.http.post(url))
            .json(request)
            .send()
            .await
            .map_err(CeremonyError::Network)?;
        Self::read_managed(response).await
    }

    /// Compare a face descriptor against the enrolled one.
    pub async fn verify_face(
        &self,
        request: &FaceVerifyRequest,
    ) -> Result<FaceVerifyResponse, CeremonyError> {
        let url = self.endpoint("face/verify")?;
        let response = self
            .with_auth(self.http.post(url))
            .json(request)
            .send()
            .await
            .map_err(CeremonyError::Network)?;
        Self::read_managed(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, CeremonyError> {
        self.base_url
            .join(path)
            .map_err(|e| CeremonyError::Internal(format!("invalid endpoint {}: {}", path, e)))
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// POST to an options endpoint. Any failure, transport or declared,
    /// collapses into [CeremonyError::OptionsUnavailable]: the ceremony
    /// cannot start, and the user may simply try again.
    async fn post_options<B, R>(&self, path: &str, body: &B) -> Result<R, CeremonyError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .with_auth(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("options request failed to send: {}", e);
                CeremonyError::OptionsUnavailable {
                    reason: "the server could not be reached".to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = Self::declined_reason(response).await;
            warn!(%status, %reason, "server declined to issue ceremony options");
            return Err(CeremonyError::OptionsUnavailable { reason });
        }

        response
            .json::<R>()
            .await
            .map_err(|_| CeremonyError::OptionsUnavailable {
                reason: "the server answered with a malformed options document".to_string(),
            })
    }

    /// POST to a verification endpoint. Client-error statuses carry a
    /// server-declared reason; anything else is a transport problem.
    async fn post_verify<B, R>(&self, path: &str, body: &B) -> Result<R, CeremonyError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .with_auth(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(CeremonyError::Network)?;

        let status = response.status();
        if status.is_client_error() {
            let body = Self::declined_body(response).await;
            let reason = body.code.unwrap_or(VerifyFailureReason::Unspecified);
            warn!(%status, %reason, "server rejected the ceremony result");
            return Err(CeremonyError::Verification(reason));
        }

        match response.error_for_status() {
            Ok(response) => response.json::<R>().await.map_err(CeremonyError::Network),
            Err(e) => Err(CeremonyError::Network(e)),
        }
    }

    async fn read_managed<R>(response: reqwest::Response) -> Result<R, CeremonyError>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let reason = Self::declined_reason(response).await;
            return Err(CeremonyError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }
        response.json::<R>().await.map_err(CeremonyError::Network)
    }

    async fn read_managed_empty(response: reqwest::Response) -> Result<(), CeremonyError> {
        let status = response.status();
        if !status.is_success() {
            let reason = Self::declined_reason(response).await;
            return Err(CeremonyError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }
        Ok(())
    }

    async fn declined_body(response: reqwest::Response) -> ApiErrorBody {
        let status = response.status();
        response.json::<ApiErrorBody>().await.unwrap_or(ApiErrorBody {
            error: format!("server returned status {}", status),
            code: None,
        })
    }

    async fn declined_reason(response: reqwest::Response) -> String {
        Self::declined_body(response).await.error
    }
}
