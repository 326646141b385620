// Verification endpoint trait — the swap-ready abstraction.
//
// The remote call returns an explicit Result instead of signaling
// failure through exceptions: transport problems surface as Err, a
// rejected token is an Ok response with success=false and error codes.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// One verification attempt: the client-supplied token plus everything
/// the endpoint needs to judge it. Built fresh per call, never persisted.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// Opaque token produced by the client-side challenge. May be empty,
    /// in which case verification fails without a round trip.
    pub token: String,
    /// The submitter's best-known network address, when the hosting
    /// application could determine one.
    pub remote_ip: Option<String>,
    /// Action label the client declared when the challenge ran.
    pub expected_action: String,
    /// Minimum acceptable trust score, 0.0–1.0.
    pub score_threshold: f64,
}

/// The siteverify response body, plus the outcome of the client-side
/// expectation checks. `success` is the single pass/fail answer; the
/// remaining fields exist for diagnostics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationResult {
    #[serde(default)]
    pub success: bool,
    /// Trust score 0.0–1.0. Only v3 tokens carry one.
    pub score: Option<f64>,
    /// Action the token was generated for, as reported by the API.
    pub action: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
    /// Hostname of the site the challenge ran on.
    pub hostname: Option<String>,
    /// Challenge timestamp (ISO 8601).
    pub challenge_ts: Option<String>,
}

/// Trait for issuing a single token-verification call. Implementations
/// must be async because the real endpoint is an HTTPS API.
#[async_trait]
pub trait VerifyEndpoint: Send + Sync {
    /// Verify one token. Err means the call itself failed (network,
    /// malformed response); a rejected token is Ok with success=false.
    async fn siteverify(&self, request: &VerificationRequest) -> Result<VerificationResult>;
}
