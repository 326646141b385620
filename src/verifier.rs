// Token verifier — the pass/fail decision.
//
// Thin layer over the siteverify collaborator: bypass when disabled,
// one remote call otherwise, and fail closed on anything that goes
// wrong. The caller hands over the client IP explicitly; there is no
// ambient request context to reach into.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error};

use crate::config::Config;
use crate::siteverify::client::SiteverifyClient;
use crate::siteverify::traits::{VerificationRequest, VerifyEndpoint};

/// Action label sent with every verification request. v3 tokens carry
/// the action the client declared when the challenge ran; verification
/// fails if it differs.
pub const EXPECTED_ACTION: &str = "form";

/// Decides whether a submitted token proves a human was involved.
///
/// Holds no mutable state — a single instance can be shared across
/// concurrent validations without locking.
pub struct TokenVerifier {
    enabled: bool,
    score_threshold: f64,
    endpoint: Arc<dyn VerifyEndpoint>,
}

impl TokenVerifier {
    /// Build a verifier with an injected endpoint — tests and alternate
    /// transports go through here.
    pub fn new(config: &Config, endpoint: Arc<dyn VerifyEndpoint>) -> Self {
        Self {
            enabled: config.enabled,
            score_threshold: config.score_threshold,
            endpoint,
        }
    }

    /// Build a verifier that talks to the real siteverify API.
    pub fn from_config(config: &Config) -> Result<Self> {
        let endpoint = SiteverifyClient::new(config.secret_key.clone())?;
        Ok(Self::new(config, Arc::new(endpoint)))
    }

    /// Whether verification is active. When false, every token passes
    /// and no remote call is ever made.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Verify one token. A single best-effort attempt: no retries, no
    /// owned timeout (the HTTP client's defaults apply).
    ///
    /// Never returns an error and never panics — any failure during the
    /// remote call is logged with full detail and mapped to `false`.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
        if !self.enabled {
            return true;
        }

        let request = VerificationRequest {
            token: token.to_string(),
            remote_ip: remote_ip.map(str::to_string),
            expected_action: EXPECTED_ACTION.to_string(),
            score_threshold: self.score_threshold,
        };

        match self.endpoint.siteverify(&request).await {
            Ok(result) => {
                if !result.success {
                    // Expected outcome, not a fault — keep it below error level.
                    debug!(
                        error_codes = ?result.error_codes,
                        score = ?result.score,
                        "reCAPTCHA rejected token"
                    );
                }
                result.success
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "reCAPTCHA verification error");
                false
            }
        }
    }
}
