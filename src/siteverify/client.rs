// reCAPTCHA siteverify client.
//
// The API takes a form-encoded POST of {secret, response, remoteip} and
// answers with a JSON body. The body reports what the API observed
// (success, score, action); comparing those against the caller's
// expectations is this client's job, mirroring the official server-side
// libraries — mismatches flip success to false and append an error code.
//
// API docs: https://developers.google.com/recaptcha/docs/verify

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::traits::{VerificationRequest, VerificationResult, VerifyEndpoint};

/// Production verification endpoint.
pub const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Error code for an empty token, matching what the API itself returns.
pub const E_MISSING_INPUT_RESPONSE: &str = "missing-input-response";
/// Error code appended when the token's action differs from the expected one.
pub const E_ACTION_MISMATCH: &str = "action-mismatch";
/// Error code appended when the score falls below the threshold.
pub const E_SCORE_THRESHOLD_NOT_MET: &str = "score-threshold-not-met";

/// HTTPS implementation of VerifyEndpoint.
pub struct SiteverifyClient {
    client: Client,
    secret_key: String,
    url: String,
}

impl SiteverifyClient {
    /// Create a client pointing at the production siteverify endpoint.
    pub fn new(secret_key: String) -> Result<Self> {
        Self::with_url(secret_key, SITEVERIFY_URL)
    }

    /// Create a client pointing at a different endpoint URL — for tests
    /// or proxied deployments.
    pub fn with_url(secret_key: String, url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("formguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            secret_key,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl VerifyEndpoint for SiteverifyClient {
    async fn siteverify(&self, request: &VerificationRequest) -> Result<VerificationResult> {
        // The API rejects an empty token anyway; skip the round trip.
        if request.token.is_empty() {
            return Ok(VerificationResult {
                error_codes: vec![E_MISSING_INPUT_RESPONSE.to_string()],
                ..VerificationResult::default()
            });
        }

        let mut params = vec![
            ("secret", self.secret_key.as_str()),
            ("response", request.token.as_str()),
        ];
        if let Some(ip) = request.remote_ip.as_deref() {
            params.push(("remoteip", ip));
        }

        debug!(action = %request.expected_action, "siteverify request");

        let response = self
            .client
            .post(&self.url)
            .form(&params)
            .send()
            .await
            .context("Failed to call reCAPTCHA siteverify")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("siteverify returned {status}: {body}");
        }

        let mut result: VerificationResult = response
            .json()
            .await
            .context("Failed to parse siteverify response")?;

        enforce_expectations(&mut result, request);
        Ok(result)
    }
}

/// Apply the caller's expectations to a decoded response. The API only
/// reports the action and score it saw; whether they are acceptable is
/// decided here.
fn enforce_expectations(result: &mut VerificationResult, request: &VerificationRequest) {
    if result.action.as_deref() != Some(request.expected_action.as_str()) {
        result.success = false;
        result.error_codes.push(E_ACTION_MISMATCH.to_string());
    }
    // A response with no score at all cannot meet a positive threshold.
    if result.score.unwrap_or(0.0) < request.score_threshold {
        result.success = false;
        result.error_codes.push(E_SCORE_THRESHOLD_NOT_MET.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one canned HTTP response on an ephemeral local
    /// port, handing back the raw request bytes for inspection.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            buf.truncate(n);
            let response = format!(
                "HTTP/1.1 {status_line}\r\n\
                 content-type: application/json\r\n\
                 content-length: {}\r\n\
                 connection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            let _ = tx.send(buf);
        });
        (format!("http://{addr}"), rx)
    }

    fn request(token: &str, threshold: f64) -> VerificationRequest {
        VerificationRequest {
            token: token.to_string(),
            remote_ip: Some("203.0.113.9".to_string()),
            expected_action: "form".to_string(),
            score_threshold: threshold,
        }
    }

    #[test]
    fn decodes_full_siteverify_body() {
        let body = r#"{
            "success": true,
            "score": 0.9,
            "action": "form",
            "challenge_ts": "2026-08-30T12:00:00Z",
            "hostname": "example.com"
        }"#;
        let result: VerificationResult = serde_json::from_str(body).unwrap();
        assert!(result.success);
        assert_eq!(result.score, Some(0.9));
        assert_eq!(result.action.as_deref(), Some("form"));
        assert_eq!(result.hostname.as_deref(), Some("example.com"));
        assert!(result.error_codes.is_empty());
    }

    #[test]
    fn decodes_hyphenated_error_codes_key() {
        let body = r#"{"success": false, "error-codes": ["invalid-input-secret"]}"#;
        let result: VerificationResult = serde_json::from_str(body).unwrap();
        assert!(!result.success);
        assert_eq!(result.error_codes, vec!["invalid-input-secret".to_string()]);
        assert_eq!(result.score, None);
    }

    #[test]
    fn expectations_pass_on_matching_action_and_score() {
        let mut result = VerificationResult {
            success: true,
            score: Some(0.9),
            action: Some("form".to_string()),
            ..VerificationResult::default()
        };
        enforce_expectations(&mut result, &request("tok", 0.5));
        assert!(result.success);
        assert!(result.error_codes.is_empty());
    }

    #[test]
    fn action_mismatch_flips_success() {
        let mut result = VerificationResult {
            success: true,
            score: Some(0.9),
            action: Some("login".to_string()),
            ..VerificationResult::default()
        };
        enforce_expectations(&mut result, &request("tok", 0.5));
        assert!(!result.success);
        assert_eq!(result.error_codes, vec![E_ACTION_MISMATCH.to_string()]);
    }

    #[test]
    fn low_score_flips_success() {
        let mut result = VerificationResult {
            success: true,
            score: Some(0.1),
            action: Some("form".to_string()),
            ..VerificationResult::default()
        };
        enforce_expectations(&mut result, &request("tok", 0.5));
        assert!(!result.success);
        assert_eq!(result.error_codes, vec![E_SCORE_THRESHOLD_NOT_MET.to_string()]);
    }

    #[test]
    fn missing_score_fails_a_positive_threshold() {
        let mut result = VerificationResult {
            success: true,
            score: None,
            action: Some("form".to_string()),
            ..VerificationResult::default()
        };
        enforce_expectations(&mut result, &request("tok", 0.5));
        assert!(!result.success);
    }

    #[test]
    fn boundary_score_meets_threshold() {
        let mut result = VerificationResult {
            success: true,
            score: Some(0.5),
            action: Some("form".to_string()),
            ..VerificationResult::default()
        };
        enforce_expectations(&mut result, &request("tok", 0.5));
        assert!(result.success);
    }

    #[tokio::test]
    async fn non_2xx_status_is_an_error() {
        let (url, _rx) = one_shot_server("500 Internal Server Error", "upstream broke").await;
        let client = SiteverifyClient::with_url("secret".to_string(), &url).unwrap();

        let err = client.siteverify(&request("tok", 0.5)).await.unwrap_err();
        let detail = format!("{err:#}");
        assert!(
            detail.contains("siteverify returned 500"),
            "unexpected error: {detail}"
        );
        assert!(detail.contains("upstream broke"));
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let (url, _rx) = one_shot_server("200 OK", "not json").await;
        let client = SiteverifyClient::with_url("secret".to_string(), &url).unwrap();

        let err = client.siteverify(&request("tok", 0.5)).await.unwrap_err();
        assert!(
            format!("{err:#}").contains("Failed to parse siteverify response"),
            "unexpected error: {err:#}"
        );
    }

    #[tokio::test]
    async fn requests_identify_the_crate_version() {
        let (url, rx) = one_shot_server(
            "200 OK",
            r#"{"success": true, "score": 0.9, "action": "form"}"#,
        )
        .await;
        let client = SiteverifyClient::with_url("secret".to_string(), &url).unwrap();

        let result = client.siteverify(&request("tok", 0.5)).await.unwrap();
        assert!(result.success);

        let seen = String::from_utf8_lossy(&rx.await.unwrap()).to_string();
        let expected = format!("formguard/{}", env!("CARGO_PKG_VERSION"));
        assert!(
            seen.contains(&expected),
            "user agent missing from request: {seen}"
        );
    }

    #[tokio::test]
    async fn empty_token_fails_without_a_network_call() {
        // Unroutable port — any attempted request would error, not return Ok.
        let client = SiteverifyClient::with_url("secret".to_string(), "http://127.0.0.1:9").unwrap();
        let result = client.siteverify(&request("", 0.5)).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error_codes, vec![E_MISSING_INPUT_RESPONSE.to_string()]);
    }
}
