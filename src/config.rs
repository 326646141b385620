use std::env;

use anyhow::{Context, Result};

/// Score threshold used when RECAPTCHA_SCORE_THRESHOLD is unset.
/// 0.5 is Google's recommended starting point for v3.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically via dotenvy. Loaded once at startup and
/// immutable afterwards — there is no runtime reconfiguration.
#[derive(Debug)]
pub struct Config {
    /// Master switch. When false the verifier bypasses the remote call
    /// and accepts every token (useful in dev and test environments).
    pub enabled: bool,
    /// Server-side reCAPTCHA secret key.
    pub secret_key: String,
    /// Minimum trust score (0.0–1.0) a token must reach. Applied
    /// identically to every request; no per-request override.
    pub score_threshold: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Verification is on unless RECAPTCHA_ENABLED is explicitly set to
    /// "false" or "0". The score threshold must parse and lie within
    /// 0.0–1.0 — an out-of-range value is a deployment mistake we'd
    /// rather catch at startup than have the remote service reject on
    /// every call.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let enabled = !matches!(
            env::var("RECAPTCHA_ENABLED").as_deref(),
            Ok("false") | Ok("0")
        );

        let score_threshold = match env::var("RECAPTCHA_SCORE_THRESHOLD") {
            Ok(raw) => raw
                .parse::<f64>()
                .with_context(|| format!("RECAPTCHA_SCORE_THRESHOLD is not a number: {raw:?}"))?,
            Err(_) => DEFAULT_SCORE_THRESHOLD,
        };
        if !(0.0..=1.0).contains(&score_threshold) {
            anyhow::bail!("RECAPTCHA_SCORE_THRESHOLD must be within 0.0–1.0, got {score_threshold}");
        }

        Ok(Self {
            enabled,
            secret_key: env::var("RECAPTCHA_SECRET_KEY").unwrap_or_default(),
            score_threshold,
        })
    }

    /// Check that the secret key is configured.
    /// Call this before building a verifier that talks to the real API;
    /// bypass mode (enabled=false) never needs a key.
    pub fn require_secret(&self) -> Result<()> {
        if self.secret_key.is_empty() {
            anyhow::bail!(
                "RECAPTCHA_SECRET_KEY not set. Add it to your .env file, \
                 or set RECAPTCHA_ENABLED=false to disable verification."
            );
        }
        Ok(())
    }
}
