// Validation surface — the constraint as plain types.
//
// The hosting application's form layer hands over whatever JSON value
// the client submitted. Null and absent values normalize to an empty
// token (which then fails verification); any other non-string value is
// a contract violation by the caller, raised before a remote call is
// attempted. A failed verification becomes a Violation whose message is
// safe to show to the end user — internal error detail never leaks
// into it.

use serde_json::Value;
use thiserror::Error;

use crate::verifier::TokenVerifier;

/// Default violation template; `{{ string }}` is replaced with the
/// submitted value.
pub const DEFAULT_MESSAGE: &str = "The reCAPTCHA token \"{{ string }}\" is invalid.";

/// The tunable part of the rule: the message shown when a token is
/// rejected.
#[derive(Debug, Clone)]
pub struct RecaptchaConstraint {
    pub message: String,
}

impl Default for RecaptchaConstraint {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

/// A failed validation, ready to surface to the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
}

/// The caller handed the validator a value that is neither a string nor
/// null. This is a programming error in the hosting application,
/// distinct from a token failing verification.
#[derive(Debug, Error)]
#[error("expected a string or null form value, got {actual}")]
pub struct UnexpectedTypeError {
    pub actual: &'static str,
}

/// Runs submitted form values through the verifier and turns rejections
/// into violations.
pub struct RecaptchaValidator {
    verifier: TokenVerifier,
    constraint: RecaptchaConstraint,
}

impl RecaptchaValidator {
    pub fn new(verifier: TokenVerifier, constraint: RecaptchaConstraint) -> Self {
        Self {
            verifier,
            constraint,
        }
    }

    /// Validate one submitted value against the verifier, returning a
    /// violation when the token is rejected.
    ///
    /// The disabled bypass comes first: with verification off, even a
    /// malformed value passes untouched. Type checking happens before
    /// any remote call.
    pub async fn validate(
        &self,
        value: Option<&Value>,
        remote_ip: Option<&str>,
    ) -> Result<Option<Violation>, UnexpectedTypeError> {
        if !self.verifier.enabled() {
            return Ok(None);
        }

        let token = match value {
            None | Some(Value::Null) => "",
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(UnexpectedTypeError {
                    actual: json_type_name(other),
                })
            }
        };

        if self.verifier.verify(token, remote_ip).await {
            Ok(None)
        } else {
            Ok(Some(Violation {
                message: self.constraint.message.replace("{{ string }}", token),
            }))
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
