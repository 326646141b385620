// Formguard: reCAPTCHA v3 token verification for form submissions.
//
// This is the library root. The hosting application loads a Config once
// at startup, builds a TokenVerifier from it, and runs every submitted
// form token through the validation surface in `validate`.

pub mod config;
pub mod siteverify;
pub mod validate;
pub mod verifier;
