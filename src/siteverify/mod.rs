// Remote verification collaborator — trait-based abstraction over the
// reCAPTCHA siteverify protocol.
//
// VerifyEndpoint defines the interface. SiteverifyClient implements it
// over HTTPS with reqwest; tests substitute recording doubles so the
// decision logic is exercised without any network.

pub mod client;
pub mod traits;
