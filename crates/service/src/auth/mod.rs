//! Credential verification: opaque bearer token in, subject id out.
//!
//! Issuing tokens (login) happens elsewhere; this module only checks them.

pub mod domain;
pub mod errors;
pub mod verifier;

pub use verifier::{CredentialVerifier, JwtCredentialVerifier};
