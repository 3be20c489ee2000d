use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use super::domain::{Claims, Subject};
use super::errors::AuthError;

/// Verifies an opaque bearer artifact and yields the caller's subject id.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Subject, AuthError>;
}

/// HS256 JWT verifier keyed by the shared token secret.
#[derive(Clone)]
pub struct JwtCredentialVerifier {
    secret: String,
}

impl JwtCredentialVerifier {
    pub fn new(secret: impl Into<String>) -> Self { Self { secret: secret.into() } }

    /// Mint a token for `subject` valid for `ttl`.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{CredentialVerifier, JwtCredentialVerifier};
    /// let v = JwtCredentialVerifier::new("secret");
    /// let token = v.issue("operator-1", std::time::Duration::from_secs(60)).unwrap();
    /// assert_eq!(v.verify(&token).unwrap().as_str(), "operator-1");
    /// ```
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        if self.secret.is_empty() { return Err(AuthError::NotConfigured); }
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            user_id: Some(subject.to_string()),
            sub: None,
            exp: now + ttl.as_secs() as usize,
            iat: Some(now),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| AuthError::Invalid(e.to_string()))
    }
}

impl CredentialVerifier for JwtCredentialVerifier {
    fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        if self.secret.is_empty() { return Err(AuthError::NotConfigured); }
        let token = token.trim();
        if token.is_empty() { return Err(AuthError::Missing); }

        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            debug!(err = %e, "token validation failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;
        data.claims
            .subject()
            .map(|s| Subject(s.to_string()))
            .ok_or_else(|| AuthError::Invalid("token carries no subject".into()))
    }
}

/// Fixed-token verifier for tests and doc examples
pub mod mock {
    use super::*;

    pub struct StaticVerifier {
        pub token: String,
        pub subject: String,
    }

    impl StaticVerifier {
        pub fn new(token: &str, subject: &str) -> Self {
            Self { token: token.into(), subject: subject.into() }
        }
    }

    impl CredentialVerifier for StaticVerifier {
        fn verify(&self, token: &str) -> Result<Subject, AuthError> {
            if token.is_empty() { return Err(AuthError::Missing); }
            if token == self.token { Ok(Subject(self.subject.clone())) } else { Err(AuthError::Invalid("unknown token".into())) }
        }
    }
}
