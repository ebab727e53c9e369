//! Signed, time-bounded bearer tokens.
//!
//! Tokens are HS256 JWTs: a keyed MAC over the canonicalized claims rather
//! than a server-side session record, so verification is stateless and a
//! token is a capability, not a reference. The signing key is process-wide
//! read-only state, initialized once at startup.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::TokenConfig;
use crate::context::SecurityContext;
use crate::error::AuthError;

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal identifier
    pub sub: String,
    /// Roles granted at issuance, carried verbatim
    pub roles: Vec<String>,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

/// Issues and verifies signed tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    /// Create the service. Fails when the signing secret is absent; that is
    /// fatal to process initialization, not recoverable per-request.
    pub fn new(config: &TokenConfig) -> Result<Self, AuthError> {
        if config.secret.is_empty() {
            return Err(AuthError::ConfigurationError(
                "token signing secret is not configured".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the default leeway would accept freshly expired
        // tokens.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            default_ttl: Duration::seconds(config.ttl_secs),
        })
    }

    /// The configured time-to-live for newly issued tokens.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a signed token for `principal` with the given roles and ttl.
    pub fn issue(
        &self,
        principal: &str,
        roles: Vec<String>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.to_string(),
            roles,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ConfigurationError(e.to_string()))
    }

    /// Verify a token and build the per-request [`SecurityContext`].
    ///
    /// Any integrity mismatch rejects with [`AuthError::BadSignature`]; a
    /// structurally valid, correctly signed token past its expiry rejects
    /// with [`AuthError::Expired`]. Signature validity is established
    /// before expiry is considered.
    pub fn verify(&self, token: &str) -> Result<SecurityContext, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::BadSignature,
            }
        })?;

        Ok(SecurityContext::authenticated(
            data.claims.sub,
            data.claims.roles,
        ))
    }
}
