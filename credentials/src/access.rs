use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Error type for access-token operations.
#[derive(Debug, Clone, Error)]
pub enum AccessTokenError {
    #[error("Failed to encode access token: {0}")]
    EncodingFailed(String),

    #[error("Access token is expired")]
    Expired,

    #[error("Access token is invalid: {0}")]
    Invalid(String),
}

/// Claims carried by an access token.
///
/// The subject identifies the authenticated principal; `iat`/`exp` bound the
/// token's lifetime (Unix timestamps).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies short-lived signed bearer tokens.
///
/// Uses HS256 (HMAC with SHA-256). Tokens are never persisted; possession of
/// a token with a valid signature and unexpired `exp` proves identity.
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl AccessTokenIssuer {
    /// Create a new issuer from a shared secret.
    ///
    /// # Arguments
    /// * `secret` - Signing key (at least 256 bits for HS256; keep it out of source control)
    /// * `ttl` - Lifetime stamped into every issued token
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            ttl,
        }
    }

    /// Issue a signed token for a subject.
    ///
    /// # Arguments
    /// * `subject` - Principal identifier embedded as the `sub` claim
    ///
    /// # Returns
    /// Signed JWT string with `iat` = now and `exp` = now + ttl
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(&self, subject: &str) -> Result<String, AccessTokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AccessTokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Arguments
    /// * `token` - JWT string to verify
    ///
    /// # Returns
    /// Decoded claims
    ///
    /// # Errors
    /// * `Expired` - Token signature is valid but `exp` has passed
    /// * `Invalid` - Signature mismatch or malformed token
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AccessTokenError> {
        let mut validation = Validation::new(self.algorithm);
        // No clock drift allowance: expiry is exact
        validation.leeway = 0;

        let token_data =
            decode::<AccessClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AccessTokenError::Expired,
                    _ => AccessTokenError::Invalid(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Lifetime stamped into issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
