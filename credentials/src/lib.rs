//! Credential primitives library
//!
//! Provides the reusable building blocks for session handling:
//! - Password hashing (Argon2id)
//! - Signed access-token issuance and verification (JWT)
//! - Opaque token generation for refresh and reset tokens
//!
//! Services compose these primitives behind their own domain ports. Keeping
//! them here avoids coupling services through shared domain logic while
//! reducing code duplication.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use credentials::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Access Tokens
//! ```
//! use chrono::Duration;
//! use credentials::AccessTokenIssuer;
//!
//! let issuer = AccessTokenIssuer::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     Duration::minutes(60),
//! );
//! let token = issuer.issue("ann@example.com").unwrap();
//! let claims = issuer.verify(&token).unwrap();
//! assert_eq!(claims.sub, "ann@example.com");
//! ```
//!
//! ## Opaque Tokens
//! ```
//! use credentials::opaque;
//!
//! let token = opaque::generate_token();
//! assert_eq!(token.len(), opaque::OPAQUE_TOKEN_LENGTH);
//! assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
//! ```

pub mod access;
pub mod opaque;
pub mod password;

// Re-export commonly used items
pub use access::AccessClaims;
pub use access::AccessTokenError;
pub use access::AccessTokenIssuer;
pub use password::PasswordError;
pub use password::PasswordHasher;
