use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::user::models::EmailAddress;
use crate::user::models::User;
use crate::user::models::UserId;

/// Refresh token unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTokenId(pub Uuid);

impl RefreshTokenId {
    /// Generate a new random refresh token ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RefreshTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Renewable session credential.
///
/// Created on login; the token value and expiry are rotated in place on
/// refresh; marked revoked on logout or password reset; deleted by cleanup
/// once expired. A token is valid iff it is neither expired nor revoked.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the expiry timestamp has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the token is still usable (not expired, not revoked).
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now)
    }
}

/// Reset token unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResetTokenId(pub Uuid);

impl ResetTokenId {
    /// Generate a new random reset token ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ResetTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResetTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One-time password-change authorization.
///
/// Created on reset request, and only after the reset mail was reported
/// sent. Consumed on successful reset; superseded tokens are marked used
/// when a new one is issued for the same user.
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: ResetTokenId,
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Whether the expiry timestamp has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the token can still authorize a password reset.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired(now)
    }
}

/// Denylisted access token.
///
/// Presence alone means rejection; entries are never updated.
#[derive(Debug, Clone)]
pub struct BlacklistedToken {
    pub id: Uuid,
    pub token: String,
    pub blacklisted_at: DateTime<Utc>,
}

impl BlacklistedToken {
    /// Record an access token as blacklisted from now on.
    pub fn new(token: String, blacklisted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            token,
            blacklisted_at,
        }
    }
}

/// Caller identity established by the request-authentication layer.
///
/// Produced after verifying a non-blacklisted, signature-valid access token
/// and passed explicitly into operations that need to know who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub email: EmailAddress,
}

impl Principal {
    pub fn new(email: EmailAddress) -> Self {
        Self { email }
    }
}

/// Access/refresh token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Successful login result: the user plus a fresh token pair.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub tokens: SessionTokens,
}

/// Command to authenticate with email and password
#[derive(Debug)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl LoginCommand {
    pub fn new(email: EmailAddress, password: String) -> Self {
        Self { email, password }
    }
}

/// Command to change the password of an authenticated caller
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}

/// Command to set a new password using a reset token
#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: String,
}

/// Tunable limits and lifetimes applied by the session service.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub refresh_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub max_active_refresh_tokens: i64,
    pub max_reset_requests_per_hour: i64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            refresh_token_ttl: Duration::days(7),
            reset_token_ttl: Duration::hours(1),
            max_active_refresh_tokens: 5,
            max_reset_requests_per_hour: 3,
        }
    }
}
