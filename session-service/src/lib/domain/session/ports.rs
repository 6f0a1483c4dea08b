use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::models::AuthenticatedSession;
use crate::domain::session::models::BlacklistedToken;
use crate::domain::session::models::ChangePasswordCommand;
use crate::domain::session::models::LoginCommand;
use crate::domain::session::models::PasswordResetToken;
use crate::domain::session::models::Principal;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RefreshTokenId;
use crate::domain::session::models::ResetPasswordCommand;
use crate::domain::session::models::ResetTokenId;
use crate::domain::session::models::SessionTokens;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::session::errors::MailerError;
use crate::session::errors::SessionError;

/// Port for session domain service operations.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Register a new user account.
    ///
    /// # Arguments
    /// * `command` - Validated command containing name, email, and password
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `PasswordTooShort` / `PasswordTooLong` - Password length out of bounds
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterUserCommand) -> Result<User, SessionError>;

    /// Authenticate with email and password and open a session.
    ///
    /// Applies the per-user refresh-token limit before persisting the new
    /// refresh token.
    ///
    /// # Arguments
    /// * `command` - Email and plaintext password
    ///
    /// # Returns
    /// The user plus a fresh access/refresh token pair
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, SessionError>;

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// The stored record is rotated in place: its token value and expiry are
    /// overwritten, never duplicated into a new row.
    ///
    /// # Arguments
    /// * `refresh_token` - Opaque refresh token value
    ///
    /// # Returns
    /// New access token and new refresh token value
    ///
    /// # Errors
    /// * `InvalidToken` - No record with this value
    /// * `TokenExpired` - Record expired (deleted as a side effect)
    /// * `TokenRevoked` - Record was revoked
    /// * `DatabaseError` - Database operation failed
    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, SessionError>;

    /// Close a session.
    ///
    /// Blacklists the access token (idempotent) and revokes the refresh
    /// token. Blank or absent values are no-ops for their half of the
    /// operation.
    ///
    /// # Arguments
    /// * `refresh_token` - Opaque refresh token value, if the caller has one
    /// * `access_token` - Signed access token value, if the caller has one
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `NotFound` - Refresh token value does not exist
    /// * `DatabaseError` - Database operation failed
    async fn logout(
        &self,
        refresh_token: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<(), SessionError>;

    /// Whether an access token has been blacklisted.
    ///
    /// Consulted by the request-authentication layer on every authenticated
    /// request, in addition to signature and expiry checks.
    ///
    /// # Arguments
    /// * `access_token` - Signed access token value
    ///
    /// # Returns
    /// True if the token must be rejected
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn is_token_blacklisted(&self, access_token: &str) -> Result<bool, SessionError>;

    /// Change the password of an authenticated caller.
    ///
    /// Existing refresh tokens stay valid.
    ///
    /// # Arguments
    /// * `principal` - Caller identity established by the request layer
    /// * `command` - Current and new plaintext passwords
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `PasswordTooShort` / `PasswordTooLong` - New password length out of bounds
    /// * `NotFound` - Principal's user record no longer exists
    /// * `CurrentPasswordIncorrect` - Current password does not match
    /// * `DatabaseError` - Database operation failed
    async fn change_password(
        &self,
        principal: &Principal,
        command: ChangePasswordCommand,
    ) -> Result<(), SessionError>;

    /// Issue a password-reset token and mail its link to the user.
    ///
    /// Unknown emails report success so callers cannot probe for accounts.
    /// The token is persisted only after the mail was reported sent.
    ///
    /// # Arguments
    /// * `email` - Raw email address as given by the caller
    ///
    /// # Returns
    /// Unit (also for unknown emails)
    ///
    /// # Errors
    /// * `RateLimited` - Too many reset requests within the last hour
    /// * `DeliveryFailed` - Mail send failed; no token was persisted
    /// * `DatabaseError` - Database operation failed
    async fn request_password_reset(&self, email: &str) -> Result<(), SessionError>;

    /// Set a new password using a reset token.
    ///
    /// Consumes the token and revokes all of the user's refresh tokens,
    /// forcing re-login everywhere.
    ///
    /// # Arguments
    /// * `command` - Reset token value and new plaintext password
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `PasswordTooShort` / `PasswordTooLong` - New password length out of bounds
    /// * `InvalidToken` - No record with this value
    /// * `TokenExpired` - Record expired (deleted as a side effect)
    /// * `TokenAlreadyUsed` - Token was already consumed
    /// * `DatabaseError` - Database operation failed
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), SessionError>;

    /// Resolve the caller's user record.
    ///
    /// # Arguments
    /// * `principal` - Caller identity established by the request layer
    ///
    /// # Returns
    /// User entity
    ///
    /// # Errors
    /// * `NotFound` - User no longer exists
    /// * `DatabaseError` - Database operation failed
    async fn current_user(&self, principal: &Principal) -> Result<User, SessionError>;
}

/// Persistence operations for refresh tokens.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Persist a new refresh token.
    ///
    /// # Arguments
    /// * `token` - Refresh token entity to create
    ///
    /// # Returns
    /// Created refresh token entity
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, SessionError>;

    /// Retrieve a refresh token by its opaque value, regardless of state.
    ///
    /// # Arguments
    /// * `token` - Opaque token value
    ///
    /// # Returns
    /// Optional refresh token entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, SessionError>;

    /// Whether a row with this opaque value exists.
    ///
    /// Used for collision checks during token generation.
    ///
    /// # Arguments
    /// * `token` - Opaque token value
    ///
    /// # Returns
    /// True if a row exists
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn token_exists(&self, token: &str) -> Result<bool, SessionError>;

    /// Overwrite a token's value and expiry in place.
    ///
    /// # Arguments
    /// * `id` - Row to rotate
    /// * `new_token` - Replacement opaque value
    /// * `new_expires_at` - Replacement expiry
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn rotate(
        &self,
        id: RefreshTokenId,
        new_token: &str,
        new_expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError>;

    /// Mark the token with this value revoked.
    ///
    /// # Arguments
    /// * `token` - Opaque token value
    ///
    /// # Returns
    /// True if a row was updated, false if the value is unknown
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn revoke(&self, token: &str) -> Result<bool, SessionError>;

    /// Mark every token of a user revoked.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the tokens
    ///
    /// # Returns
    /// Number of rows updated
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, SessionError>;

    /// Count a user's currently valid tokens.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the tokens
    /// * `now` - Instant used for the expiry comparison
    ///
    /// # Returns
    /// Number of unrevoked, unexpired tokens
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn count_valid_for_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, SessionError>;

    /// Revoke the N oldest-by-creation valid tokens of a user.
    ///
    /// Runs as a single statement so concurrent calls cannot interleave
    /// between selection and update.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the tokens
    /// * `count` - How many tokens to revoke
    /// * `now` - Instant used for the expiry comparison
    ///
    /// # Returns
    /// Number of rows updated
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn revoke_oldest_valid(
        &self,
        user_id: &UserId,
        count: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, SessionError>;

    /// Remove a token row.
    ///
    /// # Arguments
    /// * `id` - Row to delete
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: RefreshTokenId) -> Result<(), SessionError>;

    /// Remove every expired token row, for all users.
    ///
    /// # Arguments
    /// * `now` - Instant used for the expiry comparison
    ///
    /// # Returns
    /// Number of rows deleted
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError>;
}

/// Persistence operations for password-reset tokens.
#[async_trait]
pub trait ResetTokenRepository: Send + Sync + 'static {
    /// Persist a new reset token.
    ///
    /// # Arguments
    /// * `token` - Reset token entity to create
    ///
    /// # Returns
    /// Created reset token entity
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, token: PasswordResetToken) -> Result<PasswordResetToken, SessionError>;

    /// Retrieve a reset token by its opaque value, regardless of state.
    ///
    /// Used tokens are returned too, so the caller can distinguish replayed
    /// tokens from unknown ones.
    ///
    /// # Arguments
    /// * `token` - Opaque token value
    ///
    /// # Returns
    /// Optional reset token entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, SessionError>;

    /// Whether a row with this opaque value exists.
    ///
    /// Used for collision checks during token generation.
    ///
    /// # Arguments
    /// * `token` - Opaque token value
    ///
    /// # Returns
    /// True if a row exists
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn token_exists(&self, token: &str) -> Result<bool, SessionError>;

    /// Mark a token consumed.
    ///
    /// # Arguments
    /// * `id` - Row to update
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn mark_used(&self, id: ResetTokenId) -> Result<(), SessionError>;

    /// Mark every outstanding token of a user consumed.
    ///
    /// Called when a newer reset request supersedes older tokens.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the tokens
    ///
    /// # Returns
    /// Number of rows updated
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn mark_all_used_for_user(&self, user_id: &UserId) -> Result<u64, SessionError>;

    /// Count tokens created for a user since an instant.
    ///
    /// Counts creations regardless of used/expired state; feeds the rolling
    /// rate-limit window.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the tokens
    /// * `since` - Start of the window
    ///
    /// # Returns
    /// Number of rows created in the window
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn count_created_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<i64, SessionError>;

    /// Remove a token row.
    ///
    /// # Arguments
    /// * `id` - Row to delete
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: ResetTokenId) -> Result<(), SessionError>;

    /// Remove every expired token row, for all users.
    ///
    /// # Arguments
    /// * `now` - Instant used for the expiry comparison
    ///
    /// # Returns
    /// Number of rows deleted
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError>;
}

/// Persistence operations for the access-token denylist.
#[async_trait]
pub trait TokenBlacklistRepository: Send + Sync + 'static {
    /// Add an access token to the denylist.
    ///
    /// Idempotent: inserting an already-present token value succeeds
    /// without effect.
    ///
    /// # Arguments
    /// * `entry` - Blacklist record to insert
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn insert(&self, entry: BlacklistedToken) -> Result<(), SessionError>;

    /// Whether an access token is denylisted.
    ///
    /// # Arguments
    /// * `token` - Access token value
    ///
    /// # Returns
    /// True if present
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn contains(&self, token: &str) -> Result<bool, SessionError>;

    /// Remove entries blacklisted before a cutoff.
    ///
    /// Tokens older than the access-token lifetime have expired on their
    /// own and no longer need denylisting.
    ///
    /// # Arguments
    /// * `cutoff` - Entries with `blacklisted_at` before this are removed
    ///
    /// # Returns
    /// Number of rows deleted
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, SessionError>;
}

/// Outbound delivery of password-reset links.
#[async_trait]
pub trait ResetMailer: Send + Sync + 'static {
    /// Send a reset link for the given token to a recipient.
    ///
    /// # Arguments
    /// * `to` - Recipient address
    /// * `name` - Recipient display name, for the salutation
    /// * `token` - Opaque reset token to embed in the link
    ///
    /// # Returns
    /// Unit once the relay confirmed the send
    ///
    /// # Errors
    /// * `SendFailed` - Relay rejected the message or was unreachable
    async fn send_reset_link(
        &self,
        to: &EmailAddress,
        name: &DisplayName,
        token: &str,
    ) -> Result<(), MailerError>;
}
