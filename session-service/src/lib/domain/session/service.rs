use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use credentials::AccessTokenIssuer;

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
use crate::domain::session::models::SessionPolicy;
use crate::domain::session::models::SessionTokens;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::session::errors::SessionError;
use crate::session::ports::RefreshTokenRepository;
use crate::session::ports::ResetMailer;
use crate::session::ports::ResetTokenRepository;
use crate::session::ports::SessionServicePort;
use crate::session::ports::TokenBlacklistRepository;
use crate::user::models::EmailAddress;
use crate::user::ports::UserRepository;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Domain service implementation for session operations.
///
/// Concrete implementation of SessionServicePort with dependency injection.
pub struct SessionService<UR, RR, PR, BR, M>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
    PR: ResetTokenRepository,
    BR: TokenBlacklistRepository,
    M: ResetMailer,
{
    users: Arc<UR>,
    refresh_tokens: Arc<RR>,
    reset_tokens: Arc<PR>,
    blacklist: Arc<BR>,
    mailer: Arc<M>,
    token_issuer: Arc<AccessTokenIssuer>,
    password_hasher: credentials::PasswordHasher,
    policy: SessionPolicy,
}

impl<UR, RR, PR, BR, M> SessionService<UR, RR, PR, BR, M>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
    PR: ResetTokenRepository,
    BR: TokenBlacklistRepository,
    M: ResetMailer,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `refresh_tokens` - Refresh token persistence implementation
    /// * `reset_tokens` - Reset token persistence implementation
    /// * `blacklist` - Access-token denylist implementation
    /// * `mailer` - Reset-link delivery implementation
    /// * `token_issuer` - Access token signing/verification
    /// * `policy` - Lifetimes and limits to enforce
    ///
    /// # Returns
    /// Configured session service instance
    pub fn new(
        users: Arc<UR>,
        refresh_tokens: Arc<RR>,
        reset_tokens: Arc<PR>,
        blacklist: Arc<BR>,
        mailer: Arc<M>,
        token_issuer: Arc<AccessTokenIssuer>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            reset_tokens,
            blacklist,
            mailer,
            token_issuer,
            password_hasher: credentials::PasswordHasher::new(),
            policy,
        }
    }

    fn validate_password(password: &str) -> Result<(), SessionError> {
        let length = password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(SessionError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(SessionError::PasswordTooLong {
                max: MAX_PASSWORD_LENGTH,
            });
        }
        Ok(())
    }

    /// Generate an opaque value that no stored refresh token uses yet.
    async fn unused_refresh_token_value(&self) -> Result<String, SessionError> {
        loop {
            let value = credentials::opaque::generate_token();
            if !self.refresh_tokens.token_exists(&value).await? {
                return Ok(value);
            }
        }
    }

    /// Generate an opaque value that no stored reset token uses yet.
    async fn unused_reset_token_value(&self) -> Result<String, SessionError> {
        loop {
            let value = credentials::opaque::generate_token();
            if !self.reset_tokens.token_exists(&value).await? {
                return Ok(value);
            }
        }
    }

    /// Create and persist a refresh token, enforcing the per-user limit.
    ///
    /// When the user already holds the maximum number of valid tokens, the
    /// oldest ones are revoked first so that at most the configured count
    /// remains valid after the new token is stored.
    async fn issue_refresh_token(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, SessionError> {
        let deleted = self.refresh_tokens.delete_expired(now).await?;
        if deleted > 0 {
            tracing::debug!(deleted, "Removed expired refresh tokens");
        }

        let valid_count = self
            .refresh_tokens
            .count_valid_for_user(&user_id, now)
            .await?;
        if valid_count >= self.policy.max_active_refresh_tokens {
            let excess = valid_count - self.policy.max_active_refresh_tokens + 1;
            let revoked = self
                .refresh_tokens
                .revoke_oldest_valid(&user_id, excess, now)
                .await?;
            tracing::info!(
                user_id = %user_id,
                revoked,
                "Refresh token limit reached, revoked oldest tokens"
            );
        }

        let value = self.unused_refresh_token_value().await?;
        let token = RefreshToken {
            id: RefreshTokenId::new(),
            token: value,
            user_id,
            expires_at: now + self.policy.refresh_token_ttl,
            revoked: false,
            created_at: now,
        };

        self.refresh_tokens.create(token).await
    }
}

#[async_trait]
impl<UR, RR, PR, BR, M> SessionServicePort for SessionService<UR, RR, PR, BR, M>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
    PR: ResetTokenRepository,
    BR: TokenBlacklistRepository,
    M: ResetMailer,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, SessionError> {
        Self::validate_password(&command.password)?;

        let password_hash = self.password_hasher.hash(&command.password)?;

        let user = User {
            id: UserId::new(),
            name: command.name,
            email: command.email,
            password_hash,
            designation: None,
            profile_picture: None,
            birthdate: None,
            join_date: Utc::now().date_naive(),
        };

        let created = self.users.create(user).await?;
        tracing::info!(user_id = %created.id, "User registered");

        Ok(created)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, SessionError> {
        // Absent user and wrong password both surface as InvalidCredentials
        let user = self
            .users
            .find_by_email(command.email.as_str())
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        let password_matches = self
            .password_hasher
            .verify(&command.password, &user.password_hash)?;
        if !password_matches {
            return Err(SessionError::InvalidCredentials);
        }

        let now = Utc::now();
        let access_token = self.token_issuer.issue(user.email.as_str())?;
        let refresh_token = self.issue_refresh_token(user.id, now).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthenticatedSession {
            tokens: SessionTokens {
                access_token,
                refresh_token: refresh_token.token,
            },
            user,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, SessionError> {
        let stored = self
            .refresh_tokens
            .find_by_token(refresh_token)
            .await?
            .ok_or(SessionError::InvalidToken)?;

        let now = Utc::now();
        if stored.is_expired(now) {
            // Expired rows are removed as a side effect of being detected
            self.refresh_tokens.delete(stored.id).await?;
            return Err(SessionError::TokenExpired);
        }
        if stored.revoked {
            return Err(SessionError::TokenRevoked);
        }

        let user = self
            .users
            .find_by_id(&stored.user_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(format!("User {}", stored.user_id)))?;

        let access_token = self.token_issuer.issue(user.email.as_str())?;

        // Rotation overwrites the stored record, it never inserts a new row
        let new_value = self.unused_refresh_token_value().await?;
        self.refresh_tokens
            .rotate(stored.id, &new_value, now + self.policy.refresh_token_ttl)
            .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token: new_value,
        })
    }

    async fn logout(
        &self,
        refresh_token: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<(), SessionError> {
        let now = Utc::now();

        // Blank values count as absent
        if let Some(access) = access_token.map(str::trim).filter(|t| !t.is_empty()) {
            self.blacklist
                .insert(BlacklistedToken::new(access.to_string(), now))
                .await?;

            // Entries older than the access lifetime have expired on their own
            let cutoff = now - self.token_issuer.ttl();
            let purged = self.blacklist.delete_older_than(cutoff).await?;
            if purged > 0 {
                tracing::debug!(purged, "Purged stale blacklist entries");
            }
        }

        if let Some(refresh) = refresh_token.map(str::trim).filter(|t| !t.is_empty()) {
            let revoked = self.refresh_tokens.revoke(refresh).await?;
            if !revoked {
                return Err(SessionError::NotFound("Refresh token".to_string()));
            }
        }

        Ok(())
    }

    async fn is_token_blacklisted(&self, access_token: &str) -> Result<bool, SessionError> {
        self.blacklist.contains(access_token).await
    }

    async fn change_password(
        &self,
        principal: &Principal,
        command: ChangePasswordCommand,
    ) -> Result<(), SessionError> {
        Self::validate_password(&command.new_password)?;

        let user = self
            .users
            .find_by_email(principal.email.as_str())
            .await?
            .ok_or_else(|| SessionError::NotFound(format!("User {}", principal.email)))?;

        let current_matches = self
            .password_hasher
            .verify(&command.current_password, &user.password_hash)?;
        if !current_matches {
            return Err(SessionError::CurrentPasswordIncorrect);
        }

        let password_hash = self.password_hasher.hash(&command.new_password)?;
        self.users.update_password(&user.id, &password_hash).await?;

        // Existing refresh tokens are not revoked here
        tracing::info!(user_id = %user.id, "Password changed");

        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), SessionError> {
        // Unknown and malformed emails report success so account existence
        // never leaks through this endpoint
        let email = match EmailAddress::new(email.to_string()) {
            Ok(email) => email,
            Err(_) => {
                tracing::debug!("Password reset requested for malformed email");
                return Ok(());
            }
        };

        let user = match self.users.find_by_email(email.as_str()).await? {
            Some(user) => user,
            None => {
                tracing::debug!("Password reset requested for unknown email");
                return Ok(());
            }
        };

        let now = Utc::now();
        let window_start = now - Duration::hours(1);
        let recent = self
            .reset_tokens
            .count_created_since(&user.id, window_start)
            .await?;
        if recent >= self.policy.max_reset_requests_per_hour {
            tracing::warn!(user_id = %user.id, recent, "Password reset rate limit hit");
            return Err(SessionError::RateLimited);
        }

        let deleted = self.reset_tokens.delete_expired(now).await?;
        if deleted > 0 {
            tracing::debug!(deleted, "Removed expired reset tokens");
        }

        let superseded = self.reset_tokens.mark_all_used_for_user(&user.id).await?;
        if superseded > 0 {
            tracing::debug!(user_id = %user.id, superseded, "Superseded outstanding reset tokens");
        }

        let value = self.unused_reset_token_value().await?;

        // Send first: a reset token must never exist in storage unless its
        // email was confirmed sent
        self.mailer
            .send_reset_link(&user.email, &user.name, &value)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Reset mail delivery failed");
                SessionError::from(e)
            })?;

        let token = PasswordResetToken {
            id: ResetTokenId::new(),
            token: value,
            user_id: user.id,
            expires_at: now + self.policy.reset_token_ttl,
            used: false,
            created_at: now,
        };
        self.reset_tokens.create(token).await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        Ok(())
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), SessionError> {
        Self::validate_password(&command.new_password)?;

        let stored = self
            .reset_tokens
            .find_by_token(&command.token)
            .await?
            .ok_or(SessionError::InvalidToken)?;

        let now = Utc::now();
        if stored.is_expired(now) {
            // Expired rows are removed as a side effect of being detected
            self.reset_tokens.delete(stored.id).await?;
            return Err(SessionError::TokenExpired);
        }
        if stored.used {
            return Err(SessionError::TokenAlreadyUsed);
        }

        let password_hash = self.password_hasher.hash(&command.new_password)?;
        self.users
            .update_password(&stored.user_id, &password_hash)
            .await?;
        self.reset_tokens.mark_used(stored.id).await?;

        let revoked = self
            .refresh_tokens
            .revoke_all_for_user(&stored.user_id)
            .await?;
        tracing::info!(
            user_id = %stored.user_id,
            revoked,
            "Password reset, all sessions revoked"
        );

        Ok(())
    }

    async fn current_user(&self, principal: &Principal) -> Result<User, SessionError> {
        Ok(self
            .users
            .find_by_email(principal.email.as_str())
            .await?
            .ok_or_else(|| SessionError::NotFound(format!("User {}", principal.email)))?)
    }
}
