// Each test binary compiles this module separately; not every binary uses
// every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use credentials::AccessTokenIssuer;
use session_service::domain::session::errors::MailerError;
use session_service::domain::session::errors::SessionError;
use session_service::domain::session::models::AuthenticatedSession;
use session_service::domain::session::models::BlacklistedToken;
use session_service::domain::session::models::LoginCommand;
use session_service::domain::session::models::PasswordResetToken;
use session_service::domain::session::models::RefreshToken;
use session_service::domain::session::models::RefreshTokenId;
use session_service::domain::session::models::ResetTokenId;
use session_service::domain::session::models::SessionPolicy;
use session_service::domain::session::ports::RefreshTokenRepository;
use session_service::domain::session::ports::ResetMailer;
use session_service::domain::session::ports::ResetTokenRepository;
use session_service::domain::session::ports::SessionServicePort;
use session_service::domain::session::ports::TokenBlacklistRepository;
use session_service::domain::session::service::SessionService;
use session_service::domain::user::errors::UserError;
use session_service::domain::user::models::DisplayName;
use session_service::domain::user::models::EmailAddress;
use session_service::domain::user::models::RegisterUserCommand;
use session_service::domain::user::models::User;
use session_service::domain::user::models::UserId;
use session_service::domain::user::ports::UserRepository;

pub const TEST_JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// In-memory user store
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email.as_str() == email).cloned())
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), UserError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == *id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(UserError::NotFound(id.to_string())),
        }
    }
}

/// In-memory refresh token store with backdating helpers
pub struct InMemoryRefreshTokens {
    tokens: Mutex<Vec<RefreshToken>>,
}

impl InMemoryRefreshTokens {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self, token_value: &str) -> Option<RefreshToken> {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token_value)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn valid_count_for_user(&self, user_id: UserId, now: DateTime<Utc>) -> i64 {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && t.is_valid(now))
            .count() as i64
    }

    pub fn set_expires_at(&self, token_value: &str, expires_at: DateTime<Utc>) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.token == token_value) {
            token.expires_at = expires_at;
        }
    }

    pub fn set_created_at(&self, token_value: &str, created_at: DateTime<Utc>) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.token == token_value) {
            token.created_at = created_at;
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokens {
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, SessionError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, SessionError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn token_exists(&self, token: &str) -> Result<bool, SessionError> {
        Ok(self.tokens.lock().unwrap().iter().any(|t| t.token == token))
    }

    async fn rotate(
        &self,
        id: RefreshTokenId,
        new_token: &str,
        new_expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
            token.token = new_token.to_string();
            token.expires_at = new_expires_at;
        }
        Ok(())
    }

    async fn revoke(&self, token: &str) -> Result<bool, SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.token == token) {
            Some(t) => {
                t.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        let mut updated = 0;
        for token in tokens
            .iter_mut()
            .filter(|t| t.user_id == *user_id && !t.revoked)
        {
            token.revoked = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_valid_for_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, SessionError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == *user_id && t.is_valid(now))
            .count() as i64)
    }

    async fn revoke_oldest_valid(
        &self,
        user_id: &UserId,
        count: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        let mut candidates: Vec<(DateTime<Utc>, RefreshTokenId)> = tokens
            .iter()
            .filter(|t| t.user_id == *user_id && t.is_valid(now))
            .map(|t| (t.created_at, t.id))
            .collect();
        candidates.sort_by_key(|(created_at, _)| *created_at);

        let mut updated = 0;
        for (_, id) in candidates.into_iter().take(count as usize) {
            if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
                token.revoked = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: RefreshTokenId) -> Result<(), SessionError> {
        self.tokens.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| !t.is_expired(now));
        Ok((before - tokens.len()) as u64)
    }
}

/// In-memory reset token store with backdating helpers
pub struct InMemoryResetTokens {
    tokens: Mutex<Vec<PasswordResetToken>>,
}

impl InMemoryResetTokens {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self, token_value: &str) -> Option<PasswordResetToken> {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token_value)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn set_expires_at(&self, token_value: &str, expires_at: DateTime<Utc>) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.token == token_value) {
            token.expires_at = expires_at;
        }
    }

    pub fn set_created_at(&self, token_value: &str, created_at: DateTime<Utc>) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.token == token_value) {
            token.created_at = created_at;
        }
    }
}

#[async_trait]
impl ResetTokenRepository for InMemoryResetTokens {
    async fn create(&self, token: PasswordResetToken) -> Result<PasswordResetToken, SessionError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, SessionError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn token_exists(&self, token: &str) -> Result<bool, SessionError> {
        Ok(self.tokens.lock().unwrap().iter().any(|t| t.token == token))
    }

    async fn mark_used(&self, id: ResetTokenId) -> Result<(), SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
            token.used = true;
        }
        Ok(())
    }

    async fn mark_all_used_for_user(&self, user_id: &UserId) -> Result<u64, SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        let mut updated = 0;
        for token in tokens
            .iter_mut()
            .filter(|t| t.user_id == *user_id && !t.used)
        {
            token.used = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_created_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<i64, SessionError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == *user_id && t.created_at >= since)
            .count() as i64)
    }

    async fn delete(&self, id: ResetTokenId) -> Result<(), SessionError> {
        self.tokens.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| !t.is_expired(now));
        Ok((before - tokens.len()) as u64)
    }
}

/// In-memory access-token denylist
pub struct InMemoryBlacklist {
    entries: Mutex<Vec<BlacklistedToken>>,
}

impl InMemoryBlacklist {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn set_blacklisted_at(&self, token_value: &str, blacklisted_at: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.iter_mut().find(|e| e.token == token_value) {
            entry.blacklisted_at = blacklisted_at;
        }
    }
}

#[async_trait]
impl TokenBlacklistRepository for InMemoryBlacklist {
    async fn insert(&self, entry: BlacklistedToken) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().unwrap();
        if !entries.iter().any(|e| e.token == entry.token) {
            entries.push(entry);
        }
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, SessionError> {
        Ok(self.entries.lock().unwrap().iter().any(|e| e.token == token))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, SessionError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.blacklisted_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}

/// Captured reset mail
#[derive(Clone)]
pub struct SentMail {
    pub to: String,
    pub name: String,
    pub token: String,
}

/// Mailer that records sends instead of talking to a relay
pub struct FakeMailer {
    sent: Mutex<Vec<SentMail>>,
    fail_next: Mutex<bool>,
}

impl FakeMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_next: Mutex::new(false),
        }
    }

    /// Make the next send fail, simulating an unreachable relay
    pub fn fail_next_send(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_tokens(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.token.clone())
            .collect()
    }

    pub fn last_token(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|m| m.token.clone())
    }

    pub fn last_mail(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ResetMailer for FakeMailer {
    async fn send_reset_link(
        &self,
        to: &EmailAddress,
        name: &DisplayName,
        token: &str,
    ) -> Result<(), MailerError> {
        {
            let mut fail = self.fail_next.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(MailerError::SendFailed("simulated relay failure".to_string()));
            }
        }

        self.sent.lock().unwrap().push(SentMail {
            to: to.as_str().to_string(),
            name: name.as_str().to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}

pub type TestSessionService = SessionService<
    InMemoryUsers,
    InMemoryRefreshTokens,
    InMemoryResetTokens,
    InMemoryBlacklist,
    FakeMailer,
>;

/// Session service wired to in-memory adapters, with handles to every
/// adapter for state inspection and backdating
pub struct TestContext {
    pub service: Arc<TestSessionService>,
    pub users: Arc<InMemoryUsers>,
    pub refresh_tokens: Arc<InMemoryRefreshTokens>,
    pub reset_tokens: Arc<InMemoryResetTokens>,
    pub blacklist: Arc<InMemoryBlacklist>,
    pub mailer: Arc<FakeMailer>,
    pub token_issuer: Arc<AccessTokenIssuer>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_policy(SessionPolicy::default())
    }

    pub fn with_policy(policy: SessionPolicy) -> Self {
        let users = Arc::new(InMemoryUsers::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokens::new());
        let reset_tokens = Arc::new(InMemoryResetTokens::new());
        let blacklist = Arc::new(InMemoryBlacklist::new());
        let mailer = Arc::new(FakeMailer::new());
        let token_issuer = Arc::new(AccessTokenIssuer::new(
            TEST_JWT_SECRET,
            Duration::minutes(60),
        ));

        let service = Arc::new(SessionService::new(
            Arc::clone(&users),
            Arc::clone(&refresh_tokens),
            Arc::clone(&reset_tokens),
            Arc::clone(&blacklist),
            Arc::clone(&mailer),
            Arc::clone(&token_issuer),
            policy,
        ));

        Self {
            service,
            users,
            refresh_tokens,
            reset_tokens,
            blacklist,
            mailer,
            token_issuer,
        }
    }

    /// Register a user through the service
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> User {
        let command = RegisterUserCommand::new(
            DisplayName::new(name.to_string()).expect("invalid name"),
            EmailAddress::new(email.to_string()).expect("invalid email"),
            password.to_string(),
        );
        self.service
            .register(command)
            .await
            .expect("registration failed")
    }

    /// Open a session through the service
    pub async fn login_user(&self, email: &str, password: &str) -> AuthenticatedSession {
        self.service
            .login(LoginCommand::new(
                EmailAddress::new(email.to_string()).expect("invalid email"),
                password.to_string(),
            ))
            .await
            .expect("login failed")
    }
}
