use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::session::models::BlacklistedToken;
use crate::domain::session::ports::TokenBlacklistRepository;
use crate::session::errors::SessionError;

pub struct PostgresTokenBlacklistRepository {
    pool: PgPool,
}

impl PostgresTokenBlacklistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenBlacklistRepository for PostgresTokenBlacklistRepository {
    async fn insert(&self, entry: BlacklistedToken) -> Result<(), SessionError> {
        // ON CONFLICT keeps double logouts idempotent
        sqlx::query(
            r#"
            INSERT INTO blacklisted_tokens (id, token, blacklisted_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(&entry.token)
        .bind(entry.blacklisted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, SessionError> {
        let row = sqlx::query(
            r#"
            SELECT id
            FROM blacklisted_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, SessionError> {
        let result = sqlx::query(
            r#"
            DELETE FROM blacklisted_tokens
            WHERE blacklisted_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
