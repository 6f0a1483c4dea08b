use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::session::models::PasswordResetToken;
use crate::domain::session::models::ResetTokenId;
use crate::domain::session::ports::ResetTokenRepository;
use crate::domain::user::models::UserId;
use crate::session::errors::SessionError;

pub struct PostgresResetTokenRepository {
    pool: PgPool,
}

impl PostgresResetTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_token(row: &PgRow) -> PasswordResetToken {
        PasswordResetToken {
            id: ResetTokenId(row.get("id")),
            token: row.get("token"),
            user_id: UserId(row.get("user_id")),
            expires_at: row.get("expires_at"),
            used: row.get("used"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl ResetTokenRepository for PostgresResetTokenRepository {
    async fn create(&self, token: PasswordResetToken) -> Result<PasswordResetToken, SessionError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, token, user_id, expires_at, used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id.0)
        .bind(&token.token)
        .bind(token.user_id.0)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, SessionError> {
        let row = sqlx::query(
            r#"
            SELECT id, token, user_id, expires_at, used, created_at
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(row.map(|r| Self::row_to_token(&r)))
    }

    async fn token_exists(&self, token: &str) -> Result<bool, SessionError> {
        let row = sqlx::query(
            r#"
            SELECT id
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn mark_used(&self, id: ResetTokenId) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used = TRUE
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn mark_all_used_for_user(&self, user_id: &UserId) -> Result<u64, SessionError> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used = TRUE
            WHERE user_id = $1 AND used = FALSE
            "#,
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_created_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<i64, SessionError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM password_reset_tokens
            WHERE user_id = $1 AND created_at >= $2
            "#,
        )
        .bind(user_id.0)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(row.get("count"))
    }

    async fn delete(&self, id: ResetTokenId) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let result = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
