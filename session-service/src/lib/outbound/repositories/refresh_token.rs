use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RefreshTokenId;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::UserId;
use crate::session::errors::SessionError;

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_token(row: &PgRow) -> RefreshToken {
        RefreshToken {
            id: RefreshTokenId(row.get("id")),
            token: row.get("token"),
            user_id: UserId(row.get("user_id")),
            expires_at: row.get("expires_at"),
            revoked: row.get("revoked"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, SessionError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, token, user_id, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id.0)
        .bind(&token.token)
        .bind(token.user_id.0)
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, SessionError> {
        let row = sqlx::query(
            r#"
            SELECT id, token, user_id, expires_at, revoked, created_at
            FROM refresh_tokens
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
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn rotate(
        &self,
        id: RefreshTokenId,
        new_token: &str,
        new_expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET token = $2, expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(new_token)
        .bind(new_expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn revoke(&self, token: &str) -> Result<bool, SessionError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, SessionError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_valid_for_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, SessionError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM refresh_tokens
            WHERE user_id = $1 AND revoked = FALSE AND expires_at > $2
            "#,
        )
        .bind(user_id.0)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(row.get("count"))
    }

    async fn revoke_oldest_valid(
        &self,
        user_id: &UserId,
        count: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, SessionError> {
        // Single statement so no other call can slip between select and update
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE id IN (
                SELECT id
                FROM refresh_tokens
                WHERE user_id = $1 AND revoked = FALSE AND expires_at > $2
                ORDER BY created_at ASC
                LIMIT $3
            )
            "#,
        )
        .bind(user_id.0)
        .bind(now)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: RefreshTokenId) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            DELETE FROM refresh_tokens
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
            DELETE FROM refresh_tokens
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
