//! User repository for database operations.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::entities::{AccountUpdate, NewUser, User};
use crate::new_id;
use crate::types::{DatabaseError, DatabaseResult};

const USER_COLUMNS: &str = "id, public_id, username, email, full_name, avatar, cover_image, \
     password_hash, refresh_token, created_at, updated_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// First user whose username or email matches. `None` arguments never match.
    pub async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> DatabaseResult<Option<User>> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? ORDER BY id LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn email_taken_by_other(&self, email: &str, user_id: i64) -> DatabaseResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
            .bind(email)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, request: &NewUser) -> DatabaseResult<User> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_id();

        let result = sqlx::query(
            r#"
            INSERT INTO users (public_id, username, email, full_name, avatar, cover_image, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(&request.avatar)
        .bind(request.cover_image.as_deref())
        .bind(&request.password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "user"))?;

        debug!(user = %public_id, "inserted user row");
        self.require(result.last_insert_rowid()).await
    }

    /// Replace the stored refresh token; `None` revokes it.
    pub async fn set_refresh_token(&self, id: i64, token: Option<&str>) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    /// Swap `expected` for `replacement` only if `expected` is still the stored token.
    ///
    /// Returns `false` when another refresh or a logout got there first.
    pub async fn rotate_refresh_token(
        &self,
        id: i64,
        expected: &str,
        replacement: &str,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ? AND refresh_token = ?",
        )
        .bind(replacement)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn update_password_hash(&self, id: i64, password_hash: &str) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    pub async fn update_account(&self, id: i64, update: &AccountUpdate) -> DatabaseResult<User> {
        sqlx::query("UPDATE users SET full_name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(&update.full_name)
            .bind(&update.email)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, "email"))?;

        self.require(id).await
    }

    pub async fn update_avatar(&self, id: i64, avatar: &str) -> DatabaseResult<User> {
        sqlx::query("UPDATE users SET avatar = ?, updated_at = ? WHERE id = ?")
            .bind(avatar)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.require(id).await
    }

    pub async fn update_cover_image(&self, id: i64, cover_image: &str) -> DatabaseResult<User> {
        sqlx::query("UPDATE users SET cover_image = ?, updated_at = ? WHERE id = ?")
            .bind(cover_image)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.require(id).await
    }

    async fn require(&self, id: i64) -> DatabaseResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")))
    }
}
