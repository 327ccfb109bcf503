//! PostgreSQL-backed [`Store`].

use crate::models::{Chat, ChatChanges, NewChat, NewUser, User, UserChanges};
use crate::services::Store;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use std::time::Instant;
use tracing::{info, instrument};

const USER_COLUMNS: &str = "user_id, name, email, created_utc, updated_utc";
const CHAT_COLUMNS: &str = "chat_id, user_id, message, data, created_utc, updated_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

fn observe(operation: &'static str, start: Instant) {
    metrics::histogram!("db_query_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

fn map_user_write_error(e: sqlx::Error, email: Option<&str>) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(anyhow::anyhow!(
                "Email '{}' is already registered",
                email.unwrap_or_default()
            ))
        }
        other => AppError::from(other),
    }
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input))]
    async fn create_user(&self, input: &NewUser) -> Result<User, AppError> {
        let start = Instant::now();

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_user_write_error(e, Some(&input.email)))?;

        observe("create_user", start);
        info!(user_id = user.user_id, "User created");

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let start = Instant::now();

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        observe("get_user", start);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let start = Instant::now();

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY user_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        observe("list_users", start);
        Ok(users)
    }

    #[instrument(skip(self, changes))]
    async fn update_user(
        &self,
        user_id: i64,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError> {
        let start = Instant::now();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_utc = NOW()
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&changes.name)
        .bind(&changes.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_user_write_error(e, changes.email.as_deref()))?;

        observe("update_user", start);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: i64) -> Result<bool, AppError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        observe("delete_user", start);

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(user_id, "User deleted");
        }
        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Chat Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input))]
    async fn create_chat(&self, user_id: i64, input: &NewChat) -> Result<Chat, AppError> {
        let start = Instant::now();

        let chat = sqlx::query_as::<_, Chat>(&format!(
            "INSERT INTO chats (user_id, message, data) VALUES ($1, $2, $3) RETURNING {CHAT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&input.message)
        .bind(&input.data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("User not found"))
            }
            other => AppError::from(other),
        })?;

        observe("create_chat", start);
        info!(chat_id = chat.chat_id, user_id, "Chat created");

        Ok(chat)
    }

    #[instrument(skip(self))]
    async fn list_chats(&self, user_id: i64) -> Result<Vec<Chat>, AppError> {
        let start = Instant::now();

        let chats = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = $1 ORDER BY chat_id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        observe("list_chats", start);
        Ok(chats)
    }

    #[instrument(skip(self))]
    async fn get_chat(&self, user_id: i64, chat_id: i64) -> Result<Option<Chat>, AppError> {
        let start = Instant::now();

        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = $1 AND chat_id = $2"
        ))
        .bind(user_id)
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        observe("get_chat", start);
        Ok(chat)
    }

    #[instrument(skip(self, changes))]
    async fn update_chat(
        &self,
        user_id: i64,
        chat_id: i64,
        changes: &ChatChanges,
    ) -> Result<Option<Chat>, AppError> {
        let start = Instant::now();

        let chat = sqlx::query_as::<_, Chat>(&format!(
            r#"
            UPDATE chats
            SET message = COALESCE($3, message),
                data = CASE WHEN $4 THEN $5 ELSE data END,
                updated_utc = NOW()
            WHERE user_id = $1 AND chat_id = $2
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(chat_id)
        .bind(&changes.message)
        .bind(changes.data.is_some())
        .bind(changes.data.clone().flatten())
        .fetch_optional(&self.pool)
        .await?;

        observe("update_chat", start);
        Ok(chat)
    }

    #[instrument(skip(self))]
    async fn delete_chat(&self, user_id: i64, chat_id: i64) -> Result<bool, AppError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM chats WHERE user_id = $1 AND chat_id = $2")
            .bind(user_id)
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        observe("delete_chat", start);
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_chat(&self, chat_id: i64) -> Result<Option<Chat>, AppError> {
        let start = Instant::now();

        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE chat_id = $1"
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        observe("find_chat", start);
        Ok(chat)
    }
}
