use crate::models::{Chat, ChatChanges, NewChat, NewUser, User, UserChanges};
use async_trait::async_trait;
use service_core::error::AppError;

/// Persistence for users and their chats.
///
/// Chat operations other than [`Store::find_chat`] are scoped to the owning
/// user: a chat belonging to someone else behaves as if it did not exist.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, input: &NewUser) -> Result<User, AppError>;
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn update_user(
        &self,
        user_id: i64,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError>;
    /// Deletes the user and their chats. Returns `false` if there was no such user.
    async fn delete_user(&self, user_id: i64) -> Result<bool, AppError>;

    /// Fails with `NotFound` when the user does not exist.
    async fn create_chat(&self, user_id: i64, input: &NewChat) -> Result<Chat, AppError>;
    async fn list_chats(&self, user_id: i64) -> Result<Vec<Chat>, AppError>;
    async fn get_chat(&self, user_id: i64, chat_id: i64) -> Result<Option<Chat>, AppError>;
    async fn update_chat(
        &self,
        user_id: i64,
        chat_id: i64,
        changes: &ChatChanges,
    ) -> Result<Option<Chat>, AppError>;
    async fn delete_chat(&self, user_id: i64, chat_id: i64) -> Result<bool, AppError>;

    /// Unscoped lookup by id, used when redeeming a share token.
    async fn find_chat(&self, chat_id: i64) -> Result<Option<Chat>, AppError>;
}
