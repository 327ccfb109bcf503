//! In-process [`Store`] used by tests and by `DATABASE_URL=memory://`.

use crate::models::{Chat, ChatChanges, NewChat, NewUser, User, UserChanges};
use crate::services::Store;
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    chats: BTreeMap<i64, Chat>,
    next_user_id: i64,
    next_chat_id: i64,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.user_id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_conflict(email: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!("Email '{}' is already registered", email))
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_user(&self, input: &NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.email_taken(&input.email, None) {
            return Err(email_conflict(&input.email));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            user_id: state.next_user_id,
            name: input.name.clone(),
            email: input.email.clone(),
            created_utc: now,
            updated_utc: now,
        };
        state.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update_user(
        &self,
        user_id: i64,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(user_id)) {
                return Err(email_conflict(email));
            }
        }

        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        user.updated_utc = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.users.remove(&user_id).is_none() {
            return Ok(false);
        }
        state.chats.retain(|_, chat| chat.user_id != user_id);
        Ok(true)
    }

    async fn create_chat(&self, user_id: i64, input: &NewChat) -> Result<Chat, AppError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }

        state.next_chat_id += 1;
        let now = Utc::now();
        let chat = Chat {
            chat_id: state.next_chat_id,
            user_id,
            message: input.message.clone(),
            data: input.data.clone(),
            created_utc: now,
            updated_utc: now,
        };
        state.chats.insert(chat.chat_id, chat.clone());
        Ok(chat)
    }

    async fn list_chats(&self, user_id: i64) -> Result<Vec<Chat>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .chats
            .values()
            .filter(|chat| chat.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_chat(&self, user_id: i64, chat_id: i64) -> Result<Option<Chat>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .chats
            .get(&chat_id)
            .filter(|chat| chat.user_id == user_id)
            .cloned())
    }

    async fn update_chat(
        &self,
        user_id: i64,
        chat_id: i64,
        changes: &ChatChanges,
    ) -> Result<Option<Chat>, AppError> {
        let mut state = self.state.write().await;
        let Some(chat) = state
            .chats
            .get_mut(&chat_id)
            .filter(|chat| chat.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(message) = &changes.message {
            chat.message = message.clone();
        }
        if let Some(data) = &changes.data {
            chat.data = data.clone();
        }
        chat.updated_utc = Utc::now();
        Ok(Some(chat.clone()))
    }

    async fn delete_chat(&self, user_id: i64, chat_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let owned = state
            .chats
            .get(&chat_id)
            .is_some_and(|chat| chat.user_id == user_id);
        if owned {
            state.chats.remove(&chat_id);
        }
        Ok(owned)
    }

    async fn find_chat(&self, chat_id: i64) -> Result<Option<Chat>, AppError> {
        Ok(self.state.read().await.chats.get(&chat_id).cloned())
    }
}
