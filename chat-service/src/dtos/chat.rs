use crate::models::{Chat, ChatChanges, NewChat};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatRequest {
    #[validate(length(min = 1, message = "Message must not be empty"))]
    pub message: String,
    /// Base64-encoded attachment.
    pub data: Option<String>,
}

impl CreateChatRequest {
    pub fn into_new_chat(self) -> Result<NewChat, AppError> {
        Ok(NewChat {
            message: self.message,
            data: self.data.as_deref().map(decode_attachment).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateChatRequest {
    #[validate(length(min = 1, message = "Message must not be empty"))]
    pub message: Option<String>,
    /// Base64-encoded attachment; `null` removes it.
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub data: Option<Option<String>>,
}

impl UpdateChatRequest {
    pub fn into_changes(self) -> Result<ChatChanges, AppError> {
        let data = match self.data {
            None => None,
            Some(None) => Some(None),
            Some(Some(encoded)) => Some(Some(decode_attachment(&encoded)?)),
        };

        Ok(ChatChanges {
            message: self.message,
            data,
        })
    }
}

/// Chat as returned over HTTP: the attachment is always base64 text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub chat_id: i64,
    pub user_id: i64,
    pub message: String,
    pub data: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Chat> for ChatResponse {
    fn from(chat: Chat) -> Self {
        Self {
            chat_id: chat.chat_id,
            user_id: chat.user_id,
            message: chat.message,
            data: chat.data.map(|bytes| STANDARD.encode(bytes)),
            created_utc: chat.created_utc,
            updated_utc: chat.updated_utc,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ShareRequest {
    /// Upper bound is `config::TTL_CEILING_SECONDS`.
    #[validate(range(
        min = 1,
        max = 315360000,
        message = "ttl_seconds must be between 1 and 315360000"
    ))]
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub token: String,
    /// Path at which the token can be redeemed.
    pub url: String,
    pub chat_id: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

fn decode_attachment(encoded: &str) -> Result<Vec<u8>, AppError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("data must be valid base64: {}", e)))
}
