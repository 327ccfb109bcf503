use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A chat message owned by a user, with an optional binary attachment.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Chat {
    pub chat_id: i64,
    pub user_id: i64,
    pub message: String,
    pub data: Option<Vec<u8>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChat {
    pub message: String,
    pub data: Option<Vec<u8>>,
}

/// Partial update.
///
/// `data: Some(None)` clears the attachment, `data: None` keeps it.
#[derive(Debug, Clone, Default)]
pub struct ChatChanges {
    pub message: Option<String>,
    pub data: Option<Option<Vec<u8>>>,
}

impl ChatChanges {
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.data.is_none()
    }
}
