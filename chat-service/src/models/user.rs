use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Fields required to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}
