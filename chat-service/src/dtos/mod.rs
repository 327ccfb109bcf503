//! Request and response bodies.

pub mod chat;
pub mod user;

pub use chat::{ChatResponse, CreateChatRequest, ShareRequest, ShareResponse, UpdateChatRequest};
pub use user::{CreateUserRequest, UpdateUserRequest, UserResponse};

use serde::{Deserialize, Deserializer};

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
