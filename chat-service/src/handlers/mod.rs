//! HTTP handlers for chat-service.

pub mod chat;
pub mod health;
pub mod metrics;
pub mod share;
pub mod user;

pub use chat::*;
pub use health::*;
pub use share::*;
pub use user::*;

pub async fn root() -> &'static str {
    "Hey, welcome to the API!"
}
