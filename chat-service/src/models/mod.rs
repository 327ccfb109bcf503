//! Database entities.

mod chat;
mod user;

pub use chat::{Chat, ChatChanges, NewChat};
pub use user::{NewUser, User, UserChanges};
