pub mod chat;
pub mod user;

pub use chat::{ChatMessage, MessageRole, NewMessage};
pub use user::{NewUser, User};
