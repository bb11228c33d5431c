//! 领域实体定义

pub mod message;
pub mod user;

pub use message::{Message, MessageRecord};
pub use user::{User, UserId, UserStatus};
