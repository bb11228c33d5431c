//! 存储接口定义
//!
//! 实现要求按用户 id 作键做更新（映射而非按下标写列表），
//! 避免并发写入同一集合时的更新丢失。

pub mod message_repository;
pub mod user_repository;

pub use message_repository::MessageRepository;
pub use user_repository::UserRepository;
