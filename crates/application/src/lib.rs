//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：聊天协调器、会话注册表、
//! 变更总线抽象与扇出监听，以及供测试使用的内存存储实现。

pub mod broadcaster;
pub mod error;
pub mod listener;
pub mod local_broadcast;
pub mod memory;
pub mod registry;
pub mod services;

pub use broadcaster::{BusError, EventBus};
pub use error::ApplicationError;
pub use listener::FanoutListener;
pub use local_broadcast::LocalEventBus;
pub use memory::{MemoryMessageLog, MemoryUserRepository};
pub use registry::SessionRegistry;
pub use services::{ChatService, ChatServiceDependencies, JoinRequest, SendMessageRequest};
