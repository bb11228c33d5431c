//! 单房间聊天系统核心领域模型
//!
//! 包含用户、消息实体，变更事件，以及存储接口定义。

pub mod entities;
pub mod errors;
pub mod events;
pub mod repositories;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use repositories::*;
