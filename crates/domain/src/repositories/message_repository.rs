//! 消息Repository接口定义

use async_trait::async_trait;

use crate::entities::{Message, MessageRecord};
use crate::errors::RepositoryResult;

/// 消息Repository接口
///
/// 单房间的只追加有序日志，追加顺序即历史回放的规范顺序。
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 追加一条消息，返回其日志序号（从 1 开始）
    async fn append(&self, message: Message) -> RepositoryResult<u64>;

    /// 按追加顺序读取完整日志
    async fn list_all(&self) -> RepositoryResult<Vec<MessageRecord>>;
}
