//! Redis 消息日志
//!
//! 单房间的只追加 List。RPUSH 返回追加后的列表长度，
//! 该值即这条消息的日志序号（从 1 开始）。

use std::sync::Arc;

use ::redis::AsyncCommands;
use async_trait::async_trait;
use domain::{Message, MessageRecord, MessageRepository, RepositoryError, RepositoryResult};

use super::{get_connection, RedisError};

pub struct RedisMessageRepository {
    client: Arc<::redis::Client>,
    messages_key: String,
}

impl RedisMessageRepository {
    pub fn new(client: Arc<::redis::Client>, messages_key: impl Into<String>) -> Self {
        Self {
            client,
            messages_key: messages_key.into(),
        }
    }
}

#[async_trait]
impl MessageRepository for RedisMessageRepository {
    async fn append(&self, message: Message) -> RepositoryResult<u64> {
        let payload = serde_json::to_string(&message)
            .map_err(|e| RepositoryError::serialization(format!("序列化消息失败: {e}")))?;

        let mut conn = get_connection(&self.client).await.map_err(RepositoryError::from)?;
        let len: i64 = conn
            .rpush(&self.messages_key, payload)
            .await
            .map_err(|e| RedisError::command(format!("RPUSH 失败: {e}")))
            .map_err(RepositoryError::from)?;
        Ok(len as u64)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<MessageRecord>> {
        let mut conn = get_connection(&self.client).await.map_err(RepositoryError::from)?;
        let payloads: Vec<String> = conn
            .lrange(&self.messages_key, 0, -1)
            .await
            .map_err(|e| RedisError::command(format!("LRANGE 失败: {e}")))
            .map_err(RepositoryError::from)?;

        payloads
            .iter()
            .enumerate()
            .map(|(index, payload)| {
                let message: Message = serde_json::from_str(payload).map_err(|e| {
                    RepositoryError::serialization(format!("反序列化消息失败: {e}"))
                })?;
                Ok(MessageRecord::new(index as u64 + 1, message))
            })
            .collect()
    }
}
