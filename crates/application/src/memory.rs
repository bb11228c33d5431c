//! 内存存储实现（用于测试与单实例部署）

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Message, MessageRecord, MessageRepository, RepositoryResult, User, UserId, UserRepository,
};
use tokio::sync::RwLock;

/// 内存用户存储：按用户 id 作键的映射
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, normalized: &str) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.normalized_name() == normalized)
            .cloned())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        // 固定排序，保证花名册推送对所有订阅者一致
        users.sort_by_key(|user| user.id);
        Ok(users)
    }
}

/// 内存消息日志：只追加的有序列表
#[derive(Default)]
pub struct MemoryMessageLog {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageLog {
    async fn append(&self, message: Message) -> RepositoryResult<u64> {
        let mut messages = self.messages.write().await;
        messages.push(message);
        Ok(messages.len() as u64)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<MessageRecord>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .enumerate()
            .map(|(index, message)| MessageRecord::new(index as u64 + 1, message.clone()))
            .collect())
    }
}
