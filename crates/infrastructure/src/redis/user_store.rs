//! Redis 用户存储
//!
//! 单个 Hash 承载全部用户：field 为用户 id，value 为 JSON 记录。
//! HSET 天然是按 id 的 upsert，两个并发写不同用户互不干扰。

use std::sync::Arc;

use ::redis::AsyncCommands;
use async_trait::async_trait;
use domain::{RepositoryError, RepositoryResult, User, UserId, UserRepository};

use super::{get_connection, RedisError};

pub struct RedisUserRepository {
    client: Arc<::redis::Client>,
    users_key: String,
}

impl RedisUserRepository {
    pub fn new(client: Arc<::redis::Client>, users_key: impl Into<String>) -> Self {
        Self {
            client,
            users_key: users_key.into(),
        }
    }

    async fn upsert(&self, user: User) -> RepositoryResult<User> {
        let payload = serde_json::to_string(&user)
            .map_err(|e| RepositoryError::serialization(format!("序列化用户失败: {e}")))?;

        let mut conn = get_connection(&self.client).await.map_err(RepositoryError::from)?;
        let _: () = conn
            .hset(&self.users_key, user.id, payload)
            .await
            .map_err(|e| RedisError::command(format!("HSET 失败: {e}")))
            .map_err(RepositoryError::from)?;
        Ok(user)
    }

    fn parse(payload: &str) -> RepositoryResult<User> {
        serde_json::from_str(payload)
            .map_err(|e| RepositoryError::serialization(format!("反序列化用户失败: {e}")))
    }
}

#[async_trait]
impl UserRepository for RedisUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        self.upsert(user).await
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        self.upsert(user).await
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let mut conn = get_connection(&self.client).await.map_err(RepositoryError::from)?;
        let payload: Option<String> = conn
            .hget(&self.users_key, id)
            .await
            .map_err(|e| RedisError::command(format!("HGET 失败: {e}")))
            .map_err(RepositoryError::from)?;

        payload.as_deref().map(Self::parse).transpose()
    }

    async fn find_by_name(&self, normalized: &str) -> RepositoryResult<Option<User>> {
        // 用户量为单房间规模，全量扫描足够
        let users = self.list_all().await?;
        Ok(users
            .into_iter()
            .find(|user| user.normalized_name() == normalized))
    }

    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        let mut conn = get_connection(&self.client).await.map_err(RepositoryError::from)?;
        let payloads: Vec<String> = conn
            .hvals(&self.users_key)
            .await
            .map_err(|e| RedisError::command(format!("HVALS 失败: {e}")))
            .map_err(RepositoryError::from)?;

        let mut users = payloads
            .iter()
            .map(|payload| Self::parse(payload))
            .collect::<RepositoryResult<Vec<User>>>()?;
        // Hash 无序，固定排序保证花名册推送一致
        users.sort_by_key(|user| user.id);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> Arc<::redis::Client> {
        Arc::new(::redis::Client::open("redis://127.0.0.1:6379").unwrap())
    }

    #[test]
    fn user_record_round_trips_through_json() {
        let user = User::new_online(42, "Alice", "a.png");
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(RedisUserRepository::parse(&json).unwrap(), user);
    }

    #[tokio::test]
    async fn upsert_and_lookup_against_live_redis() {
        // 注意：这个测试需要运行 Redis 实例才能通过
        if std::env::var("REDIS_INTEGRATION_TEST").is_err() {
            return;
        }

        let repo = RedisUserRepository::new(test_client(), "test:users:upsert");
        let user = User::new_online(7, "Bob", "b.png");
        repo.create(user.clone()).await.unwrap();

        assert_eq!(repo.find_by_id(7).await.unwrap(), Some(user.clone()));
        assert_eq!(repo.find_by_name("bob").await.unwrap(), Some(user.clone()));

        let mut offline = user;
        offline.go_offline();
        repo.update(offline.clone()).await.unwrap();
        assert_eq!(repo.find_by_id(7).await.unwrap(), Some(offline));
    }
}
