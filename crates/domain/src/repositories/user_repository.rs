//! 用户Repository接口定义

use async_trait::async_trait;

use crate::entities::{User, UserId};
use crate::errors::RepositoryResult;

/// 用户Repository接口
///
/// 所有写操作以用户 id 为键 upsert。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建新用户
    async fn create(&self, user: User) -> RepositoryResult<User>;

    /// 按 id 更新用户（id 不存在时等同创建）
    async fn update(&self, user: User) -> RepositoryResult<User>;

    /// 根据ID查找用户
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// 根据规范化用户名查找用户
    ///
    /// 传入值需已做 trim + 小写折叠。
    async fn find_by_name(&self, normalized: &str) -> RepositoryResult<Option<User>>;

    /// 列出全部用户（含离线）
    async fn list_all(&self) -> RepositoryResult<Vec<User>>;
}
