//! 基础设施层实现。
//!
//! 提供领域存储接口与变更总线的 Redis 实现：
//! - 用户存储：以用户 id 为字段的 Redis Hash（按键 upsert，
//!   规避按下标写列表的并发更新竞争）；
//! - 消息日志：Redis List，RPUSH 的返回值即日志序号；
//! - 变更总线：两条 Pub/Sub 频道 + 带重连的订阅泵。

pub mod redis;

pub use redis::bus::RedisEventBus;
pub use redis::message_log::RedisMessageRepository;
pub use redis::user_store::RedisUserRepository;
pub use redis::{RedisError, RedisResult};
