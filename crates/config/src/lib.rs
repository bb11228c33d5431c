//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - HTTP 服务地址
//! - Redis 连接与重连
//! - 房间存储键与广播频道
//! - 本地广播通道容量

use serde::{Deserialize, Serialize};
use std::env;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务配置
    pub server: ServerConfig,
    /// Redis 配置
    pub redis: RedisConfig,
    /// 房间存储与频道配置
    pub room: RoomConfig,
    /// 广播器配置
    pub broadcast: BroadcastConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    /// 订阅循环断线后的基础重连间隔
    pub reconnect_interval_ms: u64,
    pub max_reconnect_attempts: u32,
}

/// 房间存储键与发布/订阅频道
///
/// 键名沿用既有部署的数据布局，改名会丢失历史数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub messages_key: String,
    pub users_key: String,
    pub message_channel: String,
    pub user_channel: String,
}

/// 广播器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    pub capacity: usize,
}

impl AppConfig {
    /// 从环境变量加载配置，未设置的项使用开发环境默认值
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
                reconnect_interval_ms: env::var("REDIS_RECONNECT_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
                max_reconnect_attempts: env::var("REDIS_MAX_RECONNECT_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
            room: RoomConfig::default(),
            broadcast: BroadcastConfig {
                capacity: env::var("BROADCAST_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(256),
            },
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            messages_key: "room:0:messages".to_string(),
            users_key: "users".to_string(),
            message_channel: "MAIN_ROOM".to_string(),
            user_channel: "USER_CHANGE".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_room_config_matches_store_layout() {
        let room = RoomConfig::default();
        assert_eq!(room.messages_key, "room:0:messages");
        assert_eq!(room.users_key, "users");
    }
}
