//! Redis 适配器公共部分

pub mod bus;
pub mod message_log;
pub mod user_store;

use domain::RepositoryError;
use thiserror::Error;

/// Redis 适配器错误类型
#[derive(Error, Debug, Clone)]
pub enum RedisError {
    #[error("连接 Redis 失败: {message}")]
    Connection { message: String },

    #[error("Redis 命令失败: {message}")]
    Command { message: String },

    #[error("订阅频道失败: {message}")]
    Subscribe { message: String },

    #[error("消息编解码失败: {message}")]
    Serialization { message: String },
}

impl RedisError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    pub fn subscribe(message: impl Into<String>) -> Self {
        Self::Subscribe {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<RedisError> for RepositoryError {
    fn from(value: RedisError) -> Self {
        match value {
            RedisError::Serialization { message } => RepositoryError::serialization(message),
            other => RepositoryError::storage(other.to_string()),
        }
    }
}

pub type RedisResult<T> = Result<T, RedisError>;

/// 获取异步多路复用连接
pub(crate) async fn get_connection(
    client: &::redis::Client,
) -> RedisResult<::redis::aio::MultiplexedConnection> {
    client
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| RedisError::connection(format!("获取连接失败: {e}")))
}
