//! 领域模型错误定义
//!
//! 定义了系统中所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 参数校验错误
    #[error("无效参数 {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 用户名与当前在线用户冲突
    #[error("用户名已在线: {name}")]
    AlreadyOnline { name: String },

    /// 用户不存在
    #[error("用户不存在: {id}")]
    UserNotFound { id: i64 },
}

impl DomainError {
    /// 创建参数校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 创建用户名在线冲突错误
    pub fn already_online(name: impl Into<String>) -> Self {
        Self::AlreadyOnline { name: name.into() }
    }

    /// 创建用户不存在错误
    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }
}

/// 存储层错误类型
///
/// 存储调用失败直接向调用方透出，内部不做重试。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// 底层存储不可用或操作失败
    #[error("存储错误: {message}")]
    Storage { message: String },

    /// 记录序列化/反序列化失败
    #[error("序列化错误: {message}")]
    Serialization { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 存储层结果类型
pub type RepositoryResult<T> = Result<T, RepositoryError>;
