use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::broadcaster::BusError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("broadcast error: {0}")]
    Broadcast(#[from] BusError),
}

impl ApplicationError {
    /// 是否为调用方可修正的请求错误（校验/未找到类）
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApplicationError::Domain(_))
    }
}
