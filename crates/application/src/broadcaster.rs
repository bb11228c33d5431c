//! 变更总线抽象
//!
//! 协调器通过总线发布事件，扇出监听通过订阅接收事件，
//! 使"谁改了状态"与"谁需要知道"解耦。订阅端统一拿到
//! 进程内 broadcast 接收器；跨进程实现负责把远端事件
//! 泵入本地通道。

use async_trait::async_trait;
use domain::ChatEvent;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("publish failed: {0}")]
    Publish(String),
}

impl BusError {
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish(message.into())
    }
}

/// 变更总线
#[async_trait]
pub trait EventBus: Send + Sync {
    /// 发布一个事件，送达所有订阅了本总线的进程
    async fn publish(&self, event: ChatEvent) -> Result<(), BusError>;

    /// 订阅本进程收到的事件流
    fn subscribe(&self) -> broadcast::Receiver<ChatEvent>;
}
