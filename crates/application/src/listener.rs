//! 变更总线扇出监听
//!
//! 两类事件各自驱动一种扇出：
//! - 消息入库 → 推给所有消息流句柄；
//! - 用户变更 → 重新读取权威用户列表，推给所有花名册流句柄。
//!   事件负载被有意忽略，以简单换取正确性。
//!
//! 监听循环中的任何单次失败只记日志并继续，不得中断后续投递。

use std::sync::Arc;

use domain::{ChatEvent, UserRepository};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::registry::SessionRegistry;

pub struct FanoutListener;

impl FanoutListener {
    /// 在后台任务中消费总线事件并驱动扇出
    pub fn spawn(
        mut receiver: broadcast::Receiver<ChatEvent>,
        registry: Arc<SessionRegistry>,
        user_repository: Arc<dyn UserRepository>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(ChatEvent::MessagePosted(record)) => {
                        registry.fan_out_message(&record).await;
                    }
                    Ok(ChatEvent::UserChanged(_)) => {
                        // 总是重取全量列表，不信任事件负载
                        match user_repository.list_all().await {
                            Ok(users) => registry.fan_out_roster(&users).await,
                            Err(err) => {
                                error!(error = %err, "读取用户列表失败，跳过本次花名册推送");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "扇出监听落后于总线，部分事件被丢弃");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            info!("变更总线监听已停止");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::EventBus;
    use crate::local_broadcast::LocalEventBus;
    use crate::memory::{MemoryMessageLog, MemoryUserRepository};
    use chrono::Utc;
    use domain::{Message, MessageRecord, MessageRepository, User};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn message_event_reaches_registered_stream() {
        let bus = LocalEventBus::new(16);
        let registry = Arc::new(SessionRegistry::new());
        let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
        let _listener = FanoutListener::spawn(bus.subscribe(), registry.clone(), users);

        let log = MemoryMessageLog::new();
        let mut rx = registry.register_message_stream(5, &log).await.unwrap();

        let sender = User::new_online(1, "a", "a.png");
        let message = Message::from_sender(&sender, "hi", Utc::now());
        let seq = log.append(message.clone()).await.unwrap();
        bus.publish(ChatEvent::MessagePosted(MessageRecord::new(seq, message)))
            .await
            .unwrap();

        let delivered = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered.body, "hi");
    }

    #[tokio::test]
    async fn user_event_triggers_authoritative_roster_refresh() {
        let bus = LocalEventBus::new(16);
        let registry = Arc::new(SessionRegistry::new());
        let users = Arc::new(MemoryUserRepository::new());
        let _listener =
            FanoutListener::spawn(bus.subscribe(), registry.clone(), users.clone());

        let mut rx = registry.register_roster_stream(5).await;

        let alice = User::new_online(1, "Alice", "a.png");
        users.create(alice.clone()).await.unwrap();

        // 事件负载给一份过期用户也无妨：监听端重读存储
        let stale = User::new_online(99, "stale", "s.png");
        bus.publish(ChatEvent::UserChanged(stale)).await.unwrap();

        let roster = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(roster, vec![alice]);
    }
}
