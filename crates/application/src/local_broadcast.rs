// 进程内回环总线实现：发布即投递到本进程订阅者。
// 用于测试和单实例部署；多实例部署使用基础设施层的 Redis 总线。
use async_trait::async_trait;
use domain::ChatEvent;
use tokio::sync::broadcast;

use crate::broadcaster::{BusError, EventBus};

#[derive(Clone)]
pub struct LocalEventBus {
    sender: broadcast::Sender<ChatEvent>,
}

impl LocalEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventBus for LocalEventBus {
    async fn publish(&self, event: ChatEvent) -> Result<(), BusError> {
        // 没有订阅者时 send 返回错误，但事件无人消费并非故障
        let _ = self.sender.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::User;

    #[tokio::test]
    async fn publish_reaches_local_subscriber() {
        let bus = LocalEventBus::new(8);
        let mut receiver = bus.subscribe();

        let user = User::new_online(1, "a", "a.png");
        bus.publish(ChatEvent::UserChanged(user.clone()))
            .await
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event, ChatEvent::UserChanged(user));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = LocalEventBus::new(8);
        let user = User::new_online(1, "a", "a.png");
        assert!(bus.publish(ChatEvent::UserChanged(user)).await.is_ok());
    }
}
