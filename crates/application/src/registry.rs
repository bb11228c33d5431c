//! 会话注册表
//!
//! 进程内的核心可变状态：用户 id 到其当前打开的出站流句柄的映射。
//! 每个用户至多各持有一个消息流句柄和一个花名册流句柄；同一
//! (用户, 种类) 的重复注册覆盖旧条目，旧发送端被丢弃后对应的
//! 接收端随即结束。
//!
//! 消息流的"回放→实时"交接在注册表写锁内完成：持锁读取日志快照
//! 并登记回放位点，排斥并发扇出，保证交接不丢不重。向已关闭句柄
//! 的写入一律吞掉，绝不中断对其他句柄的投递。

use std::collections::HashMap;

use domain::{Message, MessageRecord, MessageRepository, RepositoryResult, User, UserId};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// 消息流条目：句柄 + 注册时回放覆盖到的日志位点
struct MessageStreamEntry {
    sender: mpsc::UnboundedSender<Message>,
    last_seq: u64,
}

#[derive(Default)]
struct Inner {
    message_streams: HashMap<UserId, MessageStreamEntry>,
    roster_streams: HashMap<UserId, mpsc::UnboundedSender<Vec<User>>>,
}

/// 会话注册表
///
/// 显式创建并注入使用方，不做模块级单例。
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<Inner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册消息流：在写锁内回放完整日志后登记句柄
    ///
    /// 返回的接收端先按日志顺序收到全部历史消息，此后由扇出
    /// 投递实时消息。`last_seq` 记录回放覆盖到的位点，扇出据此
    /// 跳过持锁期间已入快照的事件。
    pub async fn register_message_stream(
        &self,
        user_id: UserId,
        log: &dyn MessageRepository,
    ) -> RepositoryResult<mpsc::UnboundedReceiver<Message>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.write().await;

        // 持锁快照：排斥并发扇出，交接窗口内不会漏发
        let history = log.list_all().await?;
        let mut last_seq = 0;
        for record in history {
            last_seq = record.seq;
            // 接收端由本次调用返回，此处不会失败
            let _ = sender.send(record.message);
        }

        inner
            .message_streams
            .insert(user_id, MessageStreamEntry { sender, last_seq });
        Ok(receiver)
    }

    /// 注册花名册流
    ///
    /// 没有独立的初始快照：注册后由调用方发布一次用户变更事件，
    /// 监听端对全部花名册句柄推送权威全量列表，新句柄随之收到首帧。
    pub async fn register_roster_stream(
        &self,
        user_id: UserId,
    ) -> mpsc::UnboundedReceiver<Vec<User>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.write().await;
        inner.roster_streams.insert(user_id, sender);
        receiver
    }

    /// 注销消息流句柄，返回是否存在过
    pub async fn deregister_message_stream(&self, user_id: UserId) -> bool {
        self.inner
            .write()
            .await
            .message_streams
            .remove(&user_id)
            .is_some()
    }

    /// 注销花名册流句柄，返回是否存在过
    pub async fn deregister_roster_stream(&self, user_id: UserId) -> bool {
        self.inner
            .write()
            .await
            .roster_streams
            .remove(&user_id)
            .is_some()
    }

    /// 把一条新消息扇出到所有消息流句柄
    ///
    /// 序号不大于句柄回放位点的事件跳过（该消息已随历史回放送达）。
    /// 位点在注册时一次性确定，扇出不推进它：总线对并发发布者不
    /// 保证全序，后到的低序号消息同样必须投递。
    pub async fn fan_out_message(&self, record: &MessageRecord) {
        let inner = self.inner.read().await;
        for (user_id, entry) in inner.message_streams.iter() {
            if record.seq <= entry.last_seq {
                continue;
            }
            if entry.sender.send(record.message.clone()).is_err() {
                // 句柄已关闭：吞掉，注销由连接生命周期驱动
                debug!(user_id, "跳过已关闭的消息流句柄");
            }
        }
    }

    /// 把全量用户列表扇出到所有花名册流句柄
    ///
    /// 每个句柄收到同一份完整列表，纯重传、无增量。
    pub async fn fan_out_roster(&self, users: &[User]) {
        let inner = self.inner.read().await;
        for (user_id, sender) in inner.roster_streams.iter() {
            if sender.send(users.to_vec()).is_err() {
                debug!(user_id, "跳过已关闭的花名册流句柄");
            }
        }
    }

    /// 当前在册的消息流数量
    pub async fn message_stream_count(&self) -> usize {
        self.inner.read().await.message_streams.len()
    }

    /// 当前在册的花名册流数量
    pub async fn roster_stream_count(&self) -> usize {
        self.inner.read().await.roster_streams.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMessageLog;
    use chrono::Utc;
    use domain::UserStatus;

    fn message(sender_id: UserId, body: &str) -> Message {
        let sender = User::new_online(sender_id, format!("user{sender_id}"), "a.png");
        Message::from_sender(&sender, body, Utc::now())
    }

    #[tokio::test]
    async fn replay_precedes_live_delivery_in_log_order() {
        let registry = SessionRegistry::new();
        let log = MemoryMessageLog::new();
        for body in ["m1", "m2", "m3"] {
            log.append(message(1, body)).await.unwrap();
        }

        let mut rx = registry.register_message_stream(9, &log).await.unwrap();

        let seq = log.append(message(1, "live")).await.unwrap();
        registry
            .fan_out_message(&MessageRecord::new(seq, message(1, "live")))
            .await;

        for expected in ["m1", "m2", "m3", "live"] {
            assert_eq!(rx.recv().await.unwrap().body, expected);
        }
    }

    #[tokio::test]
    async fn fan_out_skips_records_covered_by_replay() {
        let registry = SessionRegistry::new();
        let log = MemoryMessageLog::new();
        log.append(message(1, "m1")).await.unwrap();
        let seq2 = log.append(message(1, "m2")).await.unwrap();

        let mut rx = registry.register_message_stream(9, &log).await.unwrap();

        // 追加后、注册前发布的事件：回放已覆盖，不得重复投递
        registry
            .fan_out_message(&MessageRecord::new(seq2, message(1, "m2")))
            .await;
        registry
            .fan_out_message(&MessageRecord::new(seq2 + 1, message(1, "m3")))
            .await;

        assert_eq!(rx.recv().await.unwrap().body, "m1");
        assert_eq!(rx.recv().await.unwrap().body, "m2");
        assert_eq!(rx.recv().await.unwrap().body, "m3");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn out_of_order_fan_out_still_delivers_earlier_records() {
        let registry = SessionRegistry::new();
        let log = MemoryMessageLog::new();
        let mut rx = registry.register_message_stream(9, &log).await.unwrap();

        // 并发发布者下高序号事件可能先到，低序号随后仍须投递
        registry
            .fan_out_message(&MessageRecord::new(2, message(1, "m2")))
            .await;
        registry
            .fan_out_message(&MessageRecord::new(1, message(1, "m1")))
            .await;

        assert_eq!(rx.recv().await.unwrap().body, "m2");
        assert_eq!(rx.recv().await.unwrap().body, "m1");
    }

    #[tokio::test]
    async fn second_registration_replaces_and_closes_prior_stream() {
        let registry = SessionRegistry::new();
        let log = MemoryMessageLog::new();

        let mut old_rx = registry.register_message_stream(9, &log).await.unwrap();
        let _new_rx = registry.register_message_stream(9, &log).await.unwrap();

        // 旧发送端已被覆盖丢弃，旧接收端结束
        assert!(old_rx.recv().await.is_none());
        assert_eq!(registry.message_stream_count().await, 1);
    }

    #[tokio::test]
    async fn writes_to_closed_handles_are_swallowed() {
        let registry = SessionRegistry::new();
        let log = MemoryMessageLog::new();

        let rx = registry.register_message_stream(9, &log).await.unwrap();
        drop(rx);

        let seq = log.append(message(1, "hi")).await.unwrap();
        // 不得 panic，也不得影响其他句柄
        registry
            .fan_out_message(&MessageRecord::new(seq, message(1, "hi")))
            .await;
    }

    #[tokio::test]
    async fn deregister_is_idempotent() {
        let registry = SessionRegistry::new();
        let _rx = registry.register_roster_stream(9).await;

        assert!(registry.deregister_roster_stream(9).await);
        assert!(!registry.deregister_roster_stream(9).await);
    }

    #[tokio::test]
    async fn roster_fan_out_retransmits_full_list() {
        let registry = SessionRegistry::new();
        let mut rx_a = registry.register_roster_stream(1).await;
        let mut rx_b = registry.register_roster_stream(2).await;

        let users = vec![
            User::new_online(1, "a", "a.png"),
            User {
                id: 2,
                name: "b".into(),
                avatar: "b.png".into(),
                status: UserStatus::Offline,
            },
        ];
        registry.fan_out_roster(&users).await;
        registry.fan_out_roster(&users).await;

        assert_eq!(rx_a.recv().await.unwrap(), users);
        assert_eq!(rx_a.recv().await.unwrap(), users);
        assert_eq!(rx_b.recv().await.unwrap(), users);
    }
}
