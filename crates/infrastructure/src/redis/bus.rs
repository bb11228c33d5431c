//! Redis 变更总线
//!
//! 两条 Pub/Sub 频道分别承载"消息入库"与"用户变更"事件，
//! 使多个服务实例共享同一份存储时也能互相扇出。
//!
//! 发布端把事件序列化后发到对应频道；后台订阅泵把两条频道上
//! 收到的负载反序列化成事件，转发进本进程的 broadcast 通道，
//! 订阅方统一从该通道消费。断线后按指数退避重连。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ::redis::AsyncCommands;
use application::{BusError, EventBus};
use async_trait::async_trait;
use config::{RedisConfig, RoomConfig};
use domain::{ChatEvent, MessageRecord, User};
use futures_util::stream::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};

use super::{get_connection, RedisError, RedisResult};

pub struct RedisEventBus {
    client: Arc<::redis::Client>,
    room: RoomConfig,
    redis: RedisConfig,
    local: broadcast::Sender<ChatEvent>,
    shutdown_signal: Arc<AtomicBool>,
}

impl RedisEventBus {
    pub fn new(
        client: Arc<::redis::Client>,
        room: RoomConfig,
        redis: RedisConfig,
        capacity: usize,
    ) -> Self {
        let (local, _) = broadcast::channel(capacity);
        Self {
            client,
            room,
            redis,
            local,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 启动后台订阅泵
    ///
    /// 泵退出前持续把远端事件转发到本地通道；连接失败按
    /// 指数退避重连，超过最大次数后放弃并记录错误。
    pub fn start(&self) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let room = self.room.clone();
        let redis = self.redis.clone();
        let local = self.local.clone();
        let shutdown_signal = Arc::clone(&self.shutdown_signal);

        tokio::spawn(async move {
            let mut retry_count: u32 = 0;

            while !shutdown_signal.load(Ordering::Relaxed) {
                match Self::listen(&client, &room, &local, &shutdown_signal).await {
                    Ok(()) => {
                        info!("Redis 订阅泵正常退出");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Redis 订阅泵异常");
                        retry_count += 1;

                        if retry_count >= redis.max_reconnect_attempts {
                            error!("连接失败，已达最大重试次数");
                            break;
                        }

                        let delay = Duration::from_millis(
                            redis.reconnect_interval_ms * 2_u64.pow(retry_count - 1),
                        );
                        sleep(delay).await;
                    }
                }
            }

            info!("Redis 订阅泵已停止");
        })
    }

    /// 优雅关闭订阅泵
    pub fn shutdown(&self) {
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }

    async fn listen(
        client: &::redis::Client,
        room: &RoomConfig,
        local: &broadcast::Sender<ChatEvent>,
        shutdown_signal: &Arc<AtomicBool>,
    ) -> RedisResult<()> {
        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| RedisError::connection(format!("获取 PubSub 连接失败: {e}")))?;

        for channel in [&room.message_channel, &room.user_channel] {
            pubsub
                .subscribe(channel)
                .await
                .map_err(|e| RedisError::subscribe(format!("订阅频道 {channel} 失败: {e}")))?;
        }

        info!(
            message_channel = %room.message_channel,
            user_channel = %room.user_channel,
            "已订阅变更频道"
        );

        loop {
            if shutdown_signal.load(Ordering::Relaxed) {
                return Ok(());
            }

            // 带超时轮询，保证关闭信号及时生效
            match timeout(Duration::from_millis(1000), async {
                pubsub.on_message().next().await
            })
            .await
            {
                Ok(Some(msg)) => {
                    let channel = msg.get_channel_name().to_string();
                    let payload: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            error!(error = %e, "获取消息负载失败");
                            continue;
                        }
                    };

                    match Self::decode(room, &channel, &payload) {
                        Ok(event) => {
                            // 本进程暂无订阅者时丢弃即可
                            let _ = local.send(event);
                        }
                        Err(e) => {
                            warn!(channel, error = %e, "丢弃无法解析的总线负载");
                        }
                    }
                }
                Ok(None) => {
                    // Stream 结束，触发重连
                    return Err(RedisError::connection("PubSub 流已断开"));
                }
                Err(_) => {
                    // 超时，继续循环检查关闭信号
                    continue;
                }
            }
        }
    }

    /// 按频道解出事件：消息频道承载带序号的消息，用户频道承载用户记录
    fn decode(room: &RoomConfig, channel: &str, payload: &str) -> RedisResult<ChatEvent> {
        if channel == room.message_channel {
            let record: MessageRecord = serde_json::from_str(payload)
                .map_err(|e| RedisError::serialization(format!("反序列化消息事件失败: {e}")))?;
            Ok(ChatEvent::MessagePosted(record))
        } else if channel == room.user_channel {
            let user: User = serde_json::from_str(payload)
                .map_err(|e| RedisError::serialization(format!("反序列化用户事件失败: {e}")))?;
            Ok(ChatEvent::UserChanged(user))
        } else {
            Err(RedisError::serialization(format!("未知频道: {channel}")))
        }
    }
}

impl Drop for RedisEventBus {
    fn drop(&mut self) {
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, event: ChatEvent) -> Result<(), BusError> {
        let (channel, payload) = match &event {
            ChatEvent::MessagePosted(record) => (
                self.room.message_channel.as_str(),
                serde_json::to_string(record),
            ),
            ChatEvent::UserChanged(user) => (
                self.room.user_channel.as_str(),
                serde_json::to_string(user),
            ),
        };
        let payload = payload.map_err(|e| BusError::publish(format!("序列化事件失败: {e}")))?;

        let mut conn = get_connection(&self.client)
            .await
            .map_err(|e| BusError::publish(e.to_string()))?;
        let subscriber_count: u32 = conn
            .publish(channel, payload)
            .await
            .map_err(|e| BusError::publish(format!("发布到频道 {channel} 失败: {e}")))?;

        debug!(channel, subscriber_count, "事件已发布");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.local.subscribe()
    }
}
