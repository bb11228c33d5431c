//! 主应用程序入口
//!
//! 装配 Redis 存储、事件总线与会话注册表，启动 Axum Web 服务。

use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, EventBus, FanoutListener, SessionRegistry,
};
use config::AppConfig;
use domain::{MessageRepository, UserRepository};
use infrastructure::{RedisEventBus, RedisMessageRepository, RedisUserRepository};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env();
    tracing::info!(redis_url = %config.redis.url, "连接 Redis");

    let client = Arc::new(redis::Client::open(config.redis.url.as_str())?);

    // Redis 存储：用户哈希 + 消息列表
    let user_repository: Arc<dyn UserRepository> = Arc::new(RedisUserRepository::new(
        client.clone(),
        config.room.users_key.clone(),
    ));
    let message_repository: Arc<dyn MessageRepository> = Arc::new(RedisMessageRepository::new(
        client.clone(),
        config.room.messages_key.clone(),
    ));

    // 事件总线：发布走 Redis 频道，订阅泵把远端事件转回本地通道
    let bus = Arc::new(RedisEventBus::new(
        client,
        config.room.clone(),
        config.redis.clone(),
        config.broadcast.capacity,
    ));
    let _pump = bus.start();

    // 会话注册表与扇出监听
    let registry = Arc::new(SessionRegistry::new());
    FanoutListener::spawn(bus.subscribe(), registry.clone(), user_repository.clone());

    let chat_service = ChatService::new(ChatServiceDependencies {
        user_repository,
        message_repository,
        bus: bus as Arc<dyn EventBus>,
        registry,
    });

    let app = router(AppState::new(Arc::new(chat_service)));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天服务器启动在 http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
