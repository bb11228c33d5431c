use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{
    ChatService, ChatServiceDependencies, EventBus, FanoutListener, LocalEventBus,
    MemoryMessageLog, MemoryUserRepository, SessionRegistry,
};
use axum::Router;
use domain::{MessageRepository, UserRepository};
use tokio::{net::TcpListener, sync::oneshot, time::sleep};
use web_api::{router, AppState};

/// 测试服务器句柄：丢弃时触发优雅停机
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    pub fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

/// 纯内存装配：内存用户仓库 + 内存消息日志 + 进程内事件总线
pub fn build_router() -> Router {
    let user_repository: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
    let message_repository: Arc<dyn MessageRepository> = Arc::new(MemoryMessageLog::new());
    let bus = Arc::new(LocalEventBus::new(64));
    let registry = Arc::new(SessionRegistry::new());

    FanoutListener::spawn(bus.subscribe(), registry.clone(), user_repository.clone());

    let chat_service = ChatService::new(ChatServiceDependencies {
        user_repository,
        message_repository,
        bus: bus as Arc<dyn EventBus>,
        registry,
    });

    router(AppState::new(Arc::new(chat_service)))
}

pub async fn spawn_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let router = build_router();

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    // allow server to start
    sleep(Duration::from_millis(100)).await;

    TestServer {
        addr,
        _shutdown: shutdown_tx,
    }
}
