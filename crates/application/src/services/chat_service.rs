//! 聊天协调器
//!
//! 实现四个面向客户端的用例：加入、发消息、订阅消息流、订阅
//! 花名册流，并负责流关闭时的注销与下线。订阅与断开共享同一
//! 用户状态机：OFFLINE --加入/订阅--> ONLINE --断开--> OFFLINE，
//! 无终止态。

use std::sync::Arc;

use chrono::Utc;
use domain::{
    ChatEvent, DomainError, Message, MessageRecord, MessageRepository, User, UserId,
    UserRepository,
};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::info;

use crate::{broadcaster::EventBus, error::ApplicationError, registry::SessionRegistry};

#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub sender_id: UserId,
    pub body: String,
}

pub struct ChatServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub bus: Arc<dyn EventBus>,
    pub registry: Arc<SessionRegistry>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 加入房间：创建新用户或重新激活同名离线用户
    ///
    /// 每次成功调用恰好发布一条用户变更事件。
    pub async fn join(&self, request: JoinRequest) -> Result<UserId, ApplicationError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty").into());
        }
        let avatar = request.avatar.trim();
        if avatar.is_empty() {
            return Err(DomainError::invalid_argument("avatar", "cannot be empty").into());
        }

        let normalized = User::normalize_name(name);
        let user = match self.deps.user_repository.find_by_name(&normalized).await? {
            Some(existing) if existing.is_online() => {
                return Err(DomainError::already_online(existing.name).into());
            }
            Some(mut existing) => {
                existing.reactivate(name, avatar);
                let user = self.deps.user_repository.update(existing).await?;
                info!(user_id = user.id, name = %user.name, "用户重新激活");
                user
            }
            None => {
                let id = self.allocate_user_id().await?;
                let user = self
                    .deps
                    .user_repository
                    .create(User::new_online(id, name, avatar))
                    .await?;
                info!(user_id = user.id, name = %user.name, "新用户加入");
                user
            }
        };

        let id = user.id;
        self.deps.bus.publish(ChatEvent::UserChanged(user)).await?;
        Ok(id)
    }

    /// 发送消息：以发送者当前资料做快照，追加日志并发布事件
    ///
    /// 每次接受的调用恰好追加一次；无幂等键，客户端重试可能产生
    /// 重复消息。
    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<(), ApplicationError> {
        if request.sender_id <= 0 {
            return Err(DomainError::invalid_argument("id", "must be set").into());
        }
        if request.body.trim().is_empty() {
            return Err(DomainError::invalid_argument("message", "cannot be empty").into());
        }

        let sender = self
            .deps
            .user_repository
            .find_by_id(request.sender_id)
            .await?
            .ok_or(DomainError::user_not_found(request.sender_id))?;

        let message = Message::from_sender(&sender, request.body, Utc::now());
        let seq = self.deps.message_repository.append(message.clone()).await?;
        self.deps
            .bus
            .publish(ChatEvent::MessagePosted(MessageRecord::new(seq, message)))
            .await?;
        Ok(())
    }

    /// 订阅消息流：回放完整历史后接入实时扇出
    ///
    /// 未知用户返回错误，接入层将其表现为立即结束的空流。
    pub async fn subscribe_messages(
        &self,
        user_id: UserId,
    ) -> Result<mpsc::UnboundedReceiver<Message>, ApplicationError> {
        let user = self.mark_online(user_id).await?;

        let receiver = self
            .deps
            .registry
            .register_message_stream(user_id, self.deps.message_repository.as_ref())
            .await?;

        self.deps.bus.publish(ChatEvent::UserChanged(user)).await?;
        info!(user_id, "消息流已订阅");
        Ok(receiver)
    }

    /// 订阅花名册流
    ///
    /// 先登记句柄再发布用户变更事件，事件经监听端扇出全量列表，
    /// 新句柄由此收到首帧快照。
    pub async fn subscribe_roster(
        &self,
        user_id: UserId,
    ) -> Result<mpsc::UnboundedReceiver<Vec<User>>, ApplicationError> {
        let user = self.mark_online(user_id).await?;

        let receiver = self.deps.registry.register_roster_stream(user_id).await;

        self.deps.bus.publish(ChatEvent::UserChanged(user)).await?;
        info!(user_id, "花名册流已订阅");
        Ok(receiver)
    }

    /// 消息流关闭：注销句柄并下线
    ///
    /// 由连接层在流结束时调用，每个订阅恰好一次。
    pub async fn release_messages(&self, user_id: UserId) -> Result<(), ApplicationError> {
        self.deps.registry.deregister_message_stream(user_id).await;
        self.mark_offline(user_id).await
    }

    /// 花名册流关闭：注销句柄并下线
    pub async fn release_roster(&self, user_id: UserId) -> Result<(), ApplicationError> {
        self.deps.registry.deregister_roster_stream(user_id).await;
        self.mark_offline(user_id).await
    }

    /// 上线（重复上线幂等），持久化后返回最新用户记录
    async fn mark_online(&self, user_id: UserId) -> Result<User, ApplicationError> {
        let mut user = self
            .deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::user_not_found(user_id))?;
        user.go_online();
        let user = self.deps.user_repository.update(user).await?;
        Ok(user)
    }

    async fn mark_offline(&self, user_id: UserId) -> Result<(), ApplicationError> {
        let mut user = self
            .deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::user_not_found(user_id))?;
        user.go_offline();
        let user = self.deps.user_repository.update(user).await?;
        self.deps.bus.publish(ChatEvent::UserChanged(user)).await?;
        info!(user_id, "用户已下线");
        Ok(())
    }

    /// 分配随机用户 id，并校验不与现有用户冲突
    async fn allocate_user_id(&self) -> Result<UserId, ApplicationError> {
        loop {
            let candidate: UserId = rand::rng().random_range(1..i64::MAX);
            if self
                .deps
                .user_repository
                .find_by_id(candidate)
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
        }
    }
}
