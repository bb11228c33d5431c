//! 消息实体
//!
//! 消息创建后不可变，发送者的名字与头像在发送时刻快照，
//! 之后的改名不会回溯影响历史消息。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::user::{User, UserId};

/// 单条聊天消息
///
/// 字段命名对齐持久化记录格式：`id` 为发送者 id，`message` 为正文。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "id")]
    pub sender_id: UserId,
    #[serde(rename = "senderName")]
    pub sender_name: String,
    #[serde(rename = "senderAvatar")]
    pub sender_avatar: String,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// 基于发送者当前资料构造消息快照
    pub fn from_sender(sender: &User, body: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            sender_id: sender.id,
            sender_name: sender.name.clone(),
            sender_avatar: sender.avatar.clone(),
            body: body.into(),
            sent_at,
        }
    }
}

/// 带日志位点的消息
///
/// `seq` 为消息日志中的追加序号（从 1 开始），回放与实时推送的
/// 交接依赖它去重：同一条流对 `seq` 不大于已回放位点的事件跳过。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub seq: u64,
    pub message: Message,
}

impl MessageRecord {
    pub fn new(seq: u64, message: Message) -> Self {
        Self { seq, message }
    }
}
