//! 变更总线事件
//!
//! 总线只承载两类事件：消息入库、用户状态变更。
//! 用户变更事件的负载仅作提示，监听端总是重新拉取权威用户列表。

use serde::{Deserialize, Serialize};

use crate::entities::{MessageRecord, User};

/// 变更总线事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// 新消息已追加到消息日志
    MessagePosted(MessageRecord),
    /// 用户上线/下线或资料更新
    UserChanged(User),
}
