//! WebSocket 连接层
//!
//! 每条连接拆分为发送/接收两个任务：发送任务把业务层推来的帧序列化
//! 后写入套接字，接收任务只负责心跳与关闭帧。任一任务结束即视为
//! 连接断开，随后恰好一次地向业务层释放订阅。

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

use domain::{User, UserId};

use crate::state::AppState;

/// 花名册流的单帧：当前全量用户列表
#[derive(Debug, Serialize)]
struct RosterFrame {
    users: Vec<User>,
}

/// 消息流连接：历史回放 + 实时消息，每条消息一个 JSON 文本帧
pub async fn run_message_stream(mut socket: WebSocket, state: AppState, user_id: UserId) {
    let receiver = match state.chat_service.subscribe_messages(user_id).await {
        Ok(receiver) => receiver,
        Err(err) => {
            // 未知用户或存储故障：不发任何帧，直接关闭
            tracing::warn!(user_id, error = %err, "消息流订阅失败，关闭连接");
            let _ = socket.close().await;
            return;
        }
    };

    tracing::info!(user_id, "消息流连接已建立");
    pump(socket, receiver).await;

    if let Err(err) = state.chat_service.release_messages(user_id).await {
        tracing::error!(user_id, error = %err, "消息流释放失败");
    }
    tracing::info!(user_id, "消息流连接已断开");
}

/// 花名册流连接：每次成员变更推送一帧全量列表
pub async fn run_roster_stream(mut socket: WebSocket, state: AppState, user_id: UserId) {
    let receiver = match state.chat_service.subscribe_roster(user_id).await {
        Ok(receiver) => receiver,
        Err(err) => {
            tracing::warn!(user_id, error = %err, "花名册流订阅失败，关闭连接");
            let _ = socket.close().await;
            return;
        }
    };

    tracing::info!(user_id, "花名册流连接已建立");
    let receiver = map_roster(receiver);
    pump(socket, receiver).await;

    if let Err(err) = state.chat_service.release_roster(user_id).await {
        tracing::error!(user_id, error = %err, "花名册流释放失败");
    }
    tracing::info!(user_id, "花名册流连接已断开");
}

/// 把用户列表批次包装成帧类型，复用同一个泵
fn map_roster(mut receiver: mpsc::UnboundedReceiver<Vec<User>>) -> mpsc::UnboundedReceiver<RosterFrame> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(users) = receiver.recv().await {
            if tx.send(RosterFrame { users }).is_err() {
                break;
            }
        }
    });
    rx
}

/// 连接主循环：序列化出站帧、消化入站帧，任一侧结束就收尾
async fn pump<T>(socket: WebSocket, mut receiver: mpsc::UnboundedReceiver<T>)
where
    T: Serialize + Send + 'static,
{
    let (mut sender, mut incoming) = socket.split();

    // 发送任务：业务层句柄关闭（下游被顶替或服务停止）时自然结束
    let mut send_task = tokio::spawn(async move {
        while let Some(item) = receiver.recv().await {
            let payload = match serde_json::to_string(&item) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "出站帧序列化失败，跳过");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // 接收任务：客户端不发业务数据，只消化心跳并等待关闭帧
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = incoming.next().await {
            if matches!(frame, WsMessage::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}
