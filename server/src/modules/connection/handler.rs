use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use super::domain::ConnectionHandle;
use super::registry::ConnectionRegistry;
use crate::modules::chat::domain::SessionId;
use crate::modules::chat::{ApplicationError, ChatModule, GetSessionQuery, SendMessageCommand};
use crate::shared::{ClientMessage, ServerFrame};

/// 连接处理器
///
/// 负责一个客户端连接的完整生命周期：
/// 校验会话、注册到注册表、启动写任务、在当前任务中读取消息，断开时注销。
///
/// 与传输层解耦：入站是文本帧流，出站是文本帧 Sink，WebSocket 适配在 HTTP 层完成
pub struct ConnectionHandler {
    chat: Arc<ChatModule>,
    registry: Arc<ConnectionRegistry>,
    send_queue_capacity: usize,
}

impl ConnectionHandler {
    pub fn new(
        chat: Arc<ChatModule>,
        registry: Arc<ConnectionRegistry>,
        send_queue_capacity: usize,
    ) -> Self {
        Self {
            chat,
            registry,
            send_queue_capacity: send_queue_capacity.max(1),
        }
    }

    /// 服务一个连接直到断开
    pub async fn serve<I, O, E>(&self, session_id: SessionId, mut inbound: I, mut outbound: O)
    where
        I: Stream<Item = Result<String, E>> + Unpin + Send,
        E: Display,
        O: Sink<String> + Unpin + Send + 'static,
        O::Error: Display,
    {
        if !self.session_exists(session_id).await {
            tracing::warn!(
                session_id = %session_id,
                "[ConnectionHandler] Rejecting connection for unknown session"
            );
            if let Ok(text) = serde_json::to_string(&ServerFrame::not_found(session_id)) {
                let _ = outbound.send(text).await;
            }
            let _ = outbound.close().await;
            return;
        }

        let (tx, rx) = mpsc::channel(self.send_queue_capacity);
        let handle = ConnectionHandle::new(session_id, tx);
        let connection_id = handle.id();
        self.registry.register(handle.clone());
        tracing::info!(
            session_id = %session_id,
            "[ConnectionHandler] {} connected",
            connection_id
        );

        let mut writer = tokio::spawn(write_frames(rx, outbound));
        let mut writer_done = false;

        loop {
            tokio::select! {
                inbound_msg = inbound.next() => {
                    let text = match inbound_msg {
                        Some(Ok(text)) => text,
                        Some(Err(e)) => {
                            tracing::warn!(
                                session_id = %session_id,
                                "[ConnectionHandler] Receive error on {}: {}",
                                connection_id,
                                e
                            );
                            break;
                        }
                        None => break,
                    };

                    if !self.handle_text(session_id, &handle, &text).await {
                        break;
                    }
                }
                _ = &mut writer => {
                    writer_done = true;
                    break;
                }
            }
        }

        self.registry.unregister(session_id, &connection_id);
        drop(handle);

        if !writer_done {
            let _ = writer.await;
        }

        tracing::info!(
            session_id = %session_id,
            "[ConnectionHandler] {} disconnected",
            connection_id
        );
    }

    async fn session_exists(&self, session_id: SessionId) -> bool {
        match self.chat.get_session(GetSessionQuery::new(session_id)).await {
            Ok(response) => response.session.is_some(),
            Err(e) => {
                tracing::error!("[ConnectionHandler] Session lookup failed: {}", e);
                false
            }
        }
    }

    /// 处理一条入站文本，返回 false 表示应结束连接
    async fn handle_text(&self, session_id: SessionId, handle: &ConnectionHandle, text: &str) -> bool {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(session_id = %session_id, "[ConnectionHandler] Invalid JSON: {}", e);
                return handle
                    .send(ServerFrame::bad_request("Invalid message format"))
                    .await;
            }
        };

        if message.message.is_empty() {
            tracing::debug!(session_id = %session_id, "[ConnectionHandler] Ignoring empty message");
            return true;
        }

        tracing::info!(
            session_id = %session_id,
            "[ConnectionHandler] Received message: {}",
            message.message
        );

        let command = SendMessageCommand::new(session_id, message.message);
        match self.chat.send_message(command).await {
            Ok(_) => handle.send(ServerFrame::ack()).await,
            Err(ApplicationError::SessionNotFound(_)) => {
                // 会话在连接期间被删除
                handle.send(ServerFrame::not_found(session_id)).await;
                false
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    "[ConnectionHandler] Failed to process message: {}",
                    e
                );
                handle.send(ServerFrame::apology()).await
            }
        }
    }
}

/// 写任务：按顺序写出发送队列中的帧，遇到终止帧后关闭连接
async fn write_frames<O>(mut rx: mpsc::Receiver<ServerFrame>, mut outbound: O)
where
    O: Sink<String> + Unpin,
    O::Error: Display,
{
    while let Some(frame) = rx.recv().await {
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("[ConnectionWriter] Failed to serialize {}: {}", frame.kind(), e);
                continue;
            }
        };

        if let Err(e) = outbound.send(text).await {
            tracing::debug!("[ConnectionWriter] Client write failed: {}", e);
            break;
        }

        if frame.is_terminal() {
            break;
        }
    }

    let _ = outbound.close().await;
}
