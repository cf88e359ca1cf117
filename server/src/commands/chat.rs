// Chat Commands
//
// WebSocket 入口：把 axum 的 WebSocket 适配成文本帧流交给连接处理器

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{future, SinkExt, StreamExt};

use crate::infrastructure::AppState;
use crate::modules::chat::SessionId;
use crate::shared::ServerFrame;

/// WebSocket 升级
pub async fn chat_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, raw_session_id: String) {
    let (ws_tx, ws_rx) = socket.split();

    let outbound = Box::pin(ws_tx.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(WsMessage::Text(text.into())))
    }));

    let session_id = match SessionId::parse(&raw_session_id) {
        Ok(id) => id,
        Err(_) => {
            reject(outbound, &raw_session_id).await;
            return;
        }
    };

    // 只转发文本帧，收到 Close 时结束
    let inbound = Box::pin(
        ws_rx
            .take_while(|msg| future::ready(!matches!(msg, Ok(WsMessage::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(WsMessage::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            }),
    );

    state
        .connection_handler
        .serve(session_id, inbound, outbound)
        .await;
}

/// 会话 ID 无法解析：发送 not_found 后关闭
async fn reject<O>(mut outbound: O, raw_session_id: &str)
where
    O: futures::Sink<String> + Unpin,
{
    tracing::warn!(
        "[ChatWs] Rejecting connection with invalid session id {:?}",
        raw_session_id
    );
    if let Ok(text) = serde_json::to_string(&ServerFrame::not_found(raw_session_id)) {
        let _ = outbound.send(text).await;
    }
    let _ = outbound.close().await;
}
