//! WebSocket Handlers
//!
//! 会话通道推送生成状态与自动播放请求；全局通道推送缓存维护事件

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

/// 会话 WebSocket
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_socket(socket, session_id, state))
}

/// 全局 WebSocket
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, state))
}

/// 把广播事件转发到 socket，直到通道关闭或发送失败
async fn forward_events(
    mut sender: SplitSink<WebSocket, Message>,
    mut event_rx: broadcast::Receiver<WsEvent>,
    label: String,
) {
    loop {
        let event = match event_rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(channel = %label, skipped = skipped, "WebSocket receiver lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let closing = matches!(event, WsEvent::SessionClosed { .. });
        let msg = match serde_json::to_string(&event) {
            Ok(json) => Message::Text(json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize event");
                continue;
            }
        };

        if let Err(e) = sender.send(msg).await {
            tracing::debug!(channel = %label, error = %e, "Failed to send WebSocket message");
            break;
        }

        if closing {
            let _ = sender.close().await;
            break;
        }
    }
}

async fn handle_session_socket(socket: WebSocket, session_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    if !state.session_manager.is_valid(&session_id) {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
        let _ = sender.close().await;
        return;
    }

    let event_rx = state.event_publisher.register_session(&session_id);

    tracing::info!(session_id = %session_id, "WebSocket connected");

    let forward_task = tokio::spawn(forward_events(sender, event_rx, session_id.clone()));

    // 客户端任意消息都视为活跃
    let session_manager = state.session_manager.clone();
    let session_id_for_receive = session_id.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_for_receive, "WebSocket closed by client");
                    break;
                }
                Ok(_) => session_manager.touch(&session_id_for_receive),
                Err(e) => {
                    tracing::debug!(session_id = %session_id_for_receive, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    // 会话仍在时保留通道，重连后可继续接收
    if !state.session_manager.is_valid(&session_id) {
        state.event_publisher.unregister_session(&session_id);
    }
    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}

async fn handle_global_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let event_rx = state.event_publisher.subscribe_global();

    tracing::info!("Global WebSocket connected");

    let forward_task = tokio::spawn(forward_events(sender, event_rx, "global".to_string()));

    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Global WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Global WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!("Global WebSocket disconnected");
}
