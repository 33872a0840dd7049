//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/session/open         POST  打开编辑会话
//! - /api/session/close        POST  关闭会话（释放播放句柄）
//! - /api/session/status       POST  会话状态
//! - /api/generate/line        POST  单行预览（缓存优先）
//! - /api/generate/dialogue    POST  整段对话（缓存优先，完整模型）
//! - /api/cache/status         POST  整段对话是否已缓存
//! - /api/cache/stats          GET   缓存统计
//! - /api/cache/sweep          POST  清理过期条目
//! - /api/cache/clear          POST  清空缓存
//! - /api/cache/delete         POST  删除单条缓存
//! - /api/cost/estimate        POST  估算生成费用
//! - /api/playback/{handle_id} GET   播放句柄音频
//! - /ws/session/{id}          WS    会话 WebSocket（生成状态、自动播放）
//! - /ws/events                WS    全局 WebSocket（缓存清理事件）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/session/:session_id", get(handlers::websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/session", session_routes())
        .nest("/generate", generate_routes())
        .nest("/cache", cache_routes())
        .route("/cost/estimate", post(handlers::estimate_cost))
        .route("/playback/:handle_id", get(handlers::get_playback_audio))
}

/// Session 路由
fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/open", post(handlers::open_session))
        .route("/close", post(handlers::close_session))
        .route("/status", post(handlers::session_status))
}

/// Generate 路由
fn generate_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/line", post(handlers::generate_line))
        .route("/dialogue", post(handlers::generate_dialogue))
}

/// Cache 路由
fn cache_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", post(handlers::dialogue_cache_status))
        .route("/stats", get(handlers::cache_stats))
        .route("/sweep", post(handlers::sweep_cache))
        .route("/clear", post(handlers::clear_cache))
        .route("/delete", post(handlers::delete_cache_entry))
}
