//! Session Commands - 会话相关命令

/// 打开编辑会话命令
#[derive(Debug, Clone, Default)]
pub struct OpenSessionCommand;

/// 打开会话响应
#[derive(Debug, Clone)]
pub struct OpenSessionResponse {
    pub session_id: String,
}

/// 关闭会话命令
#[derive(Debug, Clone)]
pub struct CloseSessionCommand {
    pub session_id: String,
}

/// 关闭会话响应
#[derive(Debug, Clone)]
pub struct CloseSessionResponse {
    pub session_id: String,
    /// 是否释放了播放句柄
    pub released_playback: bool,
}
