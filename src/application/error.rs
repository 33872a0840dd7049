//! 应用层错误定义
//!
//! 统一的命令/查询错误类型。存储层错误不会出现在这里：缓存总是降级处理。

use thiserror::Error;

use crate::application::ports::SessionError;
use crate::domain::cache_key::CacheKeyError;
use crate::domain::dialogue::DialogueError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 生成前校验失败（用户可修正）
    #[error(transparent)]
    Validation(#[from] DialogueError),

    /// 合成失败，携带底层错误信息
    #[error("Generation failed: {0}")]
    Synthesis(String),

    /// 会话不存在
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// 生成过程中会话已关闭，结果被丢弃
    #[error("Session closed during generation: {0}")]
    SessionClosed(String),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 是否为用户输入问题
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<SessionError> for ApplicationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::SessionNotFound(id),
            SessionError::AlreadyExists(id) => {
                Self::InternalError(format!("Session already exists: {}", id))
            }
        }
    }
}

impl From<CacheKeyError> for ApplicationError {
    fn from(err: CacheKeyError) -> Self {
        Self::InternalError(err.to_string())
    }
}
