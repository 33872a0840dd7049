//! Dialogue Context - Errors
//!
//! 生成前校验错误，均可由用户修正输入

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogueError {
    #[error("Add some dialogue lines first")]
    NoLines,

    #[error("Line not found: {0}")]
    LineNotFound(String),

    #[error("Line has no text")]
    EmptyText { line_id: String },

    #[error("Line only contains audio tags - no text to generate")]
    TagsOnly { line_id: String },

    #[error("All lines must have text (line {line_id} is empty)")]
    EmptyLineText { line_id: String },

    #[error("Speaker \"{speaker}\" has no voice assigned")]
    MissingVoice { speaker: String },
}
