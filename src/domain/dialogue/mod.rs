//! Dialogue Context - 对话限界上下文
//!
//! 职责:
//! - 文档层只读投影（行、说话人）
//! - 说话轮次解析
//! - 生成前校验

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{Dialogue, LineRequest};
pub use entities::{DialogueLine, Speaker};
pub use errors::DialogueError;
pub use value_objects::{DialogueTurn, ModelMode, FAST_MODEL_ID, FULL_MODEL_ID};
