//! Cost Queries - 生成费用估算

use crate::domain::dialogue::{DialogueLine, ModelMode};

/// 估算整段对话生成费用
#[derive(Debug, Clone)]
pub struct EstimateDialogueCostQuery {
    pub lines: Vec<DialogueLine>,
    pub mode: ModelMode,
}
