//! Dialogue Context - Aggregate Root

use serde::{Deserialize, Serialize};

use super::{DialogueError, DialogueLine, DialogueTurn, ModelMode, Speaker};
use crate::domain::audio_tags::strip_audio_tags;

/// 单行生成请求（已校验）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub line_id: String,
    /// 快速模式下已剥离标签
    pub text: String,
    pub voice_id: String,
}

/// Dialogue 聚合根（只读投影）
///
/// 不变量:
/// - lines 顺序即说话顺序
/// - 解析 turn 时只读，不修改实体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    #[serde(default)]
    pub lines: Vec<DialogueLine>,
    #[serde(default)]
    pub speakers: Vec<Speaker>,
}

impl Dialogue {
    pub fn new(lines: Vec<DialogueLine>, speakers: Vec<Speaker>) -> Self {
        Self { lines, speakers }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, line_id: &str) -> Option<&DialogueLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn speaker(&self, speaker_id: &str) -> Option<&Speaker> {
        self.speakers.iter().find(|s| s.id == speaker_id)
    }

    pub fn speaker_for_line(&self, line_id: &str) -> Option<&Speaker> {
        self.line(line_id).and_then(|l| self.speaker(&l.speaker_id))
    }

    /// 不校验地转换为 turns，未分配音色的行得到空 voice_id
    ///
    /// 用于探测整段对话是否已缓存
    pub fn to_turns(&self) -> Vec<DialogueTurn> {
        self.lines
            .iter()
            .map(|line| {
                let voice_id = self
                    .speaker(&line.speaker_id)
                    .map(|s| s.voice_id.clone())
                    .unwrap_or_default();
                DialogueTurn::new(line.text.clone(), voice_id)
            })
            .collect()
    }

    /// 解析并校验单行生成请求
    ///
    /// 快速模式剥离内联标签；剥离后为空返回 `TagsOnly`，
    /// 与原文即为空的 `EmptyText` 区分
    pub fn resolve_line(&self, line_id: &str, mode: ModelMode) -> Result<LineRequest, DialogueError> {
        let line = self
            .line(line_id)
            .ok_or_else(|| DialogueError::LineNotFound(line_id.to_string()))?;

        if line.text.trim().is_empty() {
            return Err(DialogueError::EmptyText {
                line_id: line_id.to_string(),
            });
        }

        let speaker = self.speaker(&line.speaker_id);
        let voice_id = speaker
            .and_then(Speaker::assigned_voice)
            .ok_or_else(|| DialogueError::MissingVoice {
                speaker: speaker.map(Speaker::display_name).unwrap_or("Unknown").to_string(),
            })?;

        let text = if mode.is_fast() {
            let stripped = strip_audio_tags(&line.text);
            if stripped.trim().is_empty() {
                return Err(DialogueError::TagsOnly {
                    line_id: line_id.to_string(),
                });
            }
            stripped
        } else {
            line.text.clone()
        };

        Ok(LineRequest {
            line_id: line_id.to_string(),
            text,
            voice_id: voice_id.to_string(),
        })
    }

    /// 解析并校验整段对话的 turns
    ///
    /// 在任何生成开始前按文档顺序检查全部行
    pub fn resolve_turns(&self) -> Result<Vec<DialogueTurn>, DialogueError> {
        if self.lines.is_empty() {
            return Err(DialogueError::NoLines);
        }

        let mut turns = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if line.text.trim().is_empty() {
                return Err(DialogueError::EmptyLineText {
                    line_id: line.id.clone(),
                });
            }
            let speaker = self.speaker(&line.speaker_id);
            let voice_id = speaker.and_then(Speaker::assigned_voice).ok_or_else(|| {
                DialogueError::MissingVoice {
                    speaker: speaker.map(Speaker::display_name).unwrap_or("Unknown").to_string(),
                }
            })?;
            turns.push(DialogueTurn::new(line.text.clone(), voice_id));
        }

        Ok(turns)
    }
}
