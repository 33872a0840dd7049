//! 内联音频标签
//!
//! `[excited]`、`[clears throat]`、`[/whispers]` 这类标注只有对话接口识别，
//! 快速模型不支持，生成前需要剥离。标签不计入计费字符。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::domain::dialogue::{DialogueLine, ModelMode};

static OPENING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[A-Za-z0-9_\s-]+\]").expect("valid opening tag regex"));

static CLOSING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[/[A-Za-z0-9_\s-]+\]").expect("valid closing tag regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// 去掉标签，不整理空白
fn remove_tags(text: &str) -> String {
    let without_open = OPENING_TAG.replace_all(text, "");
    CLOSING_TAG.replace_all(&without_open, "").into_owned()
}

/// 剥离音频标签，合并连续空白并去掉首尾空白
pub fn strip_audio_tags(text: &str) -> String {
    let without_tags = remove_tags(text);
    WHITESPACE_RUN
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// 计费字符数（不含标签）
pub fn billable_character_count(lines: &[DialogueLine]) -> usize {
    lines
        .iter()
        .map(|line| remove_tags(&line.text).chars().count())
        .sum()
}

/// 费用估算
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub character_count: usize,
    pub estimated_credits: f64,
    pub credits_per_char: f64,
}

/// 估算整段对话的生成费用
pub fn estimate_cost(lines: &[DialogueLine], mode: ModelMode) -> CostEstimate {
    let character_count = billable_character_count(lines);
    let credits_per_char = mode.credits_per_char();
    CostEstimate {
        character_count,
        estimated_credits: character_count as f64 * credits_per_char,
        credits_per_char,
    }
}
