//! 命盤文字摘要與 AI 解盤的介面。HTTP 實作見 `adapters::openai`。

use crate::domain::model::{Astrolabe, PillarLabel, Star};
use crate::utils::error::Result;
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "你是一位精通紫微斗数与八字命理的大师。";

/// Returned when the service answers with an empty message.
pub const EMPTY_RESPONSE: &str = "无法生成分析结果。";

/// Shown to the user when the service call fails.
pub const FAILURE_MESSAGE: &str = "AI analysis failed, try again later (与命理AI连接时发生错误，请稍后再试。)";

const RESPONSE_OUTLINE: &str = "请结合用户的紫微斗数命盘与八字排盘数据（如果提供），提供一份专业、详尽且富有洞察力的中文命理分析。

请按以下 Markdown 格式组织回复：
1. **命局总纲 (Overall Destiny)**: 结合紫微命宫/身宫与八字日主强弱、格局进行综合分析。
2. **事业与财运 (Career & Wealth)**: 基于紫微（官禄、财帛）与八字（正偏财、官杀）的象义进行分析。
3. **情感与人际 (Relationships)**: 基于紫微（夫妻、交友）与八字（夫妻宫、配偶星）进行分析。
4. **流年运势 (Current Luck)**: 如果有流年数据，简单提点近期运势。
5. **造命建议 (Advice)**: 给命主的关键建议，发挥优势，规避弱点。

语气请保持专业、玄妙但又不失落地，多用鼓励性的语言。请务必使用中文回答。";

fn major_label(star: &Star) -> String {
    match star.brightness.as_deref() {
        Some(b) => format!("{}({})", star.name, b),
        None => star.name.clone(),
    }
}

/// 精簡的命盤摘要：性別、五行局、四柱十神、十二宮主星與輔星。
pub fn prepare_prompt_context(astrolabe: &Astrolabe) -> String {
    let mut context = String::from(
        "Analyze this Zi Wei Dou Shu (Purple Star Astrology) and BaZi (Eight Characters) chart.\n",
    );
    writeln!(
        context,
        "User: {} ({}), Five Elements Class: {}.",
        astrolabe.gender.english(),
        astrolabe.original_gender,
        astrolabe.five_elements_class
    )
    .ok();

    let bazi = &astrolabe.bazi;
    if !bazi.pillars.is_empty() {
        context.push_str("BaZi Chart:\n");
        for pillar in &bazi.pillars {
            let note = if pillar.label == PillarLabel::Day {
                format!("Day Master: {}", bazi.day_master)
            } else {
                pillar.stem.label().to_string()
            };
            writeln!(context, "  {:?}: {} ({})", pillar.label, pillar.pair, note).ok();
        }
        writeln!(
            context,
            "  Day Master Strength: {} ({})",
            bazi.strength.level.chinese(),
            bazi.strength.method
        )
        .ok();
        context.push('\n');
    }

    context.push_str("Zi Wei Dou Shu Chart:\n");
    for palace in &astrolabe.palaces {
        let majors: Vec<String> = palace.major_stars.iter().map(major_label).collect();
        let minors: Vec<&str> = palace.minor_stars.iter().map(|s| s.name.as_str()).collect();

        writeln!(
            context,
            "Palace: {} ({}{})",
            palace.name, palace.heavenly_stem, palace.earthly_branch
        )
        .ok();
        writeln!(context, "  Major Stars: {}", majors.join(", ")).ok();
        writeln!(context, "  Minor Stars: {}", minors.join(", ")).ok();
        if palace.is_body_palace {
            context.push_str("  [Body Palace]\n");
        }
        if palace.is_life_palace {
            context.push_str("  [Life Palace]\n");
        }
        context.push('\n');
    }

    context
}

pub fn build_user_prompt(context: &str) -> String {
    format!("\n{}\n\n{}\n", context, RESPONSE_OUTLINE)
}

/// Receives streamed output. Reasoning tokens arrive on their own channel.
pub trait TokenSink: Send {
    fn on_token(&mut self, token: &str);

    fn on_reasoning_token(&mut self, _token: &str) {}
}

/// Collects both channels into strings.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub content: String,
    pub reasoning: String,
}

impl TokenSink for CollectingSink {
    fn on_token(&mut self, token: &str) {
        self.content.push_str(token);
    }

    fn on_reasoning_token(&mut self, token: &str) {
        self.reasoning.push_str(token);
    }
}

/// 解盤服務。一次請求、無重試；失敗以 `ChartError::Analysis` 回報。
#[async_trait::async_trait]
pub trait NarrativeService: Send + Sync {
    async fn analyze(&self, astrolabe: &Astrolabe) -> Result<String>;

    async fn analyze_stream(&self, astrolabe: &Astrolabe, sink: &mut dyn TokenSink) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_wraps_context_and_outline() {
        let prompt = build_user_prompt("Palace: 命宫 (辛未)");
        assert!(prompt.starts_with("\nPalace: 命宫 (辛未)\n"));
        assert!(prompt.contains("命局总纲 (Overall Destiny)"));
        assert!(prompt.contains("造命建议 (Advice)"));
    }

    #[test]
    fn test_collecting_sink_keeps_channels_apart() {
        let mut sink = CollectingSink::default();
        sink.on_token("命");
        sink.on_reasoning_token("思考");
        sink.on_token("宫");
        assert_eq!(sink.content, "命宫");
        assert_eq!(sink.reasoning, "思考");
    }
}
