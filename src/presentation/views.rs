//! 文本视图 - 展示层
//!
//! 纯函数：输入队列快照，输出要显示的文本。不修改任何状态。

use std::fmt::Write as _;

use uuid::Uuid;

use crate::models::{rules_for_level, AnalysisResult, ItemStatus, QueueItemView};
use crate::models::{PRICING_CAUTION, PRICING_RULES};
use crate::workflow::QueueCounts;

const RULE: &str = "────────────────────────────────────────────────────────────";

/// 千分位格式，例如 70000 → "70,000"
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// 美元价格标签，整数不带小数，例如 "$7"、"$0.1"
pub fn price_tag(usd: f64) -> String {
    format!("${}", usd)
}

/// 条目的短 ID（前 8 位）
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// 屏幕覆盖率条
pub fn coverage_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) / 10;
    format!("{}{} {}%", "█".repeat(filled), "░".repeat(10 - filled), percent)
}

fn status_mark(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Idle => " ",
        ItemStatus::Analyzing => "⏳",
        ItemStatus::Success => "✓",
        ItemStatus::Error => "✗",
    }
}

fn level_text(result: &AnalysisResult) -> String {
    result
        .suggested_level
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// 队列工具栏：数量、完成数、可执行的操作
pub fn render_toolbar(counts: &QueueCounts, running: bool) -> String {
    let mut line = format!("队列 ({}) • {} 已完成", counts.total, counts.success);
    if running {
        line.push_str("   [分析中...]");
    } else if counts.pending() > 0 {
        let _ = write!(line, "   [开始批量分析: run] 待处理 {}", counts.pending());
    }
    line.push_str("   [清空: clear]");
    line
}

/// 队列列表
pub fn render_queue(items: &[QueueItemView], selected: Option<Uuid>, counts: &QueueCounts, running: bool) -> String {
    if items.is_empty() {
        return "上传礼物文件：add <文件路径>... (支持 MP4, WebM, PNG 等，可一次添加多个)".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", render_toolbar(counts, running));
    let _ = writeln!(out, "{}", RULE);

    for (index, item) in items.iter().enumerate() {
        let cursor = if selected == Some(item.id) { "▶" } else { " " };
        let _ = write!(
            out,
            "{} {:>2}. [{}] {} {}",
            cursor,
            index + 1,
            short_id(item.id),
            status_mark(item.status),
            item.file_name
        );
        if let Some(result) = &item.result {
            let _ = write!(out, "  {}", price_tag(result.suggested_price_usd));
        }
        let _ = write!(out, "\n        {:.2} MB", item.size_mb());
        if let Some(result) = &item.result {
            let _ = write!(out, " • 等级 {}", level_text(result));
        }
        match item.status {
            ItemStatus::Error | ItemStatus::Idle => {
                let _ = write!(out, "   {}", item.status.label());
            }
            _ => {}
        }
        out.push('\n');
    }
    out
}

/// 选中条目的详情面板，按状态显示不同内容
pub fn render_detail(item: &QueueItemView) -> String {
    match (&item.status, &item.result) {
        (ItemStatus::Success, Some(result)) => render_report(item, result),
        (ItemStatus::Analyzing, _) => format!("⏳ 正在分析 {}...", item.file_name),
        (ItemStatus::Error, _) => format!(
            "分析失败\n{}\n[重试失败项: retry]",
            item.error_message
                .as_deref()
                .unwrap_or("处理过程中发生未知错误。")
        ),
        _ => format!("{} 等待中，输入 run 开始批量分析。", item.file_name),
    }
}

/// 没有选中项时的提示
pub fn render_no_selection(queue_is_empty: bool) -> String {
    if queue_is_empty {
        "队列为空。".to_string()
    } else {
        "请从队列中选择一个文件查看详情。".to_string()
    }
}

/// 分析报告
pub fn render_report(item: &QueueItemView, result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "分析报告: {}", item.file_name);
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "预览: {} ({})", item.preview_url, item.media_kind);
    let _ = writeln!(out);

    let _ = writeln!(out, "建议定价");
    let _ = writeln!(out, "  {} 钻石", format_thousands(result.suggested_diamonds));
    let _ = writeln!(out, "  约 {} USD", price_tag(result.suggested_price_usd));
    let _ = writeln!(out, "  [等级 {}]", level_text(result));
    let _ = writeln!(out);

    let _ = writeln!(out, "检测规格");
    let _ = writeln!(out, "  时长      {}", result.estimated_duration);
    let _ = writeln!(out, "  转场数    {}", result.transition_count);
    let _ = writeln!(out, "  屏占比    {}", result.screen_coverage);
    let complexity = if result.visual_complexity.is_empty() {
        "-"
    } else {
        result.visual_complexity.as_str()
    };
    let _ = writeln!(out, "  复杂度    {}", complexity);
    let _ = writeln!(out, "  屏幕覆盖率 {}", coverage_bar(result.coverage_percent()));
    let _ = writeln!(out);

    let _ = writeln!(out, "AI 定价分析理由");
    for line in result.reasoning.lines() {
        let _ = writeln!(out, "  {}", line);
    }
    for warning in result.warnings() {
        let _ = writeln!(out, "  ⚠️ {}", warning);
    }

    if let Some(level) = result.suggested_level {
        let references: Vec<_> = rules_for_level(level).collect();
        if !references.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "同等级参考");
            for rule in references {
                let _ = writeln!(
                    out,
                    "  {} {} · {} 钻石 / {}",
                    rule.duration,
                    rule.specs,
                    format_thousands(rule.price_diamonds),
                    price_tag(rule.price_usd)
                );
            }
        }
    }
    let _ = write!(out, "[移除/关闭报告: rm {}]", short_id(item.id));
    out
}

/// 定价标准表
pub fn render_pricing_table() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "定价标准");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{:<4} {:<28} {:>12}", "等级", "规格描述", "参考价格");
    for rule in PRICING_RULES.iter() {
        let _ = writeln!(
            out,
            "{:<4} {:<6} {:<22} {:>10} 钻石 {:>6}",
            rule.level,
            rule.duration,
            rule.specs,
            format_thousands(rule.price_diamonds),
            price_tag(rule.price_usd)
        );
    }
    let _ = writeln!(out, "{}", RULE);
    let _ = write!(out, "注意: {}", PRICING_CAUTION);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn result() -> AnalysisResult {
        serde_json::from_str(
            r#"{"estimatedDuration":"10s","screenCoverage":"全屏","transitionCount":2,
                "suggestedLevel":4,"suggestedPriceUsd":7,"suggestedDiamonds":70000,
                "reasoning":"全屏接管\n两次硬切","warnings":["分辨率偏低"]}"#,
        )
        .unwrap()
    }

    fn view(status: ItemStatus, result: Option<AnalysisResult>) -> QueueItemView {
        QueueItemView {
            id: Uuid::new_v4(),
            file_name: "rocket.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            size_bytes: 3 * 1024 * 1024,
            preview_url: "preview://abc/rocket.mp4".to_string(),
            media_kind: MediaKind::Video,
            status,
            result,
            error_message: (status == ItemStatus::Error).then(|| "分析失败".to_string()),
        }
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(70000), "70,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_price_tag() {
        assert_eq!(price_tag(7.0), "$7");
        assert_eq!(price_tag(0.1), "$0.1");
        assert_eq!(price_tag(0.01), "$0.01");
    }

    #[test]
    fn test_coverage_bar() {
        assert_eq!(coverage_bar(100), "██████████ 100%");
        assert_eq!(coverage_bar(25), "██░░░░░░░░ 25%");
    }

    #[test]
    fn test_queue_row_shows_price_and_level() {
        let items = vec![view(ItemStatus::Success, Some(result())), view(ItemStatus::Idle, None)];
        let counts = QueueCounts {
            total: 2,
            idle: 1,
            success: 1,
            ..Default::default()
        };
        let text = render_queue(&items, Some(items[0].id), &counts, false);

        assert!(text.starts_with("队列 (2) • 1 已完成"));
        assert!(text.contains("rocket.mp4  $7"));
        assert!(text.contains("3.00 MB • 等级 4"));
        assert!(text.contains("等待中"));
        assert!(text.contains("▶  1."));
    }

    #[test]
    fn test_report_contains_badge_and_warnings() {
        let item = view(ItemStatus::Success, Some(result()));
        let text = render_detail(&item);

        assert!(text.contains("70,000 钻石"));
        assert!(text.contains("约 $7 USD"));
        assert!(text.contains("[等级 4]"));
        assert!(text.contains("  两次硬切"));
        assert!(text.contains("⚠️ 分辨率偏低"));
        assert!(text.contains("10s 全屏, 2次转场"));
    }

    #[test]
    fn test_detail_for_other_states() {
        assert!(render_detail(&view(ItemStatus::Analyzing, None)).contains("正在分析 rocket.mp4"));
        let failed = render_detail(&view(ItemStatus::Error, None));
        assert!(failed.contains("分析失败"));
        assert!(failed.contains("retry"));
    }

    #[test]
    fn test_pricing_table_has_all_rows_and_caution() {
        let table = render_pricing_table();
        assert!(table.contains("700,000"));
        assert!(table.contains("静态图片"));
        assert!(table.ends_with(PRICING_CAUTION));
    }
}
