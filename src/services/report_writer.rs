//! 报告写入服务 - 业务能力层
//!
//! 只负责"写日志行 / 导出 JSON"能力，不关心流程

use std::path::Path;

use chrono::Local;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::FileError;
use crate::models::{ItemStatus, QueueItemView};

/// 导出文件的顶层结构
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedReport<'a> {
    generated_at: String,
    items: &'a [QueueItemView],
}

/// 报告写入服务
pub struct ReportWriter {
    log_file_path: String,
}

impl ReportWriter {
    pub fn new(log_file_path: impl Into<String>) -> Self {
        Self {
            log_file_path: log_file_path.into(),
        }
    }

    pub fn log_file_path(&self) -> &str {
        &self.log_file_path
    }

    /// 追加一条已完成条目的记录
    pub async fn append(&self, item: &QueueItemView) -> Result<(), FileError> {
        let line = format_log_line(item);
        debug!("写入日志: {}", line.trim_end());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .map_err(|e| FileError::write_failed(&self.log_file_path, e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| FileError::write_failed(&self.log_file_path, e))?;
        Ok(())
    }

    /// 把整个队列导出为 JSON
    pub async fn export_json(&self, path: &Path, items: &[QueueItemView]) -> Result<(), FileError> {
        let report = ExportedReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            items,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| FileError::write_failed(path.display().to_string(), e.into()))?;

        tokio::fs::write(path, json)
            .await
            .map_err(|e| FileError::write_failed(path.display().to_string(), e))
    }
}

/// 单行日志：时间 | 文件 | 状态 | 等级 | 价格
pub fn format_log_line(item: &QueueItemView) -> String {
    let time = Local::now().format("%H:%M:%S");
    match (&item.status, &item.result) {
        (ItemStatus::Success, Some(result)) => format!(
            "[{}] {} | 成功 | 等级 {} | ${} | {} 钻石\n",
            time,
            item.file_name,
            result
                .suggested_level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string()),
            result.suggested_price_usd,
            result.suggested_diamonds
        ),
        _ => format!(
            "[{}] {} | {} | {}\n",
            time,
            item.file_name,
            item.status.label(),
            item.error_message.as_deref().unwrap_or("-")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, MediaKind};
    use uuid::Uuid;

    fn view(status: ItemStatus, result: Option<AnalysisResult>, error: Option<&str>) -> QueueItemView {
        QueueItemView {
            id: Uuid::new_v4(),
            file_name: "rocket.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            size_bytes: 2048,
            preview_url: "preview://x/rocket.mp4".to_string(),
            media_kind: MediaKind::Video,
            status,
            result,
            error_message: error.map(str::to_string),
        }
    }

    fn result() -> AnalysisResult {
        serde_json::from_str(
            r#"{"estimatedDuration":"10s","screenCoverage":"全屏","transitionCount":2,
                "suggestedLevel":4,"suggestedPriceUsd":7,"suggestedDiamonds":70000,"reasoning":"..."}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_log_line_for_success_and_error() {
        let ok = format_log_line(&view(ItemStatus::Success, Some(result()), None));
        assert!(ok.contains("rocket.mp4 | 成功 | 等级 4 | $7 | 70000 钻石"));

        let failed = format_log_line(&view(ItemStatus::Error, None, Some("分析失败")));
        assert!(failed.contains("rocket.mp4 | 分析失败 | 分析失败"));
    }

    #[tokio::test]
    async fn test_append_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.txt");
        let writer = ReportWriter::new(log_path.to_string_lossy().to_string());

        let items = vec![
            view(ItemStatus::Success, Some(result()), None),
            view(ItemStatus::Error, None, Some("分析失败")),
        ];
        for item in &items {
            writer.append(item).await.unwrap();
        }
        let log = tokio::fs::read_to_string(&log_path).await.unwrap();
        assert_eq!(log.lines().count(), 2);

        let export_path = dir.path().join("report.json");
        writer.export_json(&export_path, &items).await.unwrap();
        let exported: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&export_path).await.unwrap()).unwrap();
        assert_eq!(exported["items"][0]["result"]["suggestedDiamonds"], 70000);
        assert_eq!(exported["items"][1]["status"], "error");
        assert_eq!(exported["items"][1]["errorMessage"], "分析失败");
    }
}
