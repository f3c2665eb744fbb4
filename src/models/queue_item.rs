use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::infrastructure::PreviewHandle;
use crate::models::{AnalysisResult, MediaFile, MediaKind};

/// 条目状态（不带数据，用于展示与比较）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Idle,
    Analyzing,
    Success,
    Error,
}

impl ItemStatus {
    /// 批量运行会处理的状态
    pub fn is_pending(self) -> bool {
        matches!(self, ItemStatus::Idle | ItemStatus::Error)
    }

    /// 队列列表中的短标签
    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Idle => "等待中",
            ItemStatus::Analyzing => "分析中",
            ItemStatus::Success => "已完成",
            ItemStatus::Error => "分析失败",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStatus::Idle => "idle",
            ItemStatus::Analyzing => "analyzing",
            ItemStatus::Success => "success",
            ItemStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// 条目状态及其附带数据
///
/// 结果只存在于 `Success`，错误信息只存在于 `Error`
#[derive(Debug, Clone, PartialEq)]
pub enum ItemState {
    Idle,
    Analyzing,
    Success(Box<AnalysisResult>),
    Error(String),
}

impl ItemState {
    pub fn status(&self) -> ItemStatus {
        match self {
            ItemState::Idle => ItemStatus::Idle,
            ItemState::Analyzing => ItemStatus::Analyzing,
            ItemState::Success(_) => ItemStatus::Success,
            ItemState::Error(_) => ItemStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            ItemState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ItemState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// 队列中的一个文件
///
/// `id`、`file`、`preview`、`media_kind` 创建后不变，只有 `state` 会被批量运行器修改
#[derive(Debug)]
pub struct QueueItem {
    id: Uuid,
    file: MediaFile,
    preview: PreviewHandle,
    media_kind: MediaKind,
    pub(crate) state: ItemState,
}

impl QueueItem {
    pub fn new(file: MediaFile, preview: PreviewHandle) -> Self {
        let media_kind = file.kind();
        Self {
            id: Uuid::new_v4(),
            file,
            preview,
            media_kind,
            state: ItemState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file(&self) -> &MediaFile {
        &self.file
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn state(&self) -> &ItemState {
        &self.state
    }

    pub fn status(&self) -> ItemStatus {
        self.state.status()
    }

    /// 生成只读快照
    pub fn view(&self) -> QueueItemView {
        QueueItemView {
            id: self.id,
            file_name: self.file.name().to_string(),
            mime_type: self.file.mime_type().to_string(),
            size_bytes: self.file.size(),
            preview_url: self.preview.url().to_string(),
            media_kind: self.media_kind,
            status: self.status(),
            result: self.state.result().cloned(),
            error_message: self.state.error_message().map(str::to_string),
        }
    }

    /// 消费条目并释放预览资源
    pub fn release(self) {
        self.preview.release();
    }
}

/// 队列条目的只读快照，供展示层与报告导出使用
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemView {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub preview_url: String,
    pub media_kind: MediaKind,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl QueueItemView {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}
