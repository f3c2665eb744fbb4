use thiserror::Error;
use uuid::Uuid;

use crate::models::ItemStatus;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 分析服务错误
    #[error("分析错误: {0}")]
    Analysis(#[from] AnalysisError),
    /// 队列操作错误
    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),
    /// 批量运行错误
    #[error("批量错误: {0}")]
    Batch(#[from] BatchError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未配置 API Key，批量分析不会启动
    #[error("请配置 API Key (GIFT_PRICER_API_KEY / GEMINI_API_KEY / API_KEY)")]
    MissingApiKey,
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {message}")]
    FileParseFailed { path: String, message: String },
    /// 未知的分析后端
    #[error("未知的分析后端: {0} (可选: gemini, openai)")]
    UnknownBackend(String),
}

/// 分析请求错误
///
/// 适配器本身不重试，由批量运行器把任何一种失败转换为条目的 `error` 状态
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 调用时没有提供凭证
    #[error("缺少 API 凭证")]
    MissingCredential,
    /// 网络、鉴权或配额失败
    #[error("调用模型失败 (模型: {model}): {message}")]
    Transport { model: String, message: String },
    /// 返回结果为空
    #[error("模型返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容不是符合结构的 JSON
    #[error("模型返回内容无法解析: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },
    /// 请求构造失败
    #[error("构造请求失败: {0}")]
    RequestBuild(String),
}

/// 队列操作错误
#[derive(Debug, Error)]
pub enum QueueError {
    /// 条目不存在（已被移除或从未存在）
    #[error("队列中不存在条目 {id}")]
    NotFound { id: Uuid },
    /// 状态机不允许的转换
    #[error("条目 {id} 不能从 {from} 转换到 {to}")]
    InvalidTransition {
        id: Uuid,
        from: ItemStatus,
        to: ItemStatus,
    },
}

/// 批量运行错误
#[derive(Debug, Error)]
pub enum BatchError {
    /// 已有批量任务正在运行
    #[error("批量分析正在进行中")]
    AlreadyRunning,
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 文件超过内联请求的大小上限
    #[error("文件过大 ({path}): {size_mb:.2} MB, 上限 {limit_mb} MB")]
    TooLarge {
        path: String,
        size_mb: f64,
        limit_mb: u64,
    },
}

// ========== 便捷构造函数 ==========

impl AnalysisError {
    /// 创建传输错误
    pub fn transport(model: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AnalysisError::Transport {
            model: model.into(),
            message: message.to_string(),
        }
    }
}

impl FileError {
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
