//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_runner` - 批量运行器
//! - 按队列顺序串行分析 idle / error 条目
//! - 防重入、凭证检查、单条失败不影响整体
//!
//! ### `app` - 应用入口
//! - 初始化日志与分析后端
//! - 加载文件、一次性批量模式、交互模式
//!
//! ## 层次关系
//!
//! ```text
//! app (文件加载 / 输出)
//!     ↓
//! batch_runner (处理 Vec<QueueItem>)
//!     ↓
//! workflow::QueueStore (单一状态源)
//!     ↓
//! services (能力层：analyzer / report_writer)
//!     ↓
//! infrastructure (预览资源)
//! ```

pub mod app;
pub mod batch_runner;

pub use app::{load_media_files, App};
pub use batch_runner::{BatchRunner, FAILURE_MESSAGE};
pub use crate::workflow::BatchSummary;
