//! # Gift Pricer
//!
//! 礼物特效定价工具：批量上传视频/图片，调用多模态模型逐个分析，给出等级与价格建议
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 预览资源登记，每个条目持有一个 `PreviewHandle`，移除时释放
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 只处理单个文件
//! - `MediaAnalyzer` - Gemini / OpenAI 兼容后端的分析能力
//! - `ReportWriter` - 写日志行、导出 JSON
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 队列的单一状态源
//! - `QueueStore` - 条目列表、选中项、状态转换与事件广播
//! - `Transition` - 合法的状态转换
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 串行批量分析，防重入
//! - `orchestrator/app` - 初始化、文件加载、一次性模式
//!
//! ### ⑤ 展示层（Presentation）
//! - `presentation/` - 队列列表、分析报告、定价表、交互式控制台

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod presentation;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Backend, Config};
pub use error::{AppError, AppResult};
pub use models::{AnalysisResult, ItemStatus, MediaFile, QueueItemView};
pub use orchestrator::{App, BatchRunner, BatchSummary};
pub use services::MediaAnalyzer;
pub use workflow::{QueueEvent, QueueStore};
