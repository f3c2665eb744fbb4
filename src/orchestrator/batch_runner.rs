//! 批量运行器 - 编排层
//!
//! ## 职责
//!
//! 按队列顺序逐个处理 idle / error 条目，同一时刻只有一个请求在途。
//!
//! ## 核心规则
//!
//! 1. **凭证检查**：没有 API Key 时直接返回配置错误，不修改任何条目
//! 2. **防重入**：运行期间再次调用返回 `BatchError::AlreadyRunning`
//! 3. **不快速失败**：单个条目失败只记录在该条目上，继续处理后续条目
//! 4. **实时可见**：每次状态转换立即写入 `QueueStore` 并广播
//! 5. **移除即丢弃**：分析中的条目被移除后，其结果直接丢弃

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{AppResult, BatchError, ConfigError, QueueError};
use crate::services::{MediaAnalyzer, ReportWriter};
use crate::utils::logging::{log_batch_complete, log_batch_start, log_item_start};
use crate::workflow::{BatchSummary, QueueEvent, QueueStore, Transition};

/// 失败条目上展示的通用信息，具体原因只写日志
pub const FAILURE_MESSAGE: &str = "分析失败";

/// 运行标志的 RAII 守卫，离开作用域时复位
struct ProcessingGuard {
    flag: Arc<AtomicBool>,
}

impl ProcessingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 批量运行器
///
/// 克隆后共享同一个运行标志，可以放进 `tokio::spawn`
#[derive(Clone)]
pub struct BatchRunner {
    store: Arc<QueueStore>,
    analyzer: Arc<dyn MediaAnalyzer>,
    api_key: Option<String>,
    processing: Arc<AtomicBool>,
    reporter: Option<Arc<ReportWriter>>,
}

impl BatchRunner {
    pub fn new(store: Arc<QueueStore>, analyzer: Arc<dyn MediaAnalyzer>, api_key: Option<String>) -> Self {
        Self {
            store,
            analyzer,
            api_key,
            processing: Arc::new(AtomicBool::new(false)),
            reporter: None,
        }
    }

    /// 每个条目完成后追加一行日志
    pub fn with_reporter(mut self, reporter: Arc<ReportWriter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    /// 是否配置了非空的 API Key
    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// 是否有批量任务正在运行
    pub fn is_running(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// 处理当前队列中所有 idle / error 条目
    ///
    /// 只有配置错误和重入会返回 `Err`；单个条目的失败记录在条目上
    pub async fn run(&self) -> AppResult<BatchSummary> {
        let api_key = self.credential().ok_or(ConfigError::MissingApiKey)?;

        let _guard = ProcessingGuard::acquire(&self.processing).ok_or(BatchError::AlreadyRunning)?;

        let pending = self.store.pending_ids().await;
        let mut summary = BatchSummary {
            total: pending.len(),
            ..Default::default()
        };

        log_batch_start(summary.total, self.analyzer.model_name());
        self.store.notify(QueueEvent::BatchStarted {
            total: summary.total,
        });

        for (index, id) in pending.into_iter().enumerate() {
            let file = match self.store.begin_analysis(id).await {
                Ok(file) => file,
                Err(e) => {
                    debug!("跳过条目 {}: {}", id, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            log_item_start(index + 1, summary.total, file.name());

            let transition = match self.analyzer.analyze(&file, api_key).await {
                Ok(result) => {
                    info!(
                        "[{}/{}] ✓ {} → 等级 {:?}, ${}, {} 钻石",
                        index + 1,
                        summary.total,
                        file.name(),
                        result.suggested_level,
                        result.suggested_price_usd,
                        result.suggested_diamonds
                    );
                    Transition::Succeed(result)
                }
                Err(e) => {
                    error!("[{}/{}] ❌ {} 分析失败: {}", index + 1, summary.total, file.name(), e);
                    Transition::Fail(FAILURE_MESSAGE.to_string())
                }
            };

            let succeeded = matches!(transition, Transition::Succeed(_));
            match self.store.set_status(id, transition).await {
                Ok(_) => {
                    if succeeded {
                        summary.success += 1;
                    } else {
                        summary.failed += 1;
                    }
                    self.append_report(id).await;
                }
                Err(QueueError::NotFound { .. }) => {
                    info!("条目 {} 在分析期间已被移除，丢弃结果", file.name());
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!("无法更新条目 {} 的状态: {}", file.name(), e);
                    summary.skipped += 1;
                }
            }
        }

        log_batch_complete(&summary);
        self.store.notify(QueueEvent::BatchFinished(summary));
        Ok(summary)
    }

    async fn append_report(&self, id: uuid::Uuid) {
        let Some(reporter) = &self.reporter else {
            return;
        };
        if let Some(view) = self.store.get(id).await {
            if let Err(e) = reporter.append(&view).await {
                warn!("写入日志文件失败: {}", e);
            }
        }
    }
}
