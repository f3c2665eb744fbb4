//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：写日志文件头、创建分析后端、队列和批量运行器
//! 2. **文件加载**：并发读取所有路径，过大或无法读取的文件跳过并记录
//! 3. **一次性模式**：加入文件 → 批量分析 → 打印报告 → 可选导出 JSON
//! 4. **交互模式**：交给 `presentation::Console`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::FileError;
use crate::infrastructure::PreviewRegistry;
use crate::models::MediaFile;
use crate::orchestrator::{BatchRunner, BatchSummary};
use crate::presentation::{views, Console};
use crate::services::{build_analyzer, MediaAnalyzer, ReportWriter};
use crate::utils::logging::{init_log_file, log_files_loaded, log_startup, print_final_stats};
use crate::workflow::QueueStore;

/// 并发读取文件，返回成功加载的文件和失败原因
///
/// 成功的文件保持输入顺序
pub async fn load_media_files(paths: &[PathBuf], max_size_mb: u64) -> (Vec<MediaFile>, Vec<(PathBuf, FileError)>) {
    let results = join_all(paths.iter().map(|path| MediaFile::load(path, max_size_mb))).await;

    let mut files = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(file) => files.push(file),
            Err(e) => {
                warn!("⚠️ 无法加载 {}: {}", path.display(), e);
                failures.push((path.clone(), e));
            }
        }
    }
    log_files_loaded(files.len(), failures.len());
    (files, failures)
}

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<QueueStore>,
    runner: BatchRunner,
    reporter: Arc<ReportWriter>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let analyzer = build_analyzer(&config)?;
        Ok(Self::with_analyzer(config, analyzer))
    }

    /// 使用指定的分析后端创建应用（不写日志文件头）
    pub fn with_analyzer(config: Config, analyzer: Arc<dyn MediaAnalyzer>) -> Self {
        let store = Arc::new(QueueStore::new(PreviewRegistry::new()));
        let reporter = Arc::new(ReportWriter::new(config.output_log_file.clone()));
        let runner = BatchRunner::new(store.clone(), analyzer, config.credential().map(str::to_string))
            .with_reporter(reporter.clone());

        Self {
            config,
            store,
            runner,
            reporter,
        }
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    pub fn runner(&self) -> &BatchRunner {
        &self.runner
    }

    /// 加载文件并加入队列，返回加入的数量
    pub async fn add_files(&self, paths: &[PathBuf]) -> usize {
        let (files, _failures) = load_media_files(paths, self.config.max_file_size_mb).await;
        self.store.enqueue(files).await.len()
    }

    /// 一次性模式：分析队列中所有待处理文件并打印报告
    pub async fn run_batch(&self, output: Option<&Path>) -> Result<BatchSummary> {
        if self.store.is_empty().await {
            warn!("⚠️ 队列为空，没有可分析的文件");
            return Ok(BatchSummary::default());
        }

        let summary = self.runner.run().await?;

        let items = self.store.snapshot().await;
        let counts = self.store.counts().await;
        println!("{}", views::render_queue(&items, None, &counts, false));
        for item in &items {
            println!("{}\n", views::render_detail(item));
        }

        if let Some(path) = output {
            self.reporter.export_json(path, &items).await?;
            info!("📄 报告已导出至: {}", path.display());
        }

        print_final_stats(&counts, self.reporter.log_file_path());
        Ok(summary)
    }

    /// 交互模式
    pub async fn console(&self) -> Result<()> {
        Console::new(self.runner.clone(), self.reporter.clone(), self.config.max_file_size_mb)
            .run()
            .await
    }
}
