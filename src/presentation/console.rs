//! 交互式控制台 - 展示层
//!
//! 读取用户命令，转发给 `QueueStore` / `BatchRunner`，并实时打印队列变化。
//! 批量分析在后台任务中运行，运行期间仍可选择、查看或移除条目。

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{ItemStatus, QueueItemView};
use crate::orchestrator::{load_media_files, BatchRunner, BatchSummary};
use crate::presentation::views;
use crate::services::ReportWriter;
use crate::workflow::{QueueEvent, QueueStore};

const HELP: &str = "\
命令:
  add <路径>...     添加文件到队列 (可多个)
  ls                查看队列
  select <序号|ID>  选中条目并查看详情
  show              查看当前选中条目
  rm <序号|ID>      移除条目
  clear             清空队列
  run               开始批量分析 (idle + 失败项)
  retry             重试失败项 (重新运行整个批次)
  preview [序号|ID] 查看预览资源
  pricing           查看定价标准
  export <路径>     导出 JSON 报告
  help              显示帮助
  quit              退出";

/// 条目引用：列表序号（从 1 开始）或 ID 前缀
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Index(usize),
    IdPrefix(String),
}

impl ItemRef {
    fn parse(token: &str) -> Self {
        match token.parse::<usize>() {
            Ok(index) => ItemRef::Index(index),
            Err(_) => ItemRef::IdPrefix(token.to_ascii_lowercase()),
        }
    }

    /// 在快照中查找对应条目
    pub fn resolve(&self, items: &[QueueItemView]) -> Option<Uuid> {
        match self {
            ItemRef::Index(index) => index.checked_sub(1).and_then(|i| items.get(i)).map(|v| v.id),
            ItemRef::IdPrefix(prefix) => {
                let mut matches = items
                    .iter()
                    .filter(|v| v.id.simple().to_string().starts_with(prefix.as_str()));
                match (matches.next(), matches.next()) {
                    (Some(only), None) => Some(only.id),
                    _ => None,
                }
            }
        }
    }
}

/// 控制台命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(Vec<PathBuf>),
    List,
    Select(ItemRef),
    Show,
    Remove(ItemRef),
    Clear,
    Run,
    Retry,
    Preview(Option<ItemRef>),
    Pricing,
    Export(PathBuf),
    Help,
    Quit,
}

impl Command {
    /// 解析一行输入；空行返回 `Ok(None)`
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = tokens.collect();

        let one_ref = |args: &[&str]| -> Result<ItemRef, String> {
            match args {
                [token] => Ok(ItemRef::parse(token)),
                _ => Err(format!("用法: {} <序号|ID>", name)),
            }
        };

        let command = match name {
            "add" | "a" => {
                if args.is_empty() {
                    return Err("用法: add <路径>...".to_string());
                }
                Command::Add(args.iter().map(PathBuf::from).collect())
            }
            "ls" | "list" => Command::List,
            "select" | "s" => Command::Select(one_ref(&args)?),
            "show" => Command::Show,
            "rm" | "remove" => Command::Remove(one_ref(&args)?),
            "clear" => Command::Clear,
            "run" => Command::Run,
            "retry" => Command::Retry,
            "preview" => match args.as_slice() {
                [] => Command::Preview(None),
                [token] => Command::Preview(Some(ItemRef::parse(token))),
                _ => return Err("用法: preview [序号|ID]".to_string()),
            },
            "pricing" => Command::Pricing,
            "export" => match args.as_slice() {
                [path] => Command::Export(PathBuf::from(path)),
                _ => return Err("用法: export <路径>".to_string()),
            },
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("未知命令: {} (输入 help 查看帮助)", other)),
        };
        Ok(Some(command))
    }
}

/// 交互式控制台
pub struct Console {
    runner: BatchRunner,
    reporter: Arc<ReportWriter>,
    max_file_size_mb: u64,
    /// 最近一次在后台启动的批量任务
    batch: Mutex<Option<JoinHandle<Option<BatchSummary>>>>,
}

impl Console {
    pub fn new(runner: BatchRunner, reporter: Arc<ReportWriter>, max_file_size_mb: u64) -> Self {
        Self {
            runner,
            reporter,
            max_file_size_mb,
            batch: Mutex::new(None),
        }
    }

    fn store(&self) -> &Arc<QueueStore> {
        self.runner.store()
    }

    /// 运行控制台直到用户退出或输入结束
    pub async fn run(self) -> Result<()> {
        let progress = spawn_progress_printer(self.store().clone());

        println!("礼物特效定价 AI - 支持批量模式 (输入 help 查看命令)");
        println!("{}", self.render_queue().await);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    let output = self.execute(command).await;
                    if !output.is_empty() {
                        println!("{}", output);
                    }
                }
                Err(message) => println!("{}", message),
            }
        }

        self.shutdown().await;
        progress.abort();
        Ok(())
    }

    /// 退出前等待后台批量任务结束，返回它的统计
    ///
    /// 等待时长受每个请求的超时限制
    pub async fn shutdown(&self) -> Option<BatchSummary> {
        let handle = self
            .batch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()?;

        if self.runner.is_running() {
            println!("⏳ 批量分析仍在进行，等待当前批次完成后退出...");
        }
        match handle.await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("批量任务异常结束: {}", e);
                None
            }
        }
    }

    /// 执行一条命令，返回要显示的文本
    pub async fn execute(&self, command: Command) -> String {
        match command {
            Command::Add(paths) => self.add(&paths).await,
            Command::List => self.render_queue().await,
            Command::Select(item) => match self.resolve(&item).await {
                Some(id) => match self.store().select(id).await {
                    Ok(()) => self.render_selected().await,
                    Err(e) => e.to_string(),
                },
                None => "找不到该条目".to_string(),
            },
            Command::Show => self.render_selected().await,
            Command::Remove(item) => match self.resolve(&item).await {
                Some(id) => match self.store().remove(id).await {
                    Ok(()) => self.render_queue().await,
                    Err(e) => e.to_string(),
                },
                None => "找不到该条目".to_string(),
            },
            Command::Clear => {
                let count = self.store().clear().await;
                format!("已清空 {} 个条目", count)
            }
            Command::Run | Command::Retry => self.start_batch().await,
            Command::Preview(item) => self.preview(item).await,
            Command::Pricing => views::render_pricing_table(),
            Command::Export(path) => {
                let items = self.store().snapshot().await;
                match self.reporter.export_json(&path, &items).await {
                    Ok(()) => format!("已导出 {} 个条目到 {}", items.len(), path.display()),
                    Err(e) => e.to_string(),
                }
            }
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
        }
    }

    async fn add(&self, paths: &[PathBuf]) -> String {
        let (files, failures) = load_media_files(paths, self.max_file_size_mb).await;
        let mut out = String::new();
        for (path, err) in &failures {
            out.push_str(&format!("⚠️ 跳过 {}: {}\n", path.display(), err));
        }
        self.store().enqueue(files).await;
        out.push_str(&self.render_queue().await);
        out
    }

    /// 在后台启动批量分析；缺少凭证或正在运行时直接给出提示
    async fn start_batch(&self) -> String {
        if !self.runner.has_credential() {
            return "⚠️ 请配置 API Key".to_string();
        }
        if self.runner.is_running() {
            return "分析中...".to_string();
        }
        if self.store().counts().await.pending() == 0 {
            return "没有待处理的条目".to_string();
        }

        let runner = self.runner.clone();
        let handle = tokio::spawn(async move {
            match runner.run().await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    println!("⚠️ {}", e);
                    None
                }
            }
        });
        *self.batch.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
        "开始批量分析...".to_string()
    }

    async fn preview(&self, item: Option<ItemRef>) -> String {
        let id = match item {
            Some(item) => self.resolve(&item).await,
            None => self.store().selected_id().await,
        };
        let Some(view) = (match id {
            Some(id) => self.store().get(id).await,
            None => None,
        }) else {
            return "找不到该条目".to_string();
        };

        match self.store().previews().resolve(&view.preview_url) {
            Some(file) => format!(
                "{}\n  {} · {} · {:.2} MB",
                view.preview_url,
                file.name(),
                file.mime_type(),
                file.size_mb()
            ),
            None => "预览资源已释放".to_string(),
        }
    }

    async fn resolve(&self, item: &ItemRef) -> Option<Uuid> {
        item.resolve(&self.store().snapshot().await)
    }

    async fn render_queue(&self) -> String {
        let items = self.store().snapshot().await;
        let counts = self.store().counts().await;
        let selected = self.store().selected_id().await;
        views::render_queue(&items, selected, &counts, self.runner.is_running())
    }

    async fn render_selected(&self) -> String {
        match self.store().selected().await {
            Some(item) => views::render_detail(&item),
            None => views::render_no_selection(self.store().is_empty().await),
        }
    }
}

/// 订阅队列事件并打印进度
fn spawn_progress_printer(store: Arc<QueueStore>) -> JoinHandle<()> {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(QueueEvent::BatchStarted { total }) => {
                    println!("📦 开始批量分析 {} 个文件", total);
                }
                Ok(QueueEvent::StatusChanged { id, status }) => {
                    if let Some(view) = store.get(id).await {
                        println!("{}", progress_line(&view, status));
                    }
                }
                Ok(QueueEvent::BatchFinished(summary)) => {
                    println!(
                        "✓ 批量分析完成: 成功 {}/{}，失败 {}",
                        summary.success, summary.total, summary.failed
                    );
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!("进度输出跳过 {} 个事件", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn progress_line(view: &QueueItemView, status: ItemStatus) -> String {
    match (status, &view.result) {
        (ItemStatus::Success, Some(result)) => format!(
            "  ✓ {}  {} • 等级 {}",
            view.file_name,
            views::price_tag(result.suggested_price_usd),
            result
                .suggested_level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        (ItemStatus::Analyzing, _) => format!("  ⏳ 正在分析 {}...", view.file_name),
        (ItemStatus::Error, _) => format!("  ✗ {}  分析失败", view.file_name),
        _ => format!("  {} {}", view.file_name, status.label()),
    }
}
