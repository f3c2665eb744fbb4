use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

use gift_pricer::error::{AnalysisError, AppError, BatchError, ConfigError};
use gift_pricer::infrastructure::PreviewRegistry;
use gift_pricer::models::{AnalysisResult, ItemStatus, MediaFile};
use gift_pricer::orchestrator::{BatchRunner, FAILURE_MESSAGE};
use gift_pricer::presentation::views;
use gift_pricer::services::MediaAnalyzer;
use gift_pricer::workflow::{QueueEvent, QueueStore, Transition};

fn sample_result(level: u8, usd: f64, diamonds: u64) -> AnalysisResult {
    serde_json::from_value(serde_json::json!({
        "estimatedDuration": "10s",
        "screenCoverage": "全屏",
        "transitionCount": 2,
        "visualComplexity": "高",
        "suggestedLevel": level,
        "suggestedPriceUsd": usd,
        "suggestedDiamonds": diamonds,
        "reasoning": "全屏接管，两次转场"
    }))
    .unwrap()
}

fn media(name: &str) -> MediaFile {
    MediaFile::new(name, "video/mp4", vec![0u8; 16])
}

/// 按文件名返回预设结果，并记录调用顺序
#[derive(Default)]
struct ScriptedAnalyzer {
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, file: &MediaFile, _api_key: &str) -> Result<AnalysisResult, AnalysisError> {
        self.calls.lock().unwrap().push(file.name().to_string());
        if self.failing.iter().any(|n| n == file.name()) {
            Err(AnalysisError::transport("scripted", "boom"))
        } else {
            Ok(sample_result(4, 7.0, 70000))
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// 在 `release` 被通知前一直挂起的分析器
#[derive(Default)]
struct BlockingAnalyzer {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl MediaAnalyzer for BlockingAnalyzer {
    async fn analyze(&self, _file: &MediaFile, _api_key: &str) -> Result<AnalysisResult, AnalysisError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(sample_result(4, 7.0, 70000))
    }

    fn model_name(&self) -> &str {
        "blocking"
    }
}

fn new_store() -> Arc<QueueStore> {
    Arc::new(QueueStore::new(PreviewRegistry::new()))
}

async fn mark(store: &QueueStore, id: uuid::Uuid, transition: Transition) {
    assert_ok!(store.begin_analysis(id).await);
    assert_ok!(store.set_status(id, transition).await);
}

#[tokio::test]
async fn test_processes_idle_and_error_in_order_and_skips_success() {
    let store = new_store();
    let ids = store.enqueue(vec![media("a.mp4"), media("b.mp4"), media("c.mp4")]).await;
    mark(&store, ids[1], Transition::Fail(FAILURE_MESSAGE.to_string())).await;
    mark(&store, ids[2], Transition::Succeed(sample_result(2, 1.0, 10000))).await;

    let analyzer = Arc::new(ScriptedAnalyzer::default());
    let runner = BatchRunner::new(store.clone(), analyzer.clone(), Some("key".to_string()));

    let summary = assert_ok!(runner.run().await);

    assert_eq!(analyzer.calls(), vec!["a.mp4", "b.mp4"]);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.success, 2);
    let c = store.get(ids[2]).await.unwrap();
    assert_eq!(c.result.unwrap().suggested_price_usd, 1.0);
}

#[tokio::test]
async fn test_single_failure_does_not_stop_batch() {
    let store = new_store();
    let ids = store.enqueue(vec![media("a.mp4"), media("b.mp4"), media("c.mp4")]).await;

    let analyzer = Arc::new(ScriptedAnalyzer::failing(&["b.mp4"]));
    let runner = BatchRunner::new(store.clone(), analyzer.clone(), Some("key".to_string()));
    let summary = assert_ok!(runner.run().await);

    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 1);

    let items = store.snapshot().await;
    let statuses: Vec<_> = items.iter().map(|i| i.status).collect();
    assert_eq!(statuses, vec![ItemStatus::Success, ItemStatus::Error, ItemStatus::Success]);
    assert_eq!(items[1].error_message.as_deref(), Some(FAILURE_MESSAGE));
    assert!(items[1].result.is_none());
    assert!(items[0].result.is_some() && items[2].result.is_some());
    assert_eq!(store.get(ids[1]).await.unwrap().status, ItemStatus::Error);
}

#[tokio::test]
async fn test_rerun_retries_failed_items_only() {
    let store = new_store();
    store.enqueue(vec![media("a.mp4"), media("b.mp4")]).await;

    let first = Arc::new(ScriptedAnalyzer::failing(&["b.mp4"]));
    assert_ok!(BatchRunner::new(store.clone(), first, Some("key".to_string())).run().await);

    let second = Arc::new(ScriptedAnalyzer::default());
    let runner = BatchRunner::new(store.clone(), second.clone(), Some("key".to_string()));
    let summary = assert_ok!(runner.run().await);

    assert_eq!(second.calls(), vec!["b.mp4"]);
    assert_eq!(summary.success, 1);
    assert_eq!(store.counts().await.success, 2);
}

#[tokio::test]
async fn test_missing_credential_leaves_items_idle() {
    let store = new_store();
    store.enqueue(vec![media("a.mp4")]).await;

    let analyzer = Arc::new(ScriptedAnalyzer::default());
    for key in [None, Some("   ".to_string())] {
        let runner = BatchRunner::new(store.clone(), analyzer.clone(), key);
        assert!(!runner.has_credential());
        let err = assert_err!(runner.run().await);
        assert!(matches!(err, AppError::Config(ConfigError::MissingApiKey)));
    }

    assert!(analyzer.calls().is_empty());
    assert_eq!(store.snapshot().await[0].status, ItemStatus::Idle);
}

#[tokio::test]
async fn test_second_run_while_running_is_rejected() {
    let store = new_store();
    store.enqueue(vec![media("a.mp4")]).await;

    let analyzer = Arc::new(BlockingAnalyzer::default());
    let runner = BatchRunner::new(store.clone(), analyzer.clone(), Some("key".to_string()));

    let background = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.run().await })
    };
    analyzer.started.notified().await;

    assert!(runner.is_running());
    let err = assert_err!(runner.run().await);
    assert!(matches!(err, AppError::Batch(BatchError::AlreadyRunning)));

    analyzer.release.notify_one();
    let summary = assert_ok!(background.await.unwrap());
    assert_eq!(summary.success, 1);
    assert!(!runner.is_running());
}

#[tokio::test]
async fn test_removing_item_during_analysis_discards_result() {
    let store = new_store();
    let ids = store.enqueue(vec![media("a.mp4"), media("b.mp4")]).await;

    let analyzer = Arc::new(BlockingAnalyzer::default());
    let runner = BatchRunner::new(store.clone(), analyzer.clone(), Some("key".to_string()));
    let background = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.run().await })
    };

    analyzer.started.notified().await;
    assert_eq!(store.get(ids[0]).await.unwrap().status, ItemStatus::Analyzing);
    assert_ok!(store.remove(ids[0]).await);
    assert_eq!(store.previews().released_count(), 1);
    analyzer.release.notify_one();

    analyzer.started.notified().await;
    analyzer.release.notify_one();

    let summary = assert_ok!(background.await.unwrap());
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.success, 1);
    assert!(store.get(ids[0]).await.is_none());
    assert_eq!(store.len().await, 1);
    assert_eq!(store.get(ids[1]).await.unwrap().status, ItemStatus::Success);
}

#[tokio::test]
async fn test_events_follow_each_transition() {
    let store = new_store();
    let ids = store.enqueue(vec![media("a.mp4"), media("b.mp4")]).await;
    let mut events = store.subscribe();

    let analyzer = Arc::new(ScriptedAnalyzer::failing(&["b.mp4"]));
    assert_ok!(BatchRunner::new(store.clone(), analyzer, Some("key".to_string())).run().await);

    let mut statuses = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            QueueEvent::StatusChanged { id, status } => statuses.push((id, status)),
            QueueEvent::BatchFinished(summary) => assert_eq!(summary.total, 2),
            _ => {}
        }
    }
    assert_eq!(
        statuses,
        vec![
            (ids[0], ItemStatus::Analyzing),
            (ids[0], ItemStatus::Success),
            (ids[1], ItemStatus::Analyzing),
            (ids[1], ItemStatus::Error),
        ]
    );
}

#[tokio::test]
async fn test_successful_item_renders_price_and_level() {
    let store = new_store();
    let ids = store.enqueue(vec![media("rocket.mp4")]).await;
    let analyzer = Arc::new(ScriptedAnalyzer::default());
    assert_ok!(BatchRunner::new(store.clone(), analyzer, Some("key".to_string())).run().await);

    let items = store.snapshot().await;
    let counts = store.counts().await;
    let queue = views::render_queue(&items, store.selected_id().await, &counts, false);
    assert!(queue.contains("rocket.mp4  $7"));
    assert!(queue.contains("等级 4"));

    let report = views::render_detail(&store.get(ids[0]).await.unwrap());
    assert!(report.contains("70,000 钻石"));
    assert!(report.contains("[等级 4]"));
}

#[tokio::test]
async fn test_selection_follows_current_item() {
    let store = new_store();
    let ids = store.enqueue(vec![media("a.mp4"), media("b.mp4")]).await;
    assert_eq!(store.selected_id().await, Some(ids[0]));

    let analyzer = Arc::new(ScriptedAnalyzer::default());
    assert_ok!(BatchRunner::new(store.clone(), analyzer, Some("key".to_string())).run().await);

    assert_eq!(store.selected_id().await, Some(ids[1]));
}
