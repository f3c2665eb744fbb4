//! 队列存储 - 流程层
//!
//! 持有有序的队列条目与当前选中项，是展示层唯一的数据来源。
//! 所有修改都经过这里的方法；每次修改都会广播一个 `QueueEvent`，
//! 订阅者可以实时看到每个条目的状态变化。

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::QueueError;
use crate::infrastructure::PreviewRegistry;
use crate::models::{ItemStatus, MediaFile, QueueItem, QueueItemView};
use crate::workflow::status::{next_state, Transition};

const EVENT_CAPACITY: usize = 256;

/// 队列变化事件
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Enqueued { ids: Vec<Uuid> },
    Removed { id: Uuid },
    Cleared { count: usize },
    SelectionChanged { id: Option<Uuid> },
    StatusChanged { id: Uuid, status: ItemStatus },
    BatchStarted { total: usize },
    BatchFinished(BatchSummary),
}

/// 各状态的条目数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub total: usize,
    pub idle: usize,
    pub analyzing: usize,
    pub success: usize,
    pub error: usize,
}

impl QueueCounts {
    /// 批量运行会处理的条目数（idle + error）
    pub fn pending(&self) -> usize {
        self.idle + self.error
    }
}

/// 一次批量运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// 开始时待处理的条目数
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// 运行期间被移除或状态已改变的条目
    pub skipped: usize,
}

#[derive(Default)]
struct QueueState {
    items: Vec<QueueItem>,
    selected: Option<Uuid>,
}

impl QueueState {
    fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn find_mut(&mut self, id: Uuid) -> Result<&mut QueueItem, QueueError> {
        self.items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(QueueError::NotFound { id })
    }
}

/// 队列存储
pub struct QueueStore {
    state: RwLock<QueueState>,
    previews: PreviewRegistry,
    events: broadcast::Sender<QueueEvent>,
}

impl QueueStore {
    pub fn new(previews: PreviewRegistry) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(QueueState::default()),
            previews,
            events,
        }
    }

    /// 订阅队列变化
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// 广播事件；没有订阅者时静默丢弃
    pub(crate) fn notify(&self, event: QueueEvent) {
        let _ = self.events.send(event);
    }

    /// 追加文件到队尾，保持输入顺序
    ///
    /// 重复文件作为独立条目处理。若之前没有选中项，选中第一个新条目。
    pub async fn enqueue(&self, files: Vec<MediaFile>) -> Vec<Uuid> {
        if files.is_empty() {
            return Vec::new();
        }

        let mut state = self.state.write().await;
        let ids: Vec<Uuid> = files
            .into_iter()
            .map(|file| {
                let preview = self.previews.acquire(&file);
                let item = QueueItem::new(file, preview);
                let id = item.id();
                state.items.push(item);
                id
            })
            .collect();

        info!("📥 加入队列 {} 个文件，当前共 {} 个", ids.len(), state.items.len());
        self.notify(QueueEvent::Enqueued { ids: ids.clone() });

        if state.selected.is_none() {
            state.selected = ids.first().copied();
            self.notify(QueueEvent::SelectionChanged { id: state.selected });
        }

        ids
    }

    /// 移除条目并释放其预览资源
    ///
    /// 若移除的是选中项，改为选中剩余的第一个（队列为空则不选中）
    pub async fn remove(&self, id: Uuid) -> Result<(), QueueError> {
        let mut state = self.state.write().await;
        let index = state.position(id).ok_or(QueueError::NotFound { id })?;

        let item = state.items.remove(index);
        debug!("移除条目 {} ({})", id, item.file().name());
        item.release();
        self.notify(QueueEvent::Removed { id });

        if state.selected == Some(id) {
            state.selected = state.items.first().map(QueueItem::id);
            self.notify(QueueEvent::SelectionChanged { id: state.selected });
        }
        Ok(())
    }

    /// 清空队列，释放所有预览资源，返回移除的条目数
    pub async fn clear(&self) -> usize {
        let mut state = self.state.write().await;
        let count = state.items.len();
        for item in state.items.drain(..) {
            item.release();
        }
        let had_selection = state.selected.take().is_some();

        info!("🗑️ 已清空队列 ({} 个条目)", count);
        self.notify(QueueEvent::Cleared { count });
        if had_selection {
            self.notify(QueueEvent::SelectionChanged { id: None });
        }
        count
    }

    /// 选中条目；不存在时保持原选中项不变
    pub async fn select(&self, id: Uuid) -> Result<(), QueueError> {
        let mut state = self.state.write().await;
        if state.position(id).is_none() {
            return Err(QueueError::NotFound { id });
        }
        if state.selected != Some(id) {
            state.selected = Some(id);
            self.notify(QueueEvent::SelectionChanged { id: Some(id) });
        }
        Ok(())
    }

    /// 对单个条目做一次原子的状态转换
    pub async fn set_status(&self, id: Uuid, transition: Transition) -> Result<ItemStatus, QueueError> {
        let mut state = self.state.write().await;
        self.apply(&mut state, id, transition)
    }

    /// 把条目转入 analyzing 并选中它，返回待分析的文件
    pub async fn begin_analysis(&self, id: Uuid) -> Result<MediaFile, QueueError> {
        let mut state = self.state.write().await;
        self.apply(&mut state, id, Transition::StartAnalyzing)?;

        if state.selected != Some(id) {
            state.selected = Some(id);
            self.notify(QueueEvent::SelectionChanged { id: Some(id) });
        }
        let item = state.find_mut(id)?;
        Ok(item.file().clone())
    }

    fn apply(&self, state: &mut QueueState, id: Uuid, transition: Transition) -> Result<ItemStatus, QueueError> {
        let item = state.find_mut(id)?;
        let from = item.status();
        let to = transition.target();
        let next = next_state(item.state(), transition)
            .ok_or(QueueError::InvalidTransition { id, from, to })?;

        item.state = next;
        debug!("条目 {} 状态: {} → {}", id, from, to);
        self.notify(QueueEvent::StatusChanged { id, status: to });
        Ok(to)
    }

    // ========== 只读查询 ==========

    /// 按插入顺序返回所有条目的快照
    pub async fn snapshot(&self) -> Vec<QueueItemView> {
        self.state.read().await.items.iter().map(QueueItem::view).collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<QueueItemView> {
        let state = self.state.read().await;
        state.items.iter().find(|item| item.id() == id).map(QueueItem::view)
    }

    pub async fn selected_id(&self) -> Option<Uuid> {
        self.state.read().await.selected
    }

    pub async fn selected(&self) -> Option<QueueItemView> {
        let state = self.state.read().await;
        let id = state.selected?;
        state.items.iter().find(|item| item.id() == id).map(QueueItem::view)
    }

    /// 待处理（idle 或 error）的条目，按队列顺序
    pub async fn pending_ids(&self) -> Vec<Uuid> {
        self.state
            .read()
            .await
            .items
            .iter()
            .filter(|item| item.status().is_pending())
            .map(QueueItem::id)
            .collect()
    }

    pub async fn counts(&self) -> QueueCounts {
        let state = self.state.read().await;
        let mut counts = QueueCounts {
            total: state.items.len(),
            ..Default::default()
        };
        for item in &state.items {
            match item.status() {
                ItemStatus::Idle => counts.idle += 1,
                ItemStatus::Analyzing => counts.analyzing += 1,
                ItemStatus::Success => counts.success += 1,
                ItemStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new(PreviewRegistry::new())
    }
}
