//! 预览资源 - 基础设施层
//!
//! 每个队列条目持有一个 `PreviewHandle`，通过 `preview://` 地址引用文件内容。
//! 句柄在条目移除或队列清空时释放，且只释放一次：
//! 显式 `release()` 会消费句柄，否则在 `Drop` 时释放。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use crate::models::MediaFile;

const SCHEME: &str = "preview://";

/// 预览资源登记表
///
/// 克隆后共享同一张表
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    entries: Mutex<HashMap<String, MediaFile>>,
    released: AtomicU64,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为文件创建预览句柄
    pub fn acquire(&self, file: &MediaFile) -> PreviewHandle {
        let url = format!("{}{}/{}", SCHEME, Uuid::new_v4(), file.name());
        self.entries().insert(url.clone(), file.clone());
        debug!("创建预览资源: {}", url);
        PreviewHandle {
            url,
            registry: Some(self.clone()),
        }
    }

    /// 通过预览地址取回文件内容，已释放的地址返回 `None`
    pub fn resolve(&self, url: &str) -> Option<MediaFile> {
        self.entries().get(url).cloned()
    }

    /// 当前仍存活的预览数量
    pub fn active_count(&self) -> usize {
        self.entries().len()
    }

    /// 累计释放次数
    pub fn released_count(&self) -> u64 {
        self.inner.released.load(Ordering::SeqCst)
    }

    fn release(&self, url: &str) {
        if self.entries().remove(url).is_some() {
            self.inner.released.fetch_add(1, Ordering::SeqCst);
            debug!("释放预览资源: {}", url);
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, MediaFile>> {
        // 表内只有插入/删除，中途 panic 不会留下不一致的状态
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 预览句柄，独占一份预览资源
pub struct PreviewHandle {
    url: String,
    registry: Option<PreviewRegistry>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 显式释放
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.release(&self.url);
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("url", &self.url)
            .field("released", &self.registry.is_none())
            .finish()
    }
}
