// src/query_cache.rs
use crate::error::SyncError;
use crate::readiness::ReadinessGate;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

// 复合缓存键：("instances", "list") 这样的二元组，定位一条查询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ns: &'static str,
    pub op: &'static str,
}

impl CacheKey {
    pub const fn new(ns: &'static str, op: &'static str) -> Self {
        Self { ns, op }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ns, self.op)
    }
}

// 消费者看到的条目状态。data 缺失用 None 表达，绝不以错误形式出现
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T: Clone> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<Arc<SyncError>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T: Clone> QuerySnapshot<T> {
    fn empty() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            fetched_at: None,
        }
    }
}

struct CacheSlot<T: Clone> {
    tx: watch::Sender<QuerySnapshot<T>>,
    // 在途标记：同一 key 同时最多一个网络往返
    in_flight: Arc<AtomicBool>,
}

impl<T: Clone> CacheSlot<T> {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(QuerySnapshot::empty());
        Self {
            tx,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }
}

// 消费者手里的订阅句柄：读当前快照 + 等待下一次变更
pub struct QueryHandle<T: Clone> {
    rx: watch::Receiver<QuerySnapshot<T>>,
}

impl<T: Clone> QueryHandle<T> {
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        self.rx.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.rx.borrow().data.clone()
    }

    /// 挂起直到条目下一次被写入。缓存是进程级的，永不销毁，
    /// 返回 false 只会出现在测试拆除缓存之后
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

// 🟢 键寻址的资源缓存：fetch-once/read-many + 在途去重 + 原地修补。
// 条目在第一次订阅时惰性创建，进程存活期间不销毁
pub struct ResourceCache<T: Clone + Send + Sync + 'static> {
    entries: DashMap<CacheKey, CacheSlot<T>>,
}

impl<T: Clone + Send + Sync + 'static> ResourceCache<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 订阅一个键。条目不存在时创建空条目，永不失败
    pub fn read(&self, key: CacheKey) -> QueryHandle<T> {
        let slot = self.entries.entry(key).or_insert_with(CacheSlot::new);
        QueryHandle {
            rx: slot.tx.subscribe(),
        }
    }

    /// 消费者挂载时调用：已有数据或已有在途抓取则什么都不做
    pub fn ensure_fetched<F, Fut>(&'static self, key: CacheKey, gate: ReadinessGate, fetcher: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        self.trigger(key, gate, fetcher, false);
    }

    /// 显式失效并重新抓取。抓取期间旧数据保持可见
    pub fn refetch<F, Fut>(&'static self, key: CacheKey, gate: ReadinessGate, fetcher: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        self.trigger(key, gate, fetcher, true);
    }

    fn trigger<F, Fut>(&'static self, key: CacheKey, mut gate: ReadinessGate, fetcher: F, force: bool)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        let (in_flight, has_data) = {
            let slot = self.entries.entry(key).or_insert_with(CacheSlot::new);
            let has_data = slot.tx.borrow().data.is_some();
            (slot.in_flight.clone(), has_data)
        };

        if has_data && !force {
            return;
        }

        // 去重：抢不到在途标记说明别的消费者已经触发了同一次抓取
        if in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        tokio::spawn(async move {
            // 就绪门控：信号为 false 时不发任何请求，停在这里等上升沿。
            // 多个消费者并发触发时，只有抢到标记的这一个会走到网络层
            if !gate.became_ready().await {
                warn!("⏳ [QUERY] Readiness gate gone, dropping fetch for {}", key);
                in_flight.store(false, Ordering::Release);
                return;
            }

            self.with_slot(key, |slot| {
                slot.tx.send_modify(|snap| snap.is_loading = true);
            });

            info!("📥 [QUERY] Fetching {}", key);
            let started = Utc::now();
            let result = fetcher().await;

            self.with_slot(key, |slot| {
                slot.tx.send_modify(|snap| {
                    snap.is_loading = false;
                    match result {
                        Ok(value) => {
                            // 整体替换，不做合并
                            snap.data = Some(value);
                            snap.error = None;
                            snap.fetched_at = Some(started);
                        }
                        Err(e) => {
                            // 失败只记录错误，已有数据保持不动 (stale-while-error)
                            warn!("❌ [QUERY] Fetch {} failed: {}", key, e);
                            snap.error = Some(Arc::new(e));
                        }
                    }
                });
            });
            in_flight.store(false, Ordering::Release);
        });
    }

    fn with_slot(&self, key: CacheKey, f: impl FnOnce(&CacheSlot<T>)) {
        if let Some(slot) = self.entries.get(&key) {
            f(slot.value());
        }
    }

    /// 同步原地修补缓存值。闭包返回 true 表示确实改动了数据，此时通知
    /// 所有订阅者；条目不存在、还没有数据、或闭包返回 false 时为 no-op。
    /// 这里从不发起网络请求：调用方被假定已经确认过远端副作用
    /// (先行请求或推送事件)
    pub fn mutate(&self, key: CacheKey, f: impl FnOnce(&mut T) -> bool) -> bool {
        let Some(slot) = self.entries.get(&key) else {
            return false;
        };
        slot.tx.send_if_modified(|snap| match snap.data.as_mut() {
            Some(data) => f(data),
            None => false,
        })
    }
}
