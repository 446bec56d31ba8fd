// src/system.rs
use crate::fetcher;
use crate::query_cache::QueryHandle;
use crate::state::{SYSTEM_STATS, SYSTEM_STATS_KEY};
use crate::types::SystemStats;
use crate::SyncState;

// 系统状态面板走同一套缓存抽象，只是换了 key 和 fetcher

pub fn watch_stats(sync: &SyncState) -> QueryHandle<SystemStats> {
    let handle = SYSTEM_STATS.read(SYSTEM_STATS_KEY);
    let client = sync.http.clone();
    let config = sync.config.clone();
    SYSTEM_STATS.ensure_fetched(SYSTEM_STATS_KEY, sync.ready.clone(), move || async move {
        fetcher::fetch_system_stats(&client, &config).await
    });
    handle
}

/// 面板轮询用：每个周期强制刷新一次
pub fn refresh_stats(sync: &SyncState) {
    let client = sync.http.clone();
    let config = sync.config.clone();
    SYSTEM_STATS.refetch(SYSTEM_STATS_KEY, sync.ready.clone(), move || async move {
        fetcher::fetch_system_stats(&client, &config).await
    });
}
