// src/fetcher.rs
use crate::config::Config;
use crate::error::SyncError;
use crate::types::{InstanceInfo, InstanceListMap, SystemStats};
use tracing::warn;
use url::Url;

/// 拉取完整实例列表并整形成 uuid 索引的映射。
/// 这里不做任何缓存 —— 缓存是 ResourceCache 的事
pub async fn fetch_instance_list(
    client: &reqwest::Client,
    config: &Config,
) -> Result<InstanceListMap, SyncError> {
    let url = Url::parse(&format!("{}/instance/list", config.http_base()))?;
    let resp = client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SyncError::Transport(status));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| SyncError::Shape(format!("unreadable body: {}", e)))?;
    let records: Vec<InstanceInfo> = serde_json::from_str(&body).map_err(|e| {
        warn!(
            "❌ [FETCH] /instance/list parse failed: {} | Body (first 100): {:.100}",
            e, body
        );
        SyncError::Shape(e.to_string())
    })?;

    // 逐条折叠进映射。单次响应里出现重复 uuid 时静默后者覆盖前者
    // (uuid 唯一性由 core 保证，这里不加强)
    Ok(records
        .into_iter()
        .fold(InstanceListMap::new(), |mut map, info| {
            map.insert(info.uuid.clone(), info);
            map
        }))
}

/// 拉取系统状态面板数据
pub async fn fetch_system_stats(
    client: &reqwest::Client,
    config: &Config,
) -> Result<SystemStats, SyncError> {
    let url = Url::parse(&format!("{}/system/stats", config.http_base()))?;
    let resp = client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SyncError::Transport(status));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| SyncError::Shape(format!("unreadable body: {}", e)))?;
    serde_json::from_str(&body).map_err(|e| {
        warn!("❌ [FETCH] /system/stats parse failed: {}", e);
        SyncError::Shape(e.to_string())
    })
}
