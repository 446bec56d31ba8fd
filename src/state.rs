// src/state.rs
use crate::query_cache::{CacheKey, ResourceCache};
use crate::types::{InstanceListMap, SystemStats};
use once_cell::sync::Lazy;

// 进程级缓存注册表：惰性构建，进程退出前不销毁。
// 所有独立挂载的消费者共享同一份数据，访问只经由 read/fetch/mutate

pub const INSTANCE_LIST_KEY: CacheKey = CacheKey::new("instances", "list");
pub const SYSTEM_STATS_KEY: CacheKey = CacheKey::new("system", "stats");

pub static INSTANCE_LIST: Lazy<ResourceCache<InstanceListMap>> = Lazy::new(ResourceCache::new);
pub static SYSTEM_STATS: Lazy<ResourceCache<SystemStats>> = Lazy::new(ResourceCache::new);
