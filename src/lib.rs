// src/lib.rs
pub mod config;
pub mod core_task;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod instances;
pub mod query_cache;
pub mod readiness;
pub mod state;
pub mod system;
pub mod types;

use config::Config;
use readiness::ReadinessGate;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 所有消费者共享的同步上下文：配置 + HTTP 客户端 + 就绪信号的只读侧
#[derive(Clone)]
pub struct SyncState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub ready: ReadinessGate,
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard_core=info,monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn setup_sync_state(config: Arc<Config>, ready: ReadinessGate) -> SyncState {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .expect("Failed to build HTTP client");
    SyncState {
        config,
        http,
        ready,
    }
}
