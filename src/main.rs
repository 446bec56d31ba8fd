// src/main.rs
use dashboard_core::{
    config::Config, core_task, init_tracing, instances, readiness, setup_sync_state, system,
    types::InstanceState,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    init_tracing();
    info!("📟 Starting instance monitor");

    let config = Arc::new(Config::new());
    let (ready_tx, ready_rx) = readiness::channel();
    let sync = setup_sync_state(config, ready_rx);

    // 连接任务持有就绪信号的写端
    tokio::spawn(core_task::run(sync.clone(), ready_tx));

    // 系统状态面板：低频轮询
    let stats_sync = sync.clone();
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(30));
        let mut handle = system::watch_stats(&stats_sync);
        loop {
            tokio::select! {
                _ = timer.tick() => system::refresh_stats(&stats_sync),
                ok = handle.changed() => {
                    if !ok {
                        break;
                    }
                    if let Some(stats) = handle.data() {
                        info!(
                            "💻 [STATS] cpu {:.1}% | ram {}/{} MiB | up {}s",
                            stats.cpu_usage, stats.ram_used, stats.ram_total, stats.uptime
                        );
                    }
                }
            }
        }
    });

    // 实例列表：订阅 + 变更摘要 (真实 UI 消费者的替身)
    let mut handle = instances::watch_list(&sync);
    loop {
        let snap = handle.snapshot();
        if let Some(err) = &snap.error {
            info!("⚠️ [LIST] Last fetch failed: {}", err);
        }
        if let Some(map) = &snap.data {
            let running = map
                .values()
                .filter(|i| i.state == InstanceState::Running)
                .count();
            info!("📋 [LIST] {} instances ({} running)", map.len(), running);
        }
        if !handle.changed().await {
            break;
        }
    }
}
