// src/core_task.rs
use crate::instances;
use crate::readiness::ReadinessHandle;
use crate::SyncState;
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

// ✨ 核心入口：维护到 core 事件流的长连接。
// 握手成功翻起就绪信号，断开立即放下，然后无限重连
pub async fn run(sync: SyncState, ready: ReadinessHandle) {
    info!("🚀 [CORE] Starting event stream manager...");
    loop {
        let conn_id = Uuid::new_v4();
        let result = connect_and_serve(&sync, &ready, conn_id).await;

        // 走到这里连接一定已经断开，先放下信号再说
        ready.set_ready(false);
        match result {
            Ok(()) => warn!(
                "🔁 [CORE {}] Disconnected gracefully. Reconnecting in {:?}...",
                conn_id, sync.config.reconnect_delay
            ),
            Err(e) => error!(
                "🔁 [CORE {}] Connection crash: {:#?}. Reconnecting in {:?}...",
                conn_id, e, sync.config.reconnect_delay
            ),
        }
        sleep(sync.config.reconnect_delay).await;
    }
}

async fn connect_and_serve(sync: &SyncState, ready: &ReadinessHandle, conn_id: Uuid) -> Result<()> {
    let url = sync.config.events_url();
    let (ws_stream, response) = connect_async(url.as_str())
        .await
        .context("WebSocket handshake failed")?;
    info!(
        "✅ [CORE {}] Connected to {}! Status: {}",
        conn_id,
        url,
        response.status()
    );

    ready.set_ready(true);
    // 断线期间列表可能已经漂移，重连后强制刷新一次
    instances::refresh_list(sync);

    let (mut write, mut read) = ws_stream.split();

    while let Some(frame) = read.next().await {
        match frame? {
            Message::Text(text) => {
                match serde_json::from_str::<crate::events::Event>(text.as_str()) {
                    Ok(event) => instances::apply_event(&event),
                    Err(e) => warn!(
                        "❌ [CORE {}] Undecodable event: {} | Body (first 100): {:.100}",
                        conn_id, e, text
                    ),
                }
            }
            Message::Ping(payload) => write.send(Message::Pong(payload)).await?,
            Message::Close(_) => {
                info!("👋 [CORE {}] Server closed the stream", conn_id);
                break;
            }
            _ => {}
        }
    }
    Ok(())
}
