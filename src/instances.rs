// src/instances.rs
use crate::events::{Event, EventInner, InstanceEventInner};
use crate::fetcher;
use crate::query_cache::QueryHandle;
use crate::state::{INSTANCE_LIST, INSTANCE_LIST_KEY};
use crate::types::{InstanceInfo, InstanceListMap, InstanceState};
use crate::SyncState;
use tracing::{debug, info};

// 实例列表的统一消费入口。旧版 dispatch/store 路径在这里收敛成
// 同一条带去重的缓存通道，不再保留第二个数据源

/// UI 消费者挂载时调用：订阅实例列表，必要时触发首次抓取。
/// 已有数据或已有在途抓取时只订阅，不产生新的网络往返
pub fn watch_list(sync: &SyncState) -> QueryHandle<InstanceListMap> {
    let handle = INSTANCE_LIST.read(INSTANCE_LIST_KEY);
    let client = sync.http.clone();
    let config = sync.config.clone();
    INSTANCE_LIST.ensure_fetched(INSTANCE_LIST_KEY, sync.ready.clone(), move || async move {
        fetcher::fetch_instance_list(&client, &config).await
    });
    handle
}

/// 显式重新抓取 (刷新按钮、重连之后)。抓取期间旧列表保持可见
pub fn refresh_list(sync: &SyncState) {
    let client = sync.http.clone();
    let config = sync.config.clone();
    INSTANCE_LIST.refetch(INSTANCE_LIST_KEY, sync.ready.clone(), move || async move {
        fetcher::fetch_instance_list(&client, &config).await
    });
}

/// 修补单条记录，其余条目原样不动。uuid 不在映射里时为 no-op (返回 false)。
/// 不发网络请求：远端副作用由调用方先行确认
pub fn update_instance(uuid: &str, f: impl FnOnce(&mut InstanceInfo)) -> bool {
    INSTANCE_LIST.mutate(INSTANCE_LIST_KEY, |map| match map.get_mut(uuid) {
        Some(info) => {
            f(info);
            true
        }
        None => false,
    })
}

/// 从缓存里移除单条记录。uuid 不存在时为 no-op (返回 false)
pub fn delete_instance(uuid: &str) -> bool {
    INSTANCE_LIST.mutate(INSTANCE_LIST_KEY, |map| map.remove(uuid).is_some())
}

/// core 推送事件 → 本地缓存修补。console/进度/用户类事件不动缓存
pub fn apply_event(event: &Event) {
    let EventInner::InstanceEvent(ev) = &event.event_inner else {
        return;
    };
    let uuid = ev.instance_uuid.as_str();

    use InstanceEventInner as E;
    let applied = match &ev.instance_event_inner {
        E::InstanceStarting => update_instance(uuid, |i| i.state = InstanceState::Starting),
        E::InstanceStarted => update_instance(uuid, |i| {
            i.state = InstanceState::Running;
            // 刚启动的服务器从 0 个玩家开始计数
            i.player_cnt.get_or_insert(0);
        }),
        E::InstanceStopping => update_instance(uuid, |i| i.state = InstanceState::Stopping),
        E::InstanceStopped => update_instance(uuid, |i| {
            i.state = InstanceState::Stopped;
            i.player_cnt = None;
            i.max_player_cnt = None;
        }),
        E::InstanceError => update_instance(uuid, |i| i.state = InstanceState::Crashed),
        E::InstanceCreationFailed => {
            let removed = delete_instance(uuid);
            if removed {
                info!("🗑️ [EVENT] Creation failed, dropped {} from cache", uuid);
            }
            removed
        }
        E::PlayerChange { player_list } => {
            let cnt = player_list.len() as u32;
            update_instance(uuid, |i| i.player_cnt = Some(cnt))
        }
        E::PlayerJoined { .. } => {
            update_instance(uuid, |i| i.player_cnt = Some(i.player_cnt.unwrap_or(0) + 1))
        }
        E::PlayerLeft { .. } => update_instance(uuid, |i| {
            i.player_cnt = Some(i.player_cnt.unwrap_or(0).saturating_sub(1))
        }),
        // InstanceWarning / 输入输出 / 聊天消息：纯 console 展示，列表缓存无感
        _ => false,
    };

    if applied {
        debug!("🔧 [EVENT] Patched {} <- {:?}", uuid, ev.instance_event_inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InstanceEvent;
    use crate::readiness;
    use crate::types::{Flavour, GameType};
    use serial_test::serial;
    use std::collections::{HashMap, HashSet};

    fn stub_instance(uuid: &str, name: &str) -> InstanceInfo {
        InstanceInfo {
            uuid: uuid.to_string(),
            name: name.to_string(),
            flavour: Flavour::Fabric,
            game_type: GameType::MinecraftJava,
            cmd_args: vec![],
            description: "test".to_string(),
            port: 25565,
            min_ram: None,
            max_ram: None,
            creation_time: 1_700_000_000,
            path: format!("/srv/{}", name),
            auto_start: false,
            restart_on_crash: false,
            timeout_last_left: None,
            timeout_no_activity: None,
            start_on_connection: false,
            backup_period: None,
            state: InstanceState::Stopped,
            player_cnt: None,
            max_player_cnt: None,
        }
    }

    fn instance_event(uuid: &str, inner: InstanceEventInner) -> Event {
        Event {
            event_inner: EventInner::InstanceEvent(InstanceEvent {
                instance_uuid: uuid.to_string(),
                instance_name: "name".to_string(),
                instance_event_inner: inner,
            }),
            details: String::new(),
            timestamp: chrono::Utc::now().timestamp(),
            idempotency: uuid::Uuid::new_v4().to_string(),
        }
    }

    // 全量替换地播种进程级缓存 (测试串行执行，互不干扰)
    async fn seed(map: InstanceListMap) {
        let (tx, gate) = readiness::channel();
        tx.set_ready(true);
        let mut handle = INSTANCE_LIST.read(INSTANCE_LIST_KEY);
        let expected = map.clone();
        INSTANCE_LIST.refetch(INSTANCE_LIST_KEY, gate, move || async move { Ok(map) });
        while handle.data().as_ref() != Some(&expected) {
            assert!(handle.changed().await);
        }
    }

    fn current() -> InstanceListMap {
        INSTANCE_LIST.read(INSTANCE_LIST_KEY).data().unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn update_then_delete_scenario() {
        seed(HashMap::from([
            ("a1".to_string(), stub_instance("a1", "alpha")),
            ("b1".to_string(), stub_instance("b1", "beta")),
        ]))
        .await;

        assert!(update_instance("a1", |i| i.name = "X".to_string()));
        let map = current();
        assert_eq!(map["a1"].name, "X");
        assert_eq!(map["b1"], stub_instance("b1", "beta"), "b1 untouched");

        assert!(delete_instance("b1"));
        let map = current();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a1"].name, "X");
    }

    #[tokio::test]
    #[serial]
    async fn missing_uuid_is_a_quiet_noop() {
        seed(HashMap::from([(
            "c1".to_string(),
            stub_instance("c1", "gamma"),
        )]))
        .await;

        assert!(!update_instance("nope", |i| i.name = "Y".to_string()));
        assert!(!delete_instance("nope"));
        let map = current();
        assert_eq!(map.len(), 1);
        assert_eq!(map["c1"].name, "gamma");
    }

    #[tokio::test]
    #[serial]
    async fn lifecycle_events_patch_state_and_players() {
        seed(HashMap::from([(
            "d1".to_string(),
            stub_instance("d1", "delta"),
        )]))
        .await;

        apply_event(&instance_event("d1", InstanceEventInner::InstanceStarting));
        assert_eq!(current()["d1"].state, InstanceState::Starting);

        apply_event(&instance_event("d1", InstanceEventInner::InstanceStarted));
        let map = current();
        assert_eq!(map["d1"].state, InstanceState::Running);
        assert_eq!(map["d1"].player_cnt, Some(0));

        apply_event(&instance_event(
            "d1",
            InstanceEventInner::PlayerChange {
                player_list: HashSet::from(["steve".to_string(), "alex".to_string()]),
            },
        ));
        assert_eq!(current()["d1"].player_cnt, Some(2));

        apply_event(&instance_event(
            "d1",
            InstanceEventInner::PlayerJoined {
                player: "herobrine".to_string(),
            },
        ));
        assert_eq!(current()["d1"].player_cnt, Some(3));

        apply_event(&instance_event(
            "d1",
            InstanceEventInner::PlayerLeft {
                player: "steve".to_string(),
            },
        ));
        assert_eq!(current()["d1"].player_cnt, Some(2));

        apply_event(&instance_event("d1", InstanceEventInner::InstanceStopped));
        let map = current();
        assert_eq!(map["d1"].state, InstanceState::Stopped);
        assert_eq!(map["d1"].player_cnt, None);
        assert_eq!(map["d1"].max_player_cnt, None);
    }

    #[tokio::test]
    #[serial]
    async fn creation_failed_event_drops_the_record() {
        seed(HashMap::from([
            ("e1".to_string(), stub_instance("e1", "eps")),
            ("e2".to_string(), stub_instance("e2", "zeta")),
        ]))
        .await;

        apply_event(&instance_event(
            "e1",
            InstanceEventInner::InstanceCreationFailed,
        ));
        let map = current();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("e2"));
    }

    #[tokio::test]
    #[serial]
    async fn console_and_unknown_uuid_events_change_nothing() {
        seed(HashMap::from([(
            "f1".to_string(),
            stub_instance("f1", "eta"),
        )]))
        .await;
        let before = current();

        apply_event(&instance_event(
            "f1",
            InstanceEventInner::InstanceOutput {
                message: "[Server] Done".to_string(),
            },
        ));
        apply_event(&instance_event(
            "ghost",
            InstanceEventInner::InstanceStarted,
        ));
        assert_eq!(current(), before);
    }
}
