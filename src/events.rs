// src/events.rs
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// core 推送事件的契约镜像。console/进度类变体必须能反序列化，
// 但它们不会触发任何缓存修补

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum InstanceEventInner {
    InstanceStarting,
    InstanceStarted,
    InstanceStopping,
    InstanceStopped,
    InstanceWarning,
    InstanceError,
    InstanceCreationFailed,
    InstanceInput {
        message: String,
    },
    InstanceOutput {
        message: String,
    },
    SystemMessage {
        message: String,
    },
    PlayerChange {
        player_list: HashSet<String>,
    },
    PlayerJoined {
        player: String,
    },
    PlayerLeft {
        player: String,
    },
    PlayerMessage {
        player: String,
        player_message: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export)]
pub struct InstanceEvent {
    pub instance_uuid: String,
    pub instance_name: String,
    pub instance_event_inner: InstanceEventInner,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum UserEventInner {
    UserCreated,
    UserDeleted,
    UserLoggedIn,
    UserLoggedOut,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export)]
pub struct UserEvent {
    pub user_id: String,
    pub user_event_inner: UserEventInner,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum EventInner {
    InstanceEvent(InstanceEvent),
    UserEvent(UserEvent),
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[serde(rename = "ClientEvent")]
#[ts(export)]
pub struct Event {
    pub event_inner: EventInner,
    pub details: String,
    pub timestamp: i64,
    pub idempotency: String,
}

impl Event {
    pub fn instance_uuid(&self) -> Option<&str> {
        match &self.event_inner {
            EventInner::InstanceEvent(ev) => Some(&ev.instance_uuid),
            _ => None,
        }
    }
}
