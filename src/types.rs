// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

// ==============================================================================
// 1. Core 后端契约类型 (字段为 snake_case，与 core 的 JSON 保持一致)
// ==============================================================================

// 实例的生命周期状态。变体集合由 core 的契约所有，这里只做镜像
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, TS)]
#[ts(export)]
pub enum InstanceState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Crashed,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Flavour {
    Vanilla,
    Fabric,
    Paper,
    Spigot,
}

// 目前只有一个变体，core 侧预留了扩展空间
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameType {
    MinecraftJava,
}

// 🟢 单个实例在抓取时刻的完整快照 (约定上不可变，所有变更走缓存操作)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, TS)]
#[ts(export)]
pub struct InstanceInfo {
    pub uuid: String,
    pub name: String,
    pub flavour: Flavour,
    pub game_type: GameType,
    pub cmd_args: Vec<String>,
    pub description: String,
    pub port: u32,
    pub min_ram: Option<u32>, // null 表示未设置/默认值
    pub max_ram: Option<u32>,
    pub creation_time: i64,
    pub path: String,
    pub auto_start: bool,
    pub restart_on_crash: bool,
    pub timeout_last_left: Option<u32>,
    pub timeout_no_activity: Option<u32>,
    pub start_on_connection: bool,
    pub backup_period: Option<u32>,
    pub state: InstanceState,

    // 只有运行中的游戏服务器才有玩家数
    pub player_cnt: Option<u32>,
    pub max_player_cnt: Option<u32>,
}

// ==============================================================================
// 2. 物化后的缓存值
// ==============================================================================

// uuid -> InstanceInfo。列表查询的物化缓存值：
// 每次成功抓取整体重建 (full replace)，单条 update/delete 原地修补
pub type InstanceListMap = HashMap<String, InstanceInfo>;

// ==============================================================================
// 3. 系统状态面板数据
// ==============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, TS)]
#[ts(export)]
pub struct SystemStats {
    pub cpu_usage: f64,
    pub ram_used: u64,
    pub ram_total: u64,
    pub uptime: u64,
}
