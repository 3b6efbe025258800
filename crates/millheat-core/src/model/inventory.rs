// ── Home, room and snapshot domain types ──

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::Device;
use super::ids::{DeviceId, HomeId, RoomId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Home {
    pub id: HomeId,
    pub name: String,
    pub timezone: Option<String>,
    pub current_mode: i32,
    pub holiday: Holiday,
}

/// Holiday settings of a home. Carried through, never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub active: bool,
    pub start_time: i64,
    pub end_time: i64,
    pub temp: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Home the room was listed under (reference, not ownership).
    pub home_id: HomeId,
    pub avg_temp: i32,
    pub comfort_temp: i32,
    pub away_temp: i32,
    pub sleep_temp: i32,
    pub heat_status: i32,
}

/// Everything one fetch cycle produced.
///
/// Replaced wholesale on every tick; nothing is merged across snapshots.
/// `devices` is the union of room devices and independent devices;
/// `independent_devices` repeats the subset with no room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub homes: Vec<Home>,
    pub rooms: Vec<Room>,
    pub devices: Vec<Device>,
    pub independent_devices: Vec<Device>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl InventorySnapshot {
    /// The set of device ids, for comparing snapshots across ticks.
    pub fn device_ids(&self) -> BTreeSet<DeviceId> {
        self.devices.iter().map(|d| d.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.homes.is_empty() && self.devices.is_empty()
    }
}
