// ── Device domain type ──

use serde::{Deserialize, Serialize};

use super::ids::{DeviceId, RoomId};

/// A Mill heater as seen in one inventory snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub mac: String,
    pub name: String,
    /// Measured temperature, Celsius.
    pub current_temp: f64,
    /// Active hold temperature, Celsius, exactly as the vendor reports it.
    /// `0` means no hold or schedule override is active.
    pub setpoint_temp: i64,
    /// Room the device was listed under; `None` for independent devices.
    pub room_id: Option<RoomId>,
    pub status: DeviceStatus,
}

/// Raw vendor status flags, kept for downstream consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_status: i32,
    pub heater_flag: i32,
    pub control_type: i32,
    pub can_change_temp: bool,
}

impl Device {
    pub fn is_independent(&self) -> bool {
        self.room_id.is_none()
    }

    /// Whether a hold temperature is currently set.
    pub fn has_setpoint(&self) -> bool {
        self.setpoint_temp != 0
    }
}
