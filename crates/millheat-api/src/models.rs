// Mill open API response types
//
// Every endpoint wraps its payload in the `MillResponse<T>` envelope.
// Fields use `#[serde(default)]` liberally: the vendor omits fields that
// do not apply to a given heater generation, and sends `null` for some
// it has no reading for. Both decode to the type's default.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Mill API response envelope.
///
/// ```json
/// { "errorCode": 0, "message": "", "statusCode": 200, "success": true, "data": {...} }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct MillResponse<T> {
    /// `0` means no error. Absent is treated as `0`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
}

// ── Tokens ───────────────────────────────────────────────────────────

/// `data` of `share/applyAuthCode`.
#[derive(Debug, Deserialize)]
pub struct AuthCodeData {
    pub authorization_code: String,
}

/// Token pair returned by `share/applyAccessToken` and `share/refreshtoken`.
///
/// Both expiry fields are epoch milliseconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "expireTime")]
    pub expire_time: i64,
    #[serde(rename = "refresh_expireTime")]
    pub refresh_expire_time: i64,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expire_time", &self.expire_time)
            .field("refresh_expire_time", &self.refresh_expire_time)
            .finish()
    }
}

// ── Homes ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HomeListData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub home_list: Vec<HomeInfo>,
}

/// Home object from `uds/selectHomeList`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeInfo {
    pub home_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub home_name: String,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_mode: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_holiday: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub holiday_start_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub holiday_end_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub holiday_temp: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode_start_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode_hour: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode_minute: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub program_id: i64,
    #[serde(default)]
    pub home_type: serde_json::Value,
}

// ── Rooms ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoomListData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub room_list: Vec<RoomInfo>,
}

/// Room object from `uds/selectRoombyHome`.
///
/// Carries no home id; the caller knows which home it asked about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub room_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_temp: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comfort_temp: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub away_temp: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sleep_temp: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub heat_status: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_mode: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_temperature: i32,
    #[serde(default)]
    pub control_source: Option<String>,
    #[serde(default)]
    pub room_program: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub online_device_num: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub off_line_device_num: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_offline: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub independent_count: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub independent_device_ids: Vec<serde_json::Value>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceListData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_list: Vec<DeviceInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndependentDeviceData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_info_list: Vec<DeviceInfo>,
}

/// Heater object from `uds/selectDevicebyRoom` and `uds/getIndependentDevices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mac: String,
    /// Measured temperature, Celsius.
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_temp: f64,
    /// Active hold/setpoint temperature. `0` when no hold is active.
    #[serde(default, rename = "holidayTemp", deserialize_with = "null_as_default")]
    pub setpoint_temp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_status: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub heater_flag: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub control_type: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub can_change_temp: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub change_temperature: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_temperature: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_domain_id: i64,
}
