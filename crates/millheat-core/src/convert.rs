// ── API → domain conversions ──
//
// Wire types from `millheat_api` carry no parent references; the fetch
// path supplies them. Rooms learn their home, devices their room.

use millheat_api::{DeviceInfo, HomeInfo, RoomInfo};

use crate::model::device::DeviceStatus;
use crate::model::inventory::Holiday;
use crate::model::{Device, DeviceId, Home, HomeId, Room, RoomId};

impl From<HomeInfo> for Home {
    fn from(h: HomeInfo) -> Self {
        Self {
            id: HomeId(h.home_id),
            name: h.home_name,
            timezone: h.time_zone,
            current_mode: h.current_mode,
            holiday: Holiday {
                active: h.is_holiday != 0,
                start_time: h.holiday_start_time,
                end_time: h.holiday_end_time,
                temp: h.holiday_temp,
            },
        }
    }
}

impl Room {
    pub(crate) fn from_api(r: RoomInfo, home_id: HomeId) -> Self {
        Self {
            id: RoomId(r.room_id),
            name: r.room_name,
            home_id,
            avg_temp: r.avg_temp,
            comfort_temp: r.comfort_temp,
            away_temp: r.away_temp,
            sleep_temp: r.sleep_temp,
            heat_status: r.heat_status,
        }
    }
}

impl Device {
    pub(crate) fn from_api(d: DeviceInfo, room_id: Option<RoomId>) -> Self {
        Self {
            id: DeviceId(d.device_id),
            mac: d.mac,
            name: d.device_name,
            current_temp: d.current_temp,
            setpoint_temp: d.setpoint_temp,
            room_id,
            status: DeviceStatus {
                device_status: d.device_status,
                heater_flag: d.heater_flag,
                control_type: d.control_type,
                can_change_temp: d.can_change_temp != 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_info(json: serde_json::Value) -> DeviceInfo {
        serde_json::from_value(json).expect("valid device json")
    }

    #[test]
    fn device_keeps_vendor_setpoint_and_room() {
        let info = device_info(serde_json::json!({
            "deviceId": 9,
            "deviceName": "Hall",
            "mac": "00:11",
            "currentTemp": 18.25,
            "holidayTemp": 21,
            "canChangeTemp": 1
        }));

        let device = Device::from_api(info, Some(RoomId(3)));

        assert_eq!(device.id, DeviceId(9));
        assert_eq!(device.setpoint_temp, 21);
        assert_eq!(device.room_id, Some(RoomId(3)));
        assert!(device.status.can_change_temp);
        assert!(!device.is_independent());
    }

    #[test]
    fn home_holiday_flag() {
        let info: HomeInfo = serde_json::from_value(serde_json::json!({
            "homeId": 1,
            "homeName": "Main",
            "isHoliday": 1,
            "holidayTemp": 12
        }))
        .expect("valid home json");

        let home = Home::from(info);
        assert!(home.holiday.active);
        assert_eq!(home.holiday.temp, 12);
    }
}
