// Shared fixtures for the core integration tests: a mock Mill backend
// and credential builders.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use millheat_api::{MillClient, TransportConfig};
use millheat_core::{Credential, Lifecycle, SessionManager, TokenStatus};

pub const DAY_MS: i64 = 86_400_000;

pub fn envelope(data: serde_json::Value) -> serde_json::Value {
    json!({
        "errorCode": 0,
        "message": "",
        "statusCode": 200,
        "success": true,
        "data": data
    })
}

pub fn api_error(code: i64, message: &str) -> serde_json::Value {
    json!({
        "errorCode": code,
        "message": message,
        "statusCode": 200,
        "success": false
    })
}

pub fn grant(access: &str, refresh: &str, expire_time: i64, refresh_expire_time: i64) -> serde_json::Value {
    envelope(json!({
        "access_token": access,
        "refresh_token": refresh,
        "expireTime": expire_time,
        "refresh_expireTime": refresh_expire_time
    }))
}

pub fn device(id: i64, current_temp: f64, setpoint: i64) -> serde_json::Value {
    json!({
        "deviceId": id,
        "deviceName": format!("heater-{id}"),
        "mac": format!("aa:bb:cc:00:00:{id:02x}"),
        "currentTemp": current_temp,
        "holidayTemp": setpoint,
        "deviceStatus": 0,
        "heaterFlag": 1,
        "controlType": 0,
        "canChangeTemp": 1
    })
}

pub fn valid_credential(access: &str, expire_time: i64, refresh_expire_time: i64) -> Credential {
    Credential {
        access_token: access.into(),
        refresh_token: format!("refresh-of-{access}"),
        expire_time,
        refresh_expire_time,
        status: TokenStatus::Valid,
    }
}

pub fn client_for(server: &MockServer) -> MillClient {
    MillClient::new(&server.uri(), &TransportConfig::default()).unwrap()
}

pub fn session_for(server: &MockServer, credential: Credential, lifecycle: &Lifecycle) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(client_for(server), credential, lifecycle.clone()))
}

pub async fn mount_homes(server: &MockServer, token: &str, home_ids: &[i64]) {
    let homes: Vec<_> = home_ids
        .iter()
        .map(|id| json!({ "homeId": id, "homeName": format!("home-{id}") }))
        .collect();
    Mock::given(method("POST"))
        .and(path("/uds/selectHomeList"))
        .and(header("Access_token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "homeList": homes }))))
        .mount(server)
        .await;
}

pub async fn mount_rooms(server: &MockServer, home_id: i64, room_ids: &[i64]) {
    let rooms: Vec<_> = room_ids
        .iter()
        .map(|id| json!({ "roomId": id, "roomName": format!("room-{id}") }))
        .collect();
    Mock::given(method("POST"))
        .and(path("/uds/selectRoombyHome"))
        .and(query_param("homeId", home_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "roomList": rooms }))))
        .mount(server)
        .await;
}

pub async fn mount_room_devices(server: &MockServer, room_id: i64, devices: Vec<serde_json::Value>) {
    Mock::given(method("POST"))
        .and(path("/uds/selectDevicebyRoom"))
        .and(query_param("roomId", room_id.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({ "deviceList": devices }))),
        )
        .mount(server)
        .await;
}

pub async fn mount_independent(server: &MockServer, home_id: i64, devices: Vec<serde_json::Value>) {
    Mock::given(method("POST"))
        .and(path("/uds/getIndependentDevices"))
        .and(query_param("homeId", home_id.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({ "deviceInfoList": devices }))),
        )
        .mount(server)
        .await;
}

/// One home, one room, two heaters: 21.5 °C without a setpoint and
/// 19.0 °C holding 22 °C.
pub async fn mount_single_room_home(server: &MockServer, token: &str) {
    mount_homes(server, token, &[1]).await;
    mount_rooms(server, 1, &[10]).await;
    mount_room_devices(server, 10, vec![device(100, 21.5, 0), device(101, 19.0, 22)]).await;
    mount_independent(server, 1, vec![]).await;
}
