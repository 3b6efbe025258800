// ── MQTT transport ──
//
// Publishes facts as bus messages and turns inbound setpoint commands
// into `Bridge::set_device_temperature` calls. Topic addressing:
//
//   pt:j1/mt:evt/rt:dev/rn:mill/ad:1/sv:<service>/ad:<device_id>
//   pt:j1/mt:cmd/rt:dev/rn:mill/ad:1/sv:thermostat/ad:<device_id>

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use millheat_config::Mqtt;
use millheat_core::error::PublishError;
use millheat_core::{Bridge, DeviceId, Fact, Publisher};

const EVT_PREFIX: &str = "pt:j1/mt:evt/rt:dev/rn:mill/ad:1";
const CMD_PREFIX: &str = "pt:j1/mt:cmd/rt:dev/rn:mill/ad:1";
const SERVICE_SENSOR_TEMP: &str = "sensor_temp";
const SERVICE_THERMOSTAT: &str = "thermostat";
const CMD_SETPOINT_SET: &str = "cmd.setpoint.set";
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// One message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub serv: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub val_t: String,
    #[serde(default)]
    pub val: serde_json::Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctime: Option<String>,
}

fn event_topic(service: &str, device_id: DeviceId) -> String {
    format!("{EVT_PREFIX}/sv:{service}/ad:{device_id}")
}

/// Topic and message for one fact.
pub fn fact_message(fact: &Fact) -> (String, BusMessage) {
    let ctime = Some(Utc::now().to_rfc3339());
    match fact {
        Fact::TemperatureReport {
            device_id,
            value,
            unit,
        } => (
            event_topic(SERVICE_SENSOR_TEMP, *device_id),
            BusMessage {
                serv: SERVICE_SENSOR_TEMP.into(),
                msg_type: "evt.sensor.report".into(),
                val_t: "float".into(),
                val: serde_json::json!(value),
                props: BTreeMap::from([("unit".to_owned(), (*unit).to_owned())]),
                ctime,
            },
        ),
        Fact::SetpointReport {
            device_id,
            value,
            setpoint_type,
            unit,
        } => (
            event_topic(SERVICE_THERMOSTAT, *device_id),
            BusMessage {
                serv: SERVICE_THERMOSTAT.into(),
                msg_type: "evt.setpoint.report".into(),
                val_t: "str_map".into(),
                val: serde_json::json!({
                    "type": setpoint_type,
                    "temp": value,
                    "unit": unit,
                }),
                props: BTreeMap::new(),
                ctime,
            },
        ),
    }
}

/// A parsed `cmd.setpoint.set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetpointCommand {
    pub device_id: DeviceId,
    pub temperature: i64,
}

/// Parse an inbound publish into a setpoint command, if it is one.
pub fn parse_setpoint_command(topic: &str, payload: &[u8]) -> Option<SetpointCommand> {
    let address = topic
        .strip_prefix(CMD_PREFIX)?
        .strip_prefix(&format!("/sv:{SERVICE_THERMOSTAT}/ad:"))?;
    let device_id: DeviceId = address.parse().ok()?;

    let msg: BusMessage = match serde_json::from_slice(payload) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(topic, error = %e, "ignoring undecodable command");
            return None;
        }
    };
    if msg.msg_type != CMD_SETPOINT_SET {
        debug!(topic, msg_type = %msg.msg_type, "ignoring unsupported command");
        return None;
    }

    let temp = msg.val.get("temp")?;
    let celsius = match temp {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        other => other.as_f64()?,
    };
    if !celsius.is_finite() {
        return None;
    }

    Some(SetpointCommand {
        device_id,
        temperature: round_celsius(celsius)?,
    })
}

/// Whole degrees, as the vendor control endpoint expects.
fn round_celsius(celsius: f64) -> Option<i64> {
    let rounded = celsius.round();
    if rounded.abs() > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    let whole = rounded as i64;
    Some(whole)
}

// ── Publisher ───────────────────────────────────────────────────────

/// Hands facts to the MQTT client. When the request queue is full the
/// call waits for the event loop to drain it.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, fact: &Fact) -> Result<(), PublishError> {
        let (topic, message) = fact_message(fact);
        let payload = serde_json::to_vec(&message).map_err(|e| PublishError(e.to_string()))?;
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| PublishError(e.to_string()))
    }
}

// ── Connection ──────────────────────────────────────────────────────

pub fn connect(config: &Mqtt, password: Option<&SecretString>) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(Duration::from_secs(30));
    if let Some(user) = config.username.as_deref().filter(|u| !u.is_empty()) {
        let pass = password.map(|p| p.expose_secret().to_owned()).unwrap_or_default();
        options.set_credentials(user, pass);
    }
    AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY)
}

/// Drive the MQTT connection until `cancel` fires. Subscribes to the
/// command topics on every (re)connect.
pub async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    bridge: Bridge,
    cancel: CancellationToken,
) {
    let command_filter = format!("{CMD_PREFIX}/sv:{SERVICE_THERMOSTAT}/+");

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                info!("mqtt connected");
                if let Err(e) = client.try_subscribe(&command_filter, QoS::AtLeastOnce) {
                    warn!(error = %e, "could not subscribe to command topics");
                }
            }
            Ok(Event::Incoming(Incoming::Publish(message))) => {
                if let Some(cmd) = parse_setpoint_command(&message.topic, &message.payload) {
                    let bridge = bridge.clone();
                    tokio::spawn(async move {
                        bridge
                            .set_device_temperature(cmd.device_id, cmd.temperature)
                            .await;
                    });
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "mqtt poll error");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(Duration::from_secs(2)) => {}
                }
            }
        }
    }

    if let Err(e) = client.try_disconnect() {
        debug!(error = %e, "mqtt disconnect failed");
    }
}
