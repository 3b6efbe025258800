// ── Publishable facts ──
//
// A direct typed mapping from a device to the statements the bus
// carries about it. Temperature is always reported; a setpoint only
// when one is active.

use serde::Serialize;

use crate::model::{Device, DeviceId, InventorySnapshot};

/// Unit of every temperature the vendor reports.
pub const CELSIUS: &str = "C";

/// Setpoint kind for Mill heaters.
pub const SETPOINT_HEAT: &str = "heat";

/// A derived statement about one device's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fact {
    TemperatureReport {
        device_id: DeviceId,
        value: f64,
        unit: &'static str,
    },
    SetpointReport {
        device_id: DeviceId,
        /// Decimal rendering of the vendor integer, unconverted.
        value: String,
        #[serde(rename = "type")]
        setpoint_type: &'static str,
        unit: &'static str,
    },
}

impl Fact {
    pub fn device_id(&self) -> DeviceId {
        match self {
            Self::TemperatureReport { device_id, .. } | Self::SetpointReport { device_id, .. } => {
                *device_id
            }
        }
    }
}

/// Facts for one device: a temperature report, plus a setpoint report
/// when the setpoint is non-zero.
pub fn device_to_facts(device: &Device) -> Vec<Fact> {
    let mut facts = Vec::with_capacity(2);
    facts.push(Fact::TemperatureReport {
        device_id: device.id,
        value: device.current_temp,
        unit: CELSIUS,
    });
    if device.has_setpoint() {
        facts.push(Fact::SetpointReport {
            device_id: device.id,
            value: device.setpoint_temp.to_string(),
            setpoint_type: SETPOINT_HEAT,
            unit: CELSIUS,
        });
    }
    facts
}

/// Facts for every device in a snapshot, in snapshot order.
pub fn snapshot_facts(snapshot: &InventorySnapshot) -> Vec<Fact> {
    snapshot.devices.iter().flat_map(device_to_facts).collect()
}
