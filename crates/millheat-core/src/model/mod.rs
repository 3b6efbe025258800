// ── Domain model ──
//
// Canonical types produced by one poll tick. Wire shapes live in
// `millheat_api::models`; `crate::convert` maps them into these.

pub mod credential;
pub mod device;
pub mod ids;
pub mod inventory;

pub use credential::{Credential, TokenAction, TokenStatus};
pub use device::{Device, DeviceStatus};
pub use ids::{DeviceId, HomeId, RoomId};
pub use inventory::{Holiday, Home, InventorySnapshot, Room};
