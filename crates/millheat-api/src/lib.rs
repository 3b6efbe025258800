// millheat-api: Async Rust client for the Mill heater open API

pub mod auth;
pub mod client;
pub mod control;
pub mod error;
pub mod inventory;
pub mod models;
pub mod transport;

pub use client::{DEFAULT_BASE_URL, MillClient};
pub use error::Error;
pub use models::{DeviceInfo, HomeInfo, RoomInfo, TokenGrant};
pub use transport::TransportConfig;
