//! Session, polling and publishing core for the Mill heater bridge.
//!
//! This crate owns the temporal logic between `millheat-api` and the
//! message bus:
//!
//! - **[`SessionManager`]**: Owns the access/refresh token pair.
//!   [`authorize()`](SessionManager::authorize) performs the initial code
//!   exchange and [`ensure_fresh()`](SessionManager::ensure_fresh) applies
//!   the refresh policy once per poll tick.
//!
//! - **[`InventoryFetcher`]**: Walks homes → rooms → devices (plus the
//!   per-home independent devices) and returns an [`InventorySnapshot`]
//!   together with the branches that failed along the way.
//!
//! - **[`PollLoop`]**: The process-lifetime driver. Paused until the
//!   [`Lifecycle`] reports `Running`, then ticks on a fixed interval:
//!   ensure a fresh token, fetch, derive [`Fact`]s, publish, persist.
//!
//! - **[`Bridge`]**: Facade wiring the pieces together, spawning the poll
//!   loop and exposing the setpoint command interface.
//!
//! The message bus and durable storage are external: they plug in through
//! the [`Publisher`] and [`StateStore`] traits.

pub mod bridge;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod facts;
pub mod fetcher;
pub mod lifecycle;
pub mod model;
pub mod poller;
pub mod publish;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use config::{AccountCredentials, BridgeConfig};
pub use error::{CoreError, PublishError};
pub use facts::{Fact, device_to_facts};
pub use fetcher::{Branch, BranchFailure, FetchReport, InventoryFetcher};
pub use lifecycle::{AppState, AuthState, ConfigState, ConnectionState, Lifecycle};
pub use poller::{PollLoop, PollState, TickOutcome};
pub use publish::{ChannelPublisher, Publisher};
pub use session::{Freshness, SessionManager};
pub use store::{MemoryStateStore, StateStore};

pub use model::{
    Credential, Device, DeviceId, Home, HomeId, InventorySnapshot, Room, RoomId, TokenAction,
    TokenStatus,
};
