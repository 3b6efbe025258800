// ── Inventory fetcher ──
//
// Sequential walk of the vendor tree: homes → rooms → devices, plus the
// per-home independent devices. Each level needs the parent id from the
// level above. Only the home list is mandatory: a failed branch further
// down is recorded in the report and contributes nothing.

use std::fmt;

use chrono::Utc;
use tracing::{debug, info, warn};

use millheat_api::MillClient;

use crate::error::CoreError;
use crate::model::{Device, Home, HomeId, InventorySnapshot, Room, RoomId};

/// A subtree of the walk that could not be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Rooms { home_id: HomeId },
    RoomDevices { home_id: HomeId, room_id: RoomId },
    IndependentDevices { home_id: HomeId },
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rooms { home_id } => write!(f, "rooms of home {home_id}"),
            Self::RoomDevices { home_id, room_id } => {
                write!(f, "devices of room {room_id} (home {home_id})")
            }
            Self::IndependentDevices { home_id } => {
                write!(f, "independent devices of home {home_id}")
            }
        }
    }
}

/// One skipped branch and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFailure {
    pub branch: Branch,
    pub reason: String,
}

/// A snapshot plus the branches that degraded it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub snapshot: InventorySnapshot,
    pub failures: Vec<BranchFailure>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn skip(&mut self, branch: Branch, err: &millheat_api::Error) {
        warn!(
            %branch,
            error = %err,
            transient = err.is_transient(),
            "skipping branch of inventory walk"
        );
        self.failures.push(BranchFailure {
            branch,
            reason: err.to_string(),
        });
    }
}

/// Walks the vendor tree for one access token.
#[derive(Debug, Clone)]
pub struct InventoryFetcher {
    client: MillClient,
}

impl InventoryFetcher {
    pub fn new(client: MillClient) -> Self {
        Self { client }
    }

    /// Fetch the whole inventory visible to `access_token`.
    ///
    /// Fails only if the home list cannot be fetched.
    pub async fn fetch_all(&self, access_token: &str) -> Result<FetchReport, CoreError> {
        let homes: Vec<Home> = self
            .client
            .list_homes(access_token)
            .await
            .map_err(|e| CoreError::Fetch {
                message: format!("home list: {e}"),
            })?
            .into_iter()
            .map(Home::from)
            .collect();

        let mut report = FetchReport::default();

        for home in &homes {
            self.walk_rooms(access_token, home.id, &mut report).await;
            self.walk_independent(access_token, home.id, &mut report).await;
        }

        report.snapshot.homes = homes;
        report.snapshot.fetched_at = Some(Utc::now());

        info!(
            homes = report.snapshot.homes.len(),
            rooms = report.snapshot.rooms.len(),
            devices = report.snapshot.devices.len(),
            independent = report.snapshot.independent_devices.len(),
            skipped_branches = report.failures.len(),
            "inventory fetched"
        );
        Ok(report)
    }

    async fn walk_rooms(&self, access_token: &str, home_id: HomeId, report: &mut FetchReport) {
        let rooms = match self.client.list_rooms(access_token, home_id.get()).await {
            Ok(rooms) => rooms,
            Err(e) => {
                report.skip(Branch::Rooms { home_id }, &e);
                return;
            }
        };

        for info in rooms {
            let room = Room::from_api(info, home_id);
            let room_id = room.id;
            report.snapshot.rooms.push(room);

            match self.client.list_room_devices(access_token, room_id.get()).await {
                Ok(devices) => {
                    debug!(%room_id, count = devices.len(), "room devices listed");
                    report.snapshot.devices.extend(
                        devices
                            .into_iter()
                            .map(|d| Device::from_api(d, Some(room_id))),
                    );
                }
                Err(e) => report.skip(Branch::RoomDevices { home_id, room_id }, &e),
            }
        }
    }

    async fn walk_independent(&self, access_token: &str, home_id: HomeId, report: &mut FetchReport) {
        match self
            .client
            .list_independent_devices(access_token, home_id.get())
            .await
        {
            Ok(devices) => {
                debug!(%home_id, count = devices.len(), "independent devices listed");
                for info in devices {
                    let device = Device::from_api(info, None);
                    report.snapshot.independent_devices.push(device.clone());
                    report.snapshot.devices.push(device);
                }
            }
            Err(e) => report.skip(Branch::IndependentDevices { home_id }, &e),
        }
    }
}
