// Mill API inventory endpoints
//
// Tree listing: homes, rooms by home, devices by room, and the
// per-home set of devices not assigned to any room. Each level needs
// the parent id from the level above.

use tracing::debug;

use crate::client::MillClient;
use crate::error::Error;
use crate::models::{
    DeviceInfo, DeviceListData, HomeInfo, HomeListData, IndependentDeviceData, RoomInfo,
    RoomListData,
};

impl MillClient {
    /// List all homes on the account.
    ///
    /// `POST uds/selectHomeList`
    pub async fn list_homes(&self, access_token: &str) -> Result<Vec<HomeInfo>, Error> {
        debug!("listing homes");
        let builder = self.post_authed("uds/selectHomeList", access_token)?;
        let data: HomeListData = Self::send_or_default(builder).await?;
        Ok(data.home_list)
    }

    /// List the rooms of one home.
    ///
    /// `POST uds/selectRoombyHome?homeId=..`
    pub async fn list_rooms(&self, access_token: &str, home_id: i64) -> Result<Vec<RoomInfo>, Error> {
        debug!(home_id, "listing rooms");
        let builder = self
            .post_authed("uds/selectRoombyHome", access_token)?
            .query(&[("homeId", home_id)]);
        let data: RoomListData = Self::send_or_default(builder).await?;
        Ok(data.room_list)
    }

    /// List the heaters assigned to one room.
    ///
    /// `POST uds/selectDevicebyRoom?roomId=..`
    pub async fn list_room_devices(
        &self,
        access_token: &str,
        room_id: i64,
    ) -> Result<Vec<DeviceInfo>, Error> {
        debug!(room_id, "listing room devices");
        let builder = self
            .post_authed("uds/selectDevicebyRoom", access_token)?
            .query(&[("roomId", room_id)]);
        let data: DeviceListData = Self::send_or_default(builder).await?;
        Ok(data.device_list)
    }

    /// List the heaters of one home that are not assigned to a room.
    ///
    /// `POST uds/getIndependentDevices?homeId=..`
    pub async fn list_independent_devices(
        &self,
        access_token: &str,
        home_id: i64,
    ) -> Result<Vec<DeviceInfo>, Error> {
        debug!(home_id, "listing independent devices");
        let builder = self
            .post_authed("uds/getIndependentDevices", access_token)?
            .query(&[("homeId", home_id)]);
        let data: IndependentDeviceData = Self::send_or_default(builder).await?;
        Ok(data.device_info_list)
    }
}
