// Mill API device control
//
// A single endpoint sets a hold temperature on one heater. The vendor
// answers with a bare envelope; `errorCode == 0` is the only success.

use tracing::debug;

use crate::client::MillClient;
use crate::error::Error;

impl MillClient {
    /// Put a heater on hold at `hold_temp` degrees Celsius.
    ///
    /// `POST uds/deviceControlForOpenApi?deviceId=..&holdTemp=..&operation=1&status=1`
    pub async fn device_control(
        &self,
        access_token: &str,
        device_id: i64,
        hold_temp: i64,
    ) -> Result<(), Error> {
        debug!(device_id, hold_temp, "sending device control");
        let device_id = device_id.to_string();
        let hold_temp = hold_temp.to_string();
        let builder = self
            .post_authed("uds/deviceControlForOpenApi", access_token)?
            .query(&[
                ("deviceId", device_id.as_str()),
                ("holdTemp", hold_temp.as_str()),
                ("operation", "1"),
                ("status", "1"),
            ]);

        let _ = Self::send::<serde_json::Value>(builder).await?;
        Ok(())
    }
}
