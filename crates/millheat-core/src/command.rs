// ── Setpoint commands ──
//
// Inbound commands run outside the poll cycle, possibly concurrently
// with a tick. They read one credential snapshot and never write it;
// only the session manager does that.

use tracing::{error, info};

use crate::bridge::Bridge;
use crate::error::CoreError;
use crate::model::{DeviceId, TokenStatus};

impl Bridge {
    /// Set the hold temperature of one device.
    ///
    /// The value is forwarded to the vendor as-is (Celsius). No retry
    /// is attempted here.
    pub async fn try_set_device_temperature(
        &self,
        device_id: DeviceId,
        temperature: i64,
    ) -> Result<(), CoreError> {
        let credential = self.inner.session.credential();
        if credential.status != TokenStatus::Valid || !credential.is_authenticated() {
            return Err(CoreError::NotAuthenticated);
        }

        self.inner
            .session
            .client()
            .device_control(&credential.access_token, device_id.get(), temperature)
            .await
            .map_err(|e| CoreError::Control {
                device_id: device_id.get(),
                message: e.to_string(),
            })?;

        info!(%device_id, temperature, "setpoint applied");
        Ok(())
    }

    /// Like [`try_set_device_temperature`](Self::try_set_device_temperature),
    /// reporting only success. Failures are logged.
    pub async fn set_device_temperature(&self, device_id: DeviceId, temperature: i64) -> bool {
        match self.try_set_device_temperature(device_id, temperature).await {
            Ok(()) => true,
            Err(e) => {
                error!(%device_id, temperature, error = %e, "setpoint change failed");
                false
            }
        }
    }
}
