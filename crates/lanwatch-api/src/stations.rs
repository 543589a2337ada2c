// Station endpoints
//
// Online clients via stat/sta, remembered users via rest/user, and the
// block/unblock commands via cmd/stamgr.

use serde_json::json;
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::StationEntry;

impl ControllerClient {
    /// List all currently connected clients (stations).
    ///
    /// `GET /api/s/{site}/stat/sta`
    pub async fn list_clients(&self) -> Result<Vec<StationEntry>, Error> {
        let url = self.site_url("stat/sta")?;
        debug!("listing connected clients");
        self.get(url).await
    }

    /// List the MAC addresses of every blocked client, online or not.
    ///
    /// `GET /api/s/{site}/rest/user`, filtered on `blocked: true`.
    pub async fn list_blocked_clients(&self) -> Result<Vec<String>, Error> {
        let url = self.site_url("rest/user")?;
        debug!("listing blocked clients");
        let users: Vec<StationEntry> = self.get(url).await?;
        Ok(users
            .into_iter()
            .filter(|u| u.blocked == Some(true))
            .map(|u| u.mac)
            .collect())
    }

    /// Block a client by MAC address.
    ///
    /// `POST /api/s/{site}/cmd/stamgr` with `{"cmd": "block-sta", "mac": "..."}`.
    /// Returns the controller's confirmation payload untouched; an empty
    /// payload is for the caller to judge.
    pub async fn block_client(&self, mac: &str) -> Result<Vec<serde_json::Value>, Error> {
        debug!(mac, "blocking client");
        self.station_command("block-sta", mac).await
    }

    /// Unblock a client by MAC address.
    ///
    /// `POST /api/s/{site}/cmd/stamgr` with `{"cmd": "unblock-sta", "mac": "..."}`
    pub async fn unblock_client(&self, mac: &str) -> Result<Vec<serde_json::Value>, Error> {
        debug!(mac, "unblocking client");
        self.station_command("unblock-sta", mac).await
    }

    async fn station_command(
        &self,
        cmd: &str,
        mac: &str,
    ) -> Result<Vec<serde_json::Value>, Error> {
        let url = self.site_url("cmd/stamgr")?;
        self.post(url, &json!({ "cmd": cmd, "mac": mac })).await
    }
}
