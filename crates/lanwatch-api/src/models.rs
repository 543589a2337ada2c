// Controller response types
//
// Every endpoint wraps its payload in the `ApiResponse<T>` envelope.
// Fields use `#[serde(default)]` liberally because the controller is
// inconsistent about field presence across firmware versions.

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard UniFi API response envelope.
///
/// ```json
/// { "meta": { "rc": "ok", "msg": "optional" }, "data": [...] }
/// ```
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Metadata from the envelope. `rc` == `"ok"` means success.
#[derive(Debug, Deserialize)]
pub struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

// ── Station ──────────────────────────────────────────────────────────

/// A client (station) as reported by `stat/sta` or `rest/user`.
///
/// Online stations carry the live radio and traffic fields; entries from
/// `rest/user` are the controller's remembered users and mostly only carry
/// `mac`, `name` and `blocked`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationEntry {
    #[serde(default, rename = "_id")]
    pub id: String,
    pub mac: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    /// Vendor label derived by the controller from the MAC's OUI.
    #[serde(default)]
    pub oui: Option<String>,
    #[serde(default)]
    pub is_wired: Option<bool>,
    #[serde(default)]
    pub is_guest: Option<bool>,
    #[serde(default)]
    pub blocked: Option<bool>,
    #[serde(default)]
    pub ap_mac: Option<String>,
    #[serde(default)]
    pub essid: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub signal: Option<i32>,
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub tx_bytes: Option<i64>,
    #[serde(default)]
    pub rx_bytes: Option<i64>,
    /// Unix seconds.
    #[serde(default)]
    pub first_seen: Option<i64>,
    /// Unix seconds.
    #[serde(default)]
    pub last_seen: Option<i64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
