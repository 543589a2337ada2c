// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::RawClient;
use super::mac::MacAddress;

/// Coarse device-type tag produced by classification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceKind {
    Phone,
    Computer,
    Tv,
    Iot,
    Network,
    #[default]
    Unknown,
}

/// Output of classifying a raw client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    pub vendor: String,
    pub display_name: String,
    pub online: bool,
    pub kind: DeviceKind,
}

/// A candidate row for [`DeviceStore::insert_new`](crate::DeviceStore::insert_new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub mac: MacAddress,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub name: String,
    pub vendor: String,
    pub kind: DeviceKind,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_wired: bool,
    pub ap_mac: Option<String>,
    pub essid: Option<String>,
    pub signal: Option<i32>,
    pub tx_bytes: i64,
    pub rx_bytes: i64,
    pub detected_at: DateTime<Utc>,
}

impl NewDevice {
    /// Combine a raw observation with its classification.
    ///
    /// Controller timestamps are Unix seconds; when absent they fall back to
    /// `detected_at`.
    pub fn from_observation(
        raw: &RawClient,
        attributes: DeviceAttributes,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            mac: MacAddress::new(&raw.mac),
            ip: raw.ip.clone(),
            hostname: raw.hostname.clone(),
            name: attributes.display_name,
            vendor: attributes.vendor,
            kind: attributes.kind,
            first_seen: unix_secs(raw.first_seen).unwrap_or(detected_at),
            last_seen: unix_secs(raw.last_seen).unwrap_or(detected_at),
            is_wired: raw.is_wired.unwrap_or(false),
            ap_mac: raw.ap_mac.clone(),
            essid: raw.essid.clone(),
            signal: raw.signal.or(raw.rssi),
            tx_bytes: raw.tx_bytes.unwrap_or(0),
            rx_bytes: raw.rx_bytes.unwrap_or(0),
            detected_at,
        }
    }
}

/// A persisted device row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub mac: MacAddress,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub name: String,
    pub vendor: String,
    pub kind: DeviceKind,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_wired: bool,
    pub ap_mac: Option<String>,
    pub essid: Option<String>,
    pub signal: Option<i32>,
    pub tx_bytes: i64,
    pub rx_bytes: i64,
    pub detected_at: DateTime<Utc>,
    pub acknowledged: bool,
    /// Set exactly when `acknowledged` is true.
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Live-feed values refreshed on every poll for devices already known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub mac: MacAddress,
    pub ip: Option<String>,
    pub ap_mac: Option<String>,
    pub essid: Option<String>,
    pub signal: Option<i32>,
    pub tx_bytes: Option<i64>,
    pub rx_bytes: Option<i64>,
    pub last_seen: DateTime<Utc>,
}

impl Sighting {
    pub fn from_raw(raw: &RawClient, observed_at: DateTime<Utc>) -> Self {
        Self {
            mac: MacAddress::new(&raw.mac),
            ip: raw.ip.clone(),
            ap_mac: raw.ap_mac.clone(),
            essid: raw.essid.clone(),
            signal: raw.signal.or(raw.rssi),
            tx_bytes: raw.tx_bytes,
            rx_bytes: raw.rx_bytes,
            last_seen: unix_secs(raw.last_seen).unwrap_or(observed_at),
        }
    }
}

/// Acknowledgment counters, all taken from one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub total: u64,
    pub acknowledged: u64,
    pub unacknowledged: u64,
    /// Detected since local midnight.
    pub today: u64,
}

fn unix_secs(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}
