// ── Table layout and row mapping ──

use chrono::{DateTime, Utc};

use crate::model::{DeviceRecord, MacAddress};

pub(super) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS devices (
        mac             TEXT PRIMARY KEY NOT NULL,
        ip              TEXT,
        hostname        TEXT,
        name            TEXT NOT NULL,
        vendor          TEXT NOT NULL,
        kind            TEXT NOT NULL DEFAULT 'unknown',
        first_seen      INTEGER NOT NULL,
        last_seen       INTEGER NOT NULL,
        is_wired        INTEGER NOT NULL DEFAULT 0,
        ap_mac          TEXT,
        essid           TEXT,
        signal          INTEGER,
        tx_bytes        INTEGER NOT NULL DEFAULT 0,
        rx_bytes        INTEGER NOT NULL DEFAULT 0,
        detected_at     INTEGER NOT NULL,
        acknowledged    INTEGER NOT NULL DEFAULT 0,
        acknowledged_at INTEGER,
        created_at      INTEGER NOT NULL,
        CHECK ((acknowledged = 0) = (acknowledged_at IS NULL))
    )",
    "CREATE INDEX IF NOT EXISTS idx_devices_detected_at ON devices (detected_at DESC)",
];

pub(super) const COLUMNS: &str = "mac, ip, hostname, name, vendor, kind, first_seen, last_seen, \
     is_wired, ap_mac, essid, signal, tx_bytes, rx_bytes, detected_at, acknowledged, \
     acknowledged_at, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct DeviceRow {
    mac: String,
    ip: Option<String>,
    hostname: Option<String>,
    name: String,
    vendor: String,
    kind: String,
    first_seen: i64,
    last_seen: i64,
    is_wired: bool,
    ap_mac: Option<String>,
    essid: Option<String>,
    signal: Option<i32>,
    tx_bytes: i64,
    rx_bytes: i64,
    detected_at: i64,
    acknowledged: bool,
    acknowledged_at: Option<i64>,
    created_at: i64,
}

impl From<DeviceRow> for DeviceRecord {
    fn from(row: DeviceRow) -> Self {
        Self {
            mac: MacAddress::new(row.mac),
            ip: row.ip,
            hostname: row.hostname,
            name: row.name,
            vendor: row.vendor,
            kind: row.kind.parse().unwrap_or_default(),
            first_seen: from_millis(row.first_seen),
            last_seen: from_millis(row.last_seen),
            is_wired: row.is_wired,
            ap_mac: row.ap_mac,
            essid: row.essid,
            signal: row.signal,
            tx_bytes: row.tx_bytes,
            rx_bytes: row.rx_bytes,
            detected_at: from_millis(row.detected_at),
            acknowledged: row.acknowledged,
            acknowledged_at: row.acknowledged_at.map(from_millis),
            created_at: from_millis(row.created_at),
        }
    }
}

pub(super) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
