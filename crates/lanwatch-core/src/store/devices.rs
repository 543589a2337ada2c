// ── Device queries ──

use std::collections::HashSet;

use chrono::{DateTime, Duration as ChronoDuration, Local, Timelike, Utc};
use tracing::{debug, info};

use super::DeviceStore;
use super::schema::{COLUMNS, DeviceRow};
use crate::error::CoreError;
use crate::model::{DeviceRecord, DeviceStats, MacAddress, NewDevice, Sighting};

const INSERT_IF_ABSENT: &str = "INSERT INTO devices (
        mac, ip, hostname, name, vendor, kind, first_seen, last_seen, is_wired,
        ap_mac, essid, signal, tx_bytes, rx_bytes, detected_at, acknowledged,
        acknowledged_at, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?)
    ON CONFLICT(mac) DO NOTHING
    RETURNING mac";

const REFRESH_SIGHTING: &str = "UPDATE devices SET
        ip        = COALESCE(?, ip),
        ap_mac    = COALESCE(?, ap_mac),
        essid     = COALESCE(?, essid),
        signal    = COALESCE(?, signal),
        tx_bytes  = COALESCE(?, tx_bytes),
        rx_bytes  = COALESCE(?, rx_bytes),
        last_seen = MAX(last_seen, ?)
    WHERE mac = ?";

const STATS: &str = "SELECT
        COUNT(*) AS total,
        COALESCE(SUM(acknowledged), 0) AS acknowledged,
        COALESCE(SUM(CASE WHEN detected_at >= ? THEN 1 ELSE 0 END), 0) AS today
    FROM devices";

impl DeviceStore {
    /// Insert every candidate whose MAC is not already stored.
    ///
    /// Runs in one transaction: either all non-conflicting rows land or
    /// none do. Existing rows are never touched. Returns the addresses this
    /// call actually inserted, in input order.
    pub async fn insert_new(&self, devices: &[NewDevice]) -> Result<Vec<MacAddress>, CoreError> {
        if devices.is_empty() {
            return Ok(Vec::new());
        }

        let created_at = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::new();

        for device in devices {
            let row: Option<String> = sqlx::query_scalar(INSERT_IF_ABSENT)
                .bind(device.mac.as_str())
                .bind(device.ip.as_deref())
                .bind(device.hostname.as_deref())
                .bind(device.name.as_str())
                .bind(device.vendor.as_str())
                .bind(device.kind.to_string())
                .bind(device.first_seen.timestamp_millis())
                .bind(device.last_seen.timestamp_millis())
                .bind(device.is_wired)
                .bind(device.ap_mac.as_deref())
                .bind(device.essid.as_deref())
                .bind(device.signal)
                .bind(device.tx_bytes)
                .bind(device.rx_bytes)
                .bind(device.detected_at.timestamp_millis())
                .bind(created_at)
                .fetch_optional(&mut *tx)
                .await?;
            inserted.extend(row.map(MacAddress::new));
        }

        tx.commit().await?;
        debug!(
            candidates = devices.len(),
            inserted = inserted.len(),
            "insert-if-absent batch committed"
        );
        Ok(inserted)
    }

    /// Devices awaiting acknowledgment, most recently detected first.
    pub async fn list_unacknowledged(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM devices WHERE acknowledged = 0 \
             ORDER BY detected_at DESC, mac"
        );
        self.fetch_records(&sql).await
    }

    /// Every stored device, most recently detected first.
    pub async fn list_all(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        let sql = format!("SELECT {COLUMNS} FROM devices ORDER BY detected_at DESC, mac");
        self.fetch_records(&sql).await
    }

    pub async fn get(&self, mac: &MacAddress) -> Result<Option<DeviceRecord>, CoreError> {
        let sql = format!("SELECT {COLUMNS} FROM devices WHERE mac = ?");
        let row = sqlx::query_as::<_, DeviceRow>(&sql)
            .bind(mac.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(DeviceRecord::from))
    }

    /// Every MAC currently stored.
    pub async fn known_macs(&self) -> Result<HashSet<MacAddress>, CoreError> {
        let macs = sqlx::query_scalar::<_, String>("SELECT mac FROM devices")
            .fetch_all(&self.pool)
            .await?;
        Ok(macs.into_iter().map(MacAddress::from).collect())
    }

    /// Mark a device as acknowledged and return the updated row.
    ///
    /// Idempotent: re-acknowledging keeps the first `acknowledged_at`.
    /// Unknown MACs yield [`CoreError::NotFound`].
    pub async fn acknowledge(&self, mac: &MacAddress) -> Result<DeviceRecord, CoreError> {
        let sql = format!(
            "UPDATE devices SET acknowledged = 1, \
             acknowledged_at = COALESCE(acknowledged_at, ?) \
             WHERE mac = ? RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, DeviceRow>(&sql)
            .bind(Utc::now().timestamp_millis())
            .bind(mac.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(CoreError::NotFound {
                mac: mac.to_string(),
            });
        };
        info!(mac = %mac, "device acknowledged");
        Ok(row.into())
    }

    /// Counters relative to the start of the current local day.
    pub async fn stats(&self) -> Result<DeviceStats, CoreError> {
        self.stats_since(start_of_local_day(Local::now())).await
    }

    /// Counters with an explicit "today" boundary. One statement, so all
    /// four numbers describe the same snapshot.
    pub async fn stats_since(&self, day_start: DateTime<Utc>) -> Result<DeviceStats, CoreError> {
        let (total, acknowledged, today): (i64, i64, i64) = sqlx::query_as(STATS)
            .bind(day_start.timestamp_millis())
            .fetch_one(&self.pool)
            .await?;

        let total = non_negative(total);
        let acknowledged = non_negative(acknowledged);
        Ok(DeviceStats {
            total,
            acknowledged,
            unacknowledged: total.saturating_sub(acknowledged),
            today: non_negative(today),
        })
    }

    /// Refresh live-feed fields for already-known devices.
    ///
    /// Never alters `detected_at` or acknowledgment state, and never moves
    /// `last_seen` backwards. Unknown MACs are skipped. Returns the number
    /// of rows updated.
    pub async fn record_sightings(&self, sightings: &[Sighting]) -> Result<u64, CoreError> {
        if sightings.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for sighting in sightings {
            let result = sqlx::query(REFRESH_SIGHTING)
                .bind(sighting.ip.as_deref())
                .bind(sighting.ap_mac.as_deref())
                .bind(sighting.essid.as_deref())
                .bind(sighting.signal)
                .bind(sighting.tx_bytes)
                .bind(sighting.rx_bytes)
                .bind(sighting.last_seen.timestamp_millis())
                .bind(sighting.mac.as_str())
                .execute(&mut *tx)
                .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!(updated, "sightings recorded");
        Ok(updated)
    }

    async fn fetch_records(&self, sql: &str) -> Result<Vec<DeviceRecord>, CoreError> {
        let rows = sqlx::query_as::<_, DeviceRow>(sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(DeviceRecord::from).collect())
    }
}

/// Local midnight of the day containing `now`, as a UTC instant.
///
/// Falls back to subtracting the elapsed wall-clock time when midnight does
/// not exist locally (DST gap).
pub fn start_of_local_day(now: DateTime<Local>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map_or_else(
            || {
                let elapsed = ChronoDuration::seconds(i64::from(now.num_seconds_from_midnight()));
                (now - elapsed).with_timezone(&Utc)
            },
            |midnight| midnight.with_timezone(&Utc),
        )
}

fn non_negative(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}
