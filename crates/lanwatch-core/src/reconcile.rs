// ── Reconciler ──
//
// Diffs a controller observation against the store and persists what is
// new. Insert races with a concurrent pass are benign: the store's
// insert-if-absent simply reports a smaller count.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::{DeviceRecord, MacAddress, NewDevice, RawClient, Sighting};
use crate::notify::Notifier;
use crate::store::DeviceStore;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Distinct addresses in the observation.
    pub observed: usize,
    /// Addresses not yet stored when the pass began.
    pub candidates: usize,
    /// Rows this pass actually inserted.
    pub inserted: u64,
    /// Rows refreshed from the live feed (`poll` only).
    pub refreshed: u64,
    /// Records inserted by this pass, in observation order.
    pub new_devices: Vec<DeviceRecord>,
}

pub struct Reconciler {
    store: DeviceStore,
    classifier: Arc<dyn Classifier>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Reconciler {
    pub fn new(store: DeviceStore, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            store,
            classifier,
            notifier: None,
        }
    }

    /// Hand newly inserted devices to `notifier` after each pass.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn store(&self) -> &DeviceStore {
        &self.store
    }

    /// Persist every observed address the store does not know yet.
    ///
    /// Duplicate addresses in `observed` are collapsed (first occurrence
    /// wins). Known devices are left untouched.
    pub async fn reconcile(&self, observed: &[RawClient]) -> Result<ReconcileReport, CoreError> {
        let distinct = dedupe(observed);
        let known = self.store.known_macs().await?;

        let detected_at = Utc::now();
        let candidates: Vec<NewDevice> = distinct
            .iter()
            .filter(|(mac, _)| !known.contains(mac))
            .map(|(_, raw)| {
                NewDevice::from_observation(raw, self.classifier.classify(raw), detected_at)
            })
            .collect();

        let mut report = ReconcileReport {
            observed: distinct.len(),
            candidates: candidates.len(),
            ..ReconcileReport::default()
        };

        if candidates.is_empty() {
            debug!(observed = report.observed, "no new devices");
            return Ok(report);
        }

        let inserted = self.store.insert_new(&candidates).await?;
        report.inserted = u64::try_from(inserted.len()).unwrap_or(u64::MAX);
        if inserted.len() < candidates.len() {
            debug!(
                candidates = candidates.len(),
                inserted = inserted.len(),
                "some candidates were inserted concurrently"
            );
        }

        for mac in &inserted {
            if let Some(record) = self.store.get(mac).await? {
                report.new_devices.push(record);
            }
        }

        info!(
            observed = report.observed,
            candidates = report.candidates,
            inserted = report.inserted,
            "reconciliation pass complete"
        );

        if let Some(notifier) = &self.notifier {
            if !report.new_devices.is_empty() {
                notifier.notify_new(&report.new_devices).await;
            }
        }

        Ok(report)
    }

    /// One full poll: fetch online clients, reconcile, then refresh the
    /// live-feed fields of devices that were already known.
    pub async fn poll(&self, gateway: &Gateway) -> Result<ReconcileReport, CoreError> {
        let observed = gateway.fetch_clients().await?;
        let mut report = self.reconcile(&observed).await?;

        let fresh: HashSet<&MacAddress> = report.new_devices.iter().map(|d| &d.mac).collect();
        let now = Utc::now();
        let sightings: Vec<Sighting> = dedupe(&observed)
            .into_iter()
            .filter(|(mac, _)| !fresh.contains(mac))
            .map(|(_, raw)| Sighting::from_raw(raw, now))
            .collect();

        report.refreshed = self.store.record_sightings(&sightings).await?;
        Ok(report)
    }
}

/// Normalized address plus its first raw record, in observation order.
fn dedupe(observed: &[RawClient]) -> Vec<(MacAddress, &RawClient)> {
    let mut seen = HashSet::new();
    observed
        .iter()
        .filter(|raw| !raw.mac.is_empty())
        .filter_map(|raw| {
            let mac = MacAddress::new(&raw.mac);
            seen.insert(mac.clone()).then_some((mac, raw))
        })
        .collect()
}
