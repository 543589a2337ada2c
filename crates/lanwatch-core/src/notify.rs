// ── New-device notification seam ──

use async_trait::async_trait;
use tracing::info;

use crate::model::DeviceRecord;

/// Receives devices the reconciler has just persisted.
///
/// Delivery is best-effort: implementations log their own failures, the
/// reconciler never fails a pass because a notification could not be sent.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_new(&self, devices: &[DeviceRecord]);
}

/// Emits one structured `info!` event per new device.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_new(&self, devices: &[DeviceRecord]) {
        for device in devices {
            info!(
                mac = %device.mac,
                name = %device.name,
                vendor = %device.vendor,
                kind = %device.kind,
                ip = device.ip.as_deref().unwrap_or("-"),
                detected_at = %device.detected_at,
                "new device detected"
            );
        }
    }
}
