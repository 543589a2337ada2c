// ── Domain model ──
//
// Canonical types shared by the store, reconciler and gateway.

pub mod device;
pub mod mac;
pub mod outcome;

pub use device::{DeviceAttributes, DeviceKind, DeviceRecord, DeviceStats, NewDevice, Sighting};
pub use mac::MacAddress;
pub use outcome::{BatchReport, CommandOutcome};

/// A client record exactly as the controller reports it.
pub type RawClient = lanwatch_api::StationEntry;
