// ── Device classification seam ──
//
// Classification is pure and deterministic: the reconciler calls it once
// per newly seen address and persists the result. Tests plug in fixed
// classifiers; the daemon uses the keyword heuristics below.

use crate::model::{DeviceAttributes, DeviceKind, RawClient};

/// Turns a raw controller record into persistable attributes.
pub trait Classifier: Send + Sync {
    fn classify(&self, raw: &RawClient) -> DeviceAttributes;
}

impl<F> Classifier for F
where
    F: Fn(&RawClient) -> DeviceAttributes + Send + Sync,
{
    fn classify(&self, raw: &RawClient) -> DeviceAttributes {
        self(raw)
    }
}

/// Keyword heuristics over the controller's OUI label and the hostname.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

const KIND_KEYWORDS: &[(DeviceKind, &[&str])] = &[
    (
        DeviceKind::Phone,
        &["iphone", "android", "pixel", "galaxy", "phone", "oneplus", "xiaomi"],
    ),
    (
        DeviceKind::Tv,
        &["tv", "roku", "chromecast", "firetv", "appletv", "bravia", "shield"],
    ),
    (
        DeviceKind::Computer,
        &["macbook", "imac", "laptop", "desktop", "pc", "thinkpad", "surface"],
    ),
    (
        DeviceKind::Network,
        &["ubiquiti", "unifi", "switch", "router", "netgear", "tp-link", "mikrotik"],
    ),
    (
        DeviceKind::Iot,
        &["espressif", "esp", "tuya", "shelly", "sonos", "nest", "echo", "ring", "hue"],
    ),
];

impl HeuristicClassifier {
    fn guess_kind(haystack: &str) -> DeviceKind {
        KIND_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
            .map_or(DeviceKind::Unknown, |(kind, _)| *kind)
    }
}

impl Classifier for HeuristicClassifier {
    fn classify(&self, raw: &RawClient) -> DeviceAttributes {
        let vendor = non_empty(raw.oui.as_deref()).unwrap_or("Unknown").to_owned();
        let display_name = non_empty(raw.name.as_deref())
            .or_else(|| non_empty(raw.hostname.as_deref()))
            .unwrap_or(raw.mac.as_str())
            .to_owned();

        let haystack = format!(
            "{} {}",
            raw.hostname.as_deref().unwrap_or_default(),
            vendor
        )
        .to_lowercase();

        DeviceAttributes {
            vendor,
            display_name,
            online: raw.last_seen.is_some(),
            kind: Self::guess_kind(&haystack),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
