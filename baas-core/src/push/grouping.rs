use std::collections::HashMap;

use baas_models::{Object, get_str};
use serde_json::Value;

/// Bucket for per-badge delivery of an incrementing push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeGroup {
    /// iOS devices whose stored badge was this value when queried.
    Badge(i64),
    /// Devices that do not carry a badge.
    Unsupported,
}

fn group_of(installation: &Object) -> BadgeGroup {
    if get_str(installation, "deviceType") != Some("ios") {
        return BadgeGroup::Unsupported;
    }
    let badge = installation
        .get("badge")
        .and_then(Value::as_f64)
        .map(|b| b as i64)
        .unwrap_or(0);
    BadgeGroup::Badge(badge)
}

pub fn group_by_badge(
    installations: Vec<Object>,
) -> HashMap<BadgeGroup, Vec<Object>> {
    let mut groups: HashMap<BadgeGroup, Vec<Object>> = HashMap::new();
    for installation in installations {
        groups
            .entry(group_of(&installation))
            .or_default()
            .push(installation);
    }
    groups
}

/// Payload delivered to one group: badge stripped for unsupported devices,
/// otherwise the observed badge plus one.
pub fn payload_for_group(body: &Object, group: BadgeGroup) -> Object {
    let mut payload = body.clone();
    if let Some(data) = payload.get_mut("data").and_then(Value::as_object_mut) {
        match group {
            BadgeGroup::Unsupported => {
                data.remove("badge");
            }
            BadgeGroup::Badge(badge) => {
                data.insert("badge".into(), Value::from(badge.saturating_add(1)));
            }
        }
    }
    payload
}
