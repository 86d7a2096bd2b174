use baas_models::Object;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value, json};

use crate::error::{BaasError, BaasResult};

/// Device types named by a where-clause: a plain string or `{"$in": [...]}`.
fn requested_push_types(where_: &Object) -> BaasResult<Vec<String>> {
    let Some(device_type) = where_.get("deviceType") else {
        return Ok(Vec::new());
    };
    match device_type {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Object(m) => match m.get("$in") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(BaasError::PushMisconfigured(format!(
                        "{} is not supported push type.",
                        other
                    ))),
                })
                .collect(),
            Some(_) => Err(BaasError::PushMisconfigured(
                "deviceType $in expects an array".into(),
            )),
            None => Ok(Vec::new()),
        },
        other => Err(BaasError::PushMisconfigured(format!(
            "{} is not supported push type.",
            other
        ))),
    }
}

/// Reject a where-clause naming a device type the sender cannot reach.
pub fn validate_push_type(where_: &Object, valid: &[String]) -> BaasResult<()> {
    for push_type in requested_push_types(where_)? {
        if !valid.contains(&push_type) {
            return Err(BaasError::PushMisconfigured(format!(
                "{} is not supported push type.",
                push_type
            )));
        }
    }
    Ok(())
}

/// Badge change requested by a push body.
#[derive(Debug, Clone, PartialEq)]
pub enum BadgeUpdate {
    Increment,
    Set(Number),
}

impl BadgeUpdate {
    /// Update payload applied to matching iOS installations.
    pub fn to_update(&self) -> Object {
        let value = match self {
            BadgeUpdate::Increment => json!({"__op": "Increment", "amount": 1}),
            BadgeUpdate::Set(n) => Value::Number(n.clone()),
        };
        let mut update = Object::new();
        update.insert("badge".into(), value);
        update
    }
}

pub fn is_increment(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.eq_ignore_ascii_case("increment"))
}

/// Read `data.badge` from a push body.
pub fn parse_badge(body: &Object) -> BaasResult<Option<BadgeUpdate>> {
    let Some(badge) = body.get("data").and_then(|d| d.get("badge")) else {
        return Ok(None);
    };
    match badge {
        Value::Number(n) => Ok(Some(BadgeUpdate::Set(n.clone()))),
        v if is_increment(v) => Ok(Some(BadgeUpdate::Increment)),
        _ => Err(BaasError::PushMisconfigured(
            "Invalid value for badge, expected number or 'Increment'".into(),
        )),
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Normalize `expiration_time` (epoch seconds or a date string) to epoch
/// milliseconds. The instant must be strictly after `now`.
pub fn parse_expiration_time(value: &Value, now: DateTime<Utc>) -> BaasResult<i64> {
    let invalid =
        || BaasError::PushMisconfigured(format!("{} is not valid time.", value));
    let expiration = match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0) as i64)),
        Value::String(s) => parse_date_string(s),
        _ => None,
    }
    .ok_or_else(invalid)?;

    if expiration <= now {
        return Err(BaasError::PushMisconfigured(
            "expiration_time is not valid time.".into(),
        ));
    }
    Ok(expiration.timestamp_millis())
}
