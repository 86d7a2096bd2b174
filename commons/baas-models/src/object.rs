use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// A schemaless stored object, keyed by field name.
pub type Object = serde_json::Map<String, Value>;

/// Client SDK identification forwarded by the boundary layer.
pub type ClientInfo = HashMap<String, String>;

pub const OBJECT_ID: &str = "objectId";
pub const CLASS_NAME: &str = "className";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Where-clause targeting a single object.
pub fn where_object_id(object_id: &str) -> Object {
    let mut where_ = Object::new();
    where_.insert(OBJECT_ID.into(), Value::String(object_id.to_string()));
    where_
}

pub fn get_str<'a>(object: &'a Object, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

pub fn object_id(object: &Object) -> Option<&str> {
    get_str(object, OBJECT_ID)
}

/// Timestamps are stored as ISO-8601 strings with millisecond precision.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_where_object_id() {
        let w = where_object_id("abc");
        assert_eq!(object_id(&w), Some("abc"));
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_format_timestamp_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(ts), "2024-01-02T03:04:05.000Z");
    }
}
