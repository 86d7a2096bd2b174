use crate::object::Object;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query-shaping options accompanying a find request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    /// Comma separated pointer paths to include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Comma separated projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<String>,
    /// Comma separated sort keys, `-` prefix for descending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default)]
    pub count: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<String>,
}

impl QueryOptions {
    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct.is_some()
    }
}

/// Result envelope of a find.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindResponse {
    pub results: Vec<Object>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl FindResponse {
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn into_first(self) -> Option<Object> {
        self.results.into_iter().next()
    }
}
