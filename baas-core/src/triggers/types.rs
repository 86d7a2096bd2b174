use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use baas_models::{Auth, Object, QueryOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BaasError, BaasResult};

/// Lifecycle points at which user code may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerType {
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
    BeforeFind,
    AfterFind,
    BeforeFileUpload,
    AfterFileUpload,
}

impl TriggerType {
    pub const ALL: [TriggerType; 8] = [
        TriggerType::BeforeSave,
        TriggerType::AfterSave,
        TriggerType::BeforeDelete,
        TriggerType::AfterDelete,
        TriggerType::BeforeFind,
        TriggerType::AfterFind,
        TriggerType::BeforeFileUpload,
        TriggerType::AfterFileUpload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::BeforeSave => "beforeSave",
            TriggerType::AfterSave => "afterSave",
            TriggerType::BeforeDelete => "beforeDelete",
            TriggerType::AfterDelete => "afterDelete",
            TriggerType::BeforeFind => "beforeFind",
            TriggerType::AfterFind => "afterFind",
            TriggerType::BeforeFileUpload => "beforeSaveFile",
            TriggerType::AfterFileUpload => "afterSaveFile",
        }
    }

    /// File hooks are keyed by extension rather than class name.
    pub fn is_file_trigger(&self) -> bool {
        matches!(
            self,
            TriggerType::BeforeFileUpload | TriggerType::AfterFileUpload
        )
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = BaasError;

    fn from_str(s: &str) -> BaasResult<Self> {
        TriggerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                BaasError::ScriptFailed(format!("Invalid trigger type: {}", s))
            })
    }
}

/// Query view handed to `beforeFind`/`afterFind` hooks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerQuery {
    pub where_: Object,
    pub include: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub order: Option<String>,
}

impl TriggerQuery {
    pub fn new(where_: &Object, options: &QueryOptions) -> Self {
        Self {
            where_: where_.clone(),
            include: options.include.clone(),
            skip: options.skip,
            limit: options.limit,
            order: options.order.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    pub url: Option<String>,
}

/// Everything a hook sees about the operation it intercepts.
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub trigger_name: TriggerType,
    pub object: Option<Object>,
    pub original: Option<Object>,
    pub objects: Vec<Object>,
    pub query: Option<TriggerQuery>,
    pub count: bool,
    pub is_get: bool,
    pub is_aggregate: bool,
    pub is_distinct: bool,
    pub master: bool,
    pub user: Option<Object>,
    pub installation_id: Option<String>,
    pub headers: HashMap<String, String>,
    pub file: Option<FileInfo>,
}

impl TriggerRequest {
    pub fn new(trigger_name: TriggerType, auth: &Auth) -> Self {
        Self {
            trigger_name,
            object: None,
            original: None,
            objects: Vec::new(),
            query: None,
            count: false,
            is_get: false,
            is_aggregate: false,
            is_distinct: false,
            master: auth.is_master(),
            user: auth.user().cloned(),
            installation_id: auth.installation_id().map(String::from),
            headers: auth.headers().clone(),
            file: None,
        }
    }

    pub fn with_object(mut self, object: Object) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_original(mut self, original: Option<Object>) -> Self {
        self.original = original;
        self
    }

    pub fn with_objects(mut self, objects: Vec<Object>) -> Self {
        self.objects = objects;
        self
    }

    pub fn with_query(
        mut self,
        where_: &Object,
        options: &QueryOptions,
        is_get: bool,
    ) -> Self {
        self.query = Some(TriggerQuery::new(where_, options));
        self.count = options.count;
        self.is_get = is_get;
        self.is_aggregate = options.is_aggregate();
        self.is_distinct = options.is_distinct();
        self
    }

    pub fn with_file(mut self, file: FileInfo) -> Self {
        self.file = Some(file);
        self
    }
}

/// Query fields a `beforeFind` hook chose to replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOverrides {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_: Option<Object>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl QueryOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite every field the hook returned; keep the rest.
    ///
    /// A returned where-clause replaces the original one wholesale.
    pub fn apply(
        self,
        where_: Object,
        mut options: QueryOptions,
    ) -> (Object, QueryOptions) {
        let where_ = self.where_.unwrap_or(where_);
        if let Some(limit) = self.limit {
            options.limit = Some(limit);
        }
        if let Some(skip) = self.skip {
            options.skip = Some(skip);
        }
        if let Some(include) = self.include {
            options.include = Some(include);
        }
        if let Some(keys) = self.keys {
            options.keys = Some(keys);
        }
        if let Some(order) = self.order {
            options.order = Some(order);
        }
        (where_, options)
    }
}

/// What a hook hands back to the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerResponse {
    /// Replacement fields for the object being saved.
    pub object: Option<Object>,
    pub query: QueryOverrides,
    /// Replacement result list from `afterFind`.
    pub objects: Option<Vec<Object>>,
    /// Replacement bytes from `beforeSaveFile`.
    pub file_data: Option<Vec<u8>>,
    pub data: Option<Value>,
}

impl TriggerResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object: Object) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_query(mut self, query: QueryOverrides) -> Self {
        self.query = query;
        self
    }

    pub fn with_objects(mut self, objects: Vec<Object>) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn with_file_data(mut self, data: Vec<u8>) -> Self {
        self.file_data = Some(data);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

pub type TriggerResult = Result<TriggerResponse, BaasError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trigger_type_names_round_trip() {
        for t in TriggerType::ALL {
            assert_eq!(t.as_str().parse::<TriggerType>().unwrap(), t);
        }
        assert!("beforeEverything".parse::<TriggerType>().is_err());
    }

    #[test]
    fn test_overrides_replace_where_and_present_fields() {
        let where_ = json!({"a": 1}).as_object().cloned().unwrap();
        let options = QueryOptions {
            limit: Some(10),
            order: Some("name".into()),
            ..Default::default()
        };
        let overrides = QueryOverrides {
            where_: Some(json!({"b": 2}).as_object().cloned().unwrap()),
            limit: Some(5),
            ..Default::default()
        };
        let (w, o) = overrides.apply(where_, options);
        assert_eq!(Value::Object(w), json!({"b": 2}));
        assert_eq!(o.limit, Some(5));
        assert_eq!(o.order.as_deref(), Some("name"));
    }

    #[test]
    fn test_empty_overrides_keep_query() {
        let where_ = json!({"a": 1}).as_object().cloned().unwrap();
        let overrides = QueryOverrides::default();
        assert!(overrides.is_empty());
        let (w, o) = overrides.apply(where_.clone(), QueryOptions::default());
        assert_eq!(w, where_);
        assert_eq!(o, QueryOptions::default());
    }
}
