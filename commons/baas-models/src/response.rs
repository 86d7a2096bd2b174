use crate::object::Object;
use serde::{Deserialize, Serialize};

/// Result envelope of a create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    pub status: u16,
    pub response: Object,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl WriteResponse {
    pub fn created(response: Object, location: String) -> Self {
        Self {
            status: 201,
            response,
            location: Some(location),
        }
    }

    pub fn updated(response: Object) -> Self {
        Self {
            status: 200,
            response,
            location: None,
        }
    }
}
