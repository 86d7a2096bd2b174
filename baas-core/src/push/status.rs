use std::fmt;

use baas_models::{Object, now_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{BaasError, BaasResult};
use crate::id::new_object_id;

/// Lifecycle of one push job: Pending → Running → Complete, with Failed
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushState {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "succeeded")]
    Complete,
    #[serde(rename = "failed")]
    Failed,
}

impl PushState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushState::Pending => "pending",
            PushState::Running => "running",
            PushState::Complete => "succeeded",
            PushState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PushState::Complete | PushState::Failed)
    }

    fn can_transition_to(&self, next: PushState) -> bool {
        matches!(
            (*self, next),
            (PushState::Pending, PushState::Running)
                | (PushState::Running, PushState::Complete)
                | (PushState::Pending | PushState::Running, PushState::Failed)
        )
    }
}

impl fmt::Display for PushState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushStatus {
    object_id: String,
    state: PushState,
    body: Object,
    where_: Object,
    expiry: Option<i64>,
    results: Vec<Object>,
    error: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PushStatus {
    pub fn new(body: &Object, where_: &Object) -> Self {
        let now = now_timestamp();
        Self {
            object_id: new_object_id(),
            state: PushState::Pending,
            body: body.clone(),
            where_: where_.clone(),
            expiry: None,
            results: Vec::new(),
            error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.object_id
    }

    pub fn state(&self) -> PushState {
        self.state
    }

    pub fn results(&self) -> &[Object] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn expiry(&self) -> Option<i64> {
        self.expiry
    }

    pub fn set_expiry(&mut self, expiry: i64) {
        self.expiry = Some(expiry);
    }

    fn transition(&mut self, next: PushState) -> BaasResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(BaasError::Internal(format!(
                "invalid push status transition {} -> {}",
                self.state, next
            )));
        }
        self.state = next;
        self.updated_at = now_timestamp();
        Ok(())
    }

    pub fn set_running(&mut self) -> BaasResult<()> {
        self.transition(PushState::Running)
    }

    pub fn complete(&mut self, results: Vec<Object>) -> BaasResult<()> {
        self.transition(PushState::Complete)?;
        self.results = results;
        Ok(())
    }

    /// Record `error`; a job that already finished keeps its outcome.
    pub fn fail(&mut self, error: &BaasError) {
        if self.transition(PushState::Failed).is_ok() {
            self.error = Some(error.to_string());
        }
    }

    /// Shape persisted in the `_PushStatus` class.
    pub fn to_object(&self) -> Object {
        let sent = self
            .results
            .iter()
            .filter(|r| r.get("transmitted") == Some(&Value::Bool(true)))
            .count();
        let mut object = Object::new();
        object.insert("objectId".into(), json!(self.object_id));
        object.insert("status".into(), json!(self.state.as_str()));
        object.insert(
            "query".into(),
            json!(Value::Object(self.where_.clone()).to_string()),
        );
        object.insert(
            "payload".into(),
            json!(Value::Object(self.body.clone()).to_string()),
        );
        object.insert("numSent".into(), json!(sent));
        object.insert("createdAt".into(), json!(self.created_at));
        object.insert("updatedAt".into(), json!(self.updated_at));
        if let Some(expiry) = self.expiry {
            object.insert("expiry".into(), json!(expiry));
        }
        if let Some(error) = &self.error {
            object.insert("errorMessage".into(), json!(error));
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut status = PushStatus::new(&Object::new(), &Object::new());
        assert_eq!(status.state(), PushState::Pending);
        status.set_running().unwrap();
        let delivered = json!({"transmitted": true}).as_object().cloned().unwrap();
        status.complete(vec![delivered]).unwrap();
        assert_eq!(status.state(), PushState::Complete);
        assert_eq!(status.to_object()["numSent"], json!(1));
        assert_eq!(status.to_object()["status"], json!("succeeded"));
    }

    #[test]
    fn test_illegal_transitions() {
        let mut status = PushStatus::new(&Object::new(), &Object::new());
        assert!(status.complete(vec![]).is_err());
        status.set_running().unwrap();
        assert!(status.set_running().is_err());
        status.complete(vec![]).unwrap();
        status.fail(&BaasError::Internal("late".into()));
        assert_eq!(status.state(), PushState::Complete);
        assert_eq!(status.error(), None);
    }

    #[test]
    fn test_fail_records_message() {
        let mut status = PushStatus::new(&Object::new(), &Object::new());
        status.fail(&BaasError::PushMisconfigured("bad badge".into()));
        assert_eq!(status.state(), PushState::Failed);
        let stored = status.to_object();
        assert_eq!(stored["status"], json!("failed"));
        assert_eq!(stored["errorMessage"], json!("bad badge"));
    }
}
