//! Push notification fan-out.

mod adapter;
mod grouping;
mod status;
mod validation;

use std::sync::Arc;

use baas_models::{Auth, ClientInfo, Object, QueryOptions, where_object_id};
use baas_storage::ObjectStorage;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::BaasResult;
use crate::rest::{AccessPipeline, INSTALLATION_CLASS};

pub use adapter::{LogPushSender, NoopPushSender, PushSender, create_push_sender};
pub use grouping::{BadgeGroup, group_by_badge, payload_for_group};
pub use status::{PushState, PushStatus};
pub use validation::{
    BadgeUpdate, is_increment, parse_badge, parse_expiration_time,
    validate_push_type,
};

pub const PUSH_STATUS_CLASS: &str = "_PushStatus";

/// Validates a push request, resolves its target installations through the
/// access pipeline, and hands per-group payloads to the [`PushSender`].
pub struct PushDispatcher {
    pipeline: Arc<AccessPipeline>,
    sender: Arc<dyn PushSender>,
    storage: Arc<dyn ObjectStorage>,
}

impl PushDispatcher {
    pub fn new(
        pipeline: Arc<AccessPipeline>,
        sender: Arc<dyn PushSender>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            pipeline,
            sender,
            storage,
        }
    }

    /// Run one push job to completion.
    ///
    /// `on_status_saved` fires once the job has an id and is Running, which
    /// is before any delivery. Any failure leaves the job Failed and is
    /// returned as the error.
    pub async fn send_push<F>(
        &self,
        body: Object,
        where_: Object,
        auth: &Auth,
        on_status_saved: F,
    ) -> BaasResult<PushStatus>
    where
        F: FnOnce(&str) + Send,
    {
        let mut status = PushStatus::new(&body, &where_);
        self.save_status(&status, true).await;
        debug!(job_id = %status.id(), "push job created");

        match self
            .dispatch(&mut status, body, where_, auth, on_status_saved)
            .await
        {
            Ok(()) => {
                self.save_status(&status, false).await;
                info!(
                    job_id = %status.id(),
                    results = status.results().len(),
                    "push job complete"
                );
                Ok(status)
            }
            Err(e) => {
                warn!(job_id = %status.id(), error = %e, "push job failed");
                status.fail(&e);
                self.save_status(&status, false).await;
                Err(e)
            }
        }
    }

    async fn dispatch<F>(
        &self,
        status: &mut PushStatus,
        mut body: Object,
        where_: Object,
        auth: &Auth,
        on_status_saved: F,
    ) -> BaasResult<()>
    where
        F: FnOnce(&str) + Send,
    {
        validate_push_type(&where_, &self.sender.valid_push_types())?;
        let badge = parse_badge(&body)?;
        if let Some(raw) = body.get("expiration_time") {
            let expiry = parse_expiration_time(raw, Utc::now())?;
            body.insert("expiration_time".into(), Value::from(expiry));
            status.set_expiry(expiry);
        }

        if let Some(badge) = &badge {
            let mut ios = where_.clone();
            ios.insert("deviceType".into(), json!("ios"));
            self.pipeline
                .update_many(INSTALLATION_CLASS, ios, badge.to_update())
                .await?;
        }

        status.set_running()?;
        self.save_status(status, false).await;
        on_status_saved(status.id());

        let found = self
            .pipeline
            .find(
                auth,
                INSTALLATION_CLASS,
                where_,
                QueryOptions::default(),
                &ClientInfo::new(),
            )
            .await?;
        if !found.has_results() {
            debug!(job_id = %status.id(), "no installations matched");
            return status.complete(Vec::new());
        }

        let results = self.deliver(&body, found.results, status.id()).await;
        status.complete(results)
    }

    async fn deliver(
        &self,
        body: &Object,
        installations: Vec<Object>,
        job_id: &str,
    ) -> Vec<Object> {
        let increment = body
            .get("data")
            .and_then(|d| d.get("badge"))
            .is_some_and(is_increment);
        if !increment {
            return self.sender.send(body, &installations, job_id).await;
        }

        let mut results = Vec::new();
        for (group, members) in group_by_badge(installations) {
            let payload = payload_for_group(body, group);
            debug!(job_id, ?group, devices = members.len(), "push group");
            results.extend(self.sender.send(&payload, &members, job_id).await);
        }
        results
    }

    /// Persist the job record; failures are logged and never fail the push.
    async fn save_status(&self, status: &PushStatus, created: bool) {
        let object = status.to_object();
        let saved = if created {
            self.storage.create(PUSH_STATUS_CLASS, &object).await
        } else {
            self.storage
                .update(PUSH_STATUS_CLASS, &where_object_id(status.id()), &object, false)
                .await
                .map(|_| ())
        };
        if let Err(e) = saved {
            warn!(job_id = %status.id(), error = %e, "failed to save push status");
        }
    }
}
