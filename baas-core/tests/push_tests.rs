mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use baas_core::push::{PUSH_STATUS_CLASS, PushSender};
use baas_core::{BaasError, PushDispatcher, PushState};
use baas_models::{Auth, Object};
use chrono::Utc;
use common::{Harness, harness, obj};
use serde_json::{Value, json};

/// Records every adapter call.
#[derive(Default)]
struct RecordingSender {
    calls: Mutex<Vec<(Object, Vec<Object>)>>,
}

impl RecordingSender {
    fn calls(&self) -> Vec<(Object, Vec<Object>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(
        &self,
        payload: &Object,
        installations: &[Object],
        _job_id: &str,
    ) -> Vec<Object> {
        self.calls
            .lock()
            .unwrap()
            .push((payload.clone(), installations.to_vec()));
        installations
            .iter()
            .map(|_| obj(json!({"transmitted": true})))
            .collect()
    }

    fn valid_push_types(&self) -> Vec<String> {
        vec!["ios".into(), "android".into()]
    }
}

fn dispatcher(h: &Harness) -> (PushDispatcher, Arc<RecordingSender>) {
    let sender = Arc::new(RecordingSender::default());
    let dispatcher =
        PushDispatcher::new(h.pipeline.clone(), sender.clone(), h.storage.clone());
    (dispatcher, sender)
}

async fn stored_status(h: &Harness) -> Object {
    let mut all = h.storage.all(PUSH_STATUS_CLASS).await;
    assert_eq!(all.len(), 1);
    all.remove(0)
}

#[tokio::test]
async fn test_unsupported_device_type_fails() {
    let h = harness();
    let (dispatcher, sender) = dispatcher(&h);
    let err = dispatcher
        .send_push(
            obj(json!({"data": {"alert": "hi"}})),
            obj(json!({"deviceType": {"$in": ["ios", "carrierpigeon"]}})),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), BaasError::PUSH_MISCONFIGURED);
    assert!(sender.calls().is_empty());

    let status = stored_status(&h).await;
    assert_eq!(status["status"], json!("failed"));
    assert_eq!(
        status["errorMessage"],
        json!("carrierpigeon is not supported push type.")
    );
}

#[tokio::test]
async fn test_badge_increment_groups_by_observed_badge() {
    let h = harness();
    // stored badges are bumped before targets are resolved, so 2 and 6 are
    // observed as 3 and 7
    h.storage
        .seed("_Installation", json!({"objectId": "i1", "deviceType": "ios", "badge": 2}))
        .await;
    h.storage
        .seed("_Installation", json!({"objectId": "i2", "deviceType": "ios", "badge": 6}))
        .await;
    h.storage
        .seed("_Installation", json!({"objectId": "i3", "deviceType": "android", "badge": 5}))
        .await;
    let (dispatcher, sender) = dispatcher(&h);

    let status = dispatcher
        .send_push(
            obj(json!({"data": {"alert": "hi", "badge": "Increment"}})),
            Object::new(),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap();
    assert_eq!(status.state(), PushState::Complete);
    assert_eq!(status.results().len(), 3);

    let mut calls = sender.calls();
    assert_eq!(calls.len(), 3);
    calls.sort_by_key(|(payload, _)| payload["data"].get("badge").and_then(Value::as_i64));
    assert!(calls[0].0["data"].get("badge").is_none());
    assert_eq!(calls[0].1[0]["deviceType"], json!("android"));
    assert_eq!(calls[1].0["data"]["badge"], json!(4));
    assert_eq!(calls[2].0["data"]["badge"], json!(8));

    let android = h
        .storage
        .all("_Installation")
        .await
        .into_iter()
        .find(|i| i["objectId"] == json!("i3"))
        .unwrap();
    assert_eq!(android["badge"], json!(5));
}

#[tokio::test]
async fn test_numeric_badge_is_absolute() {
    let h = harness();
    h.storage
        .seed("_Installation", json!({"objectId": "i1", "deviceType": "ios", "badge": 9}))
        .await;
    let (dispatcher, sender) = dispatcher(&h);
    dispatcher
        .send_push(
            obj(json!({"data": {"badge": 1}})),
            Object::new(),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap();
    let calls = sender.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0["data"]["badge"], json!(1));
    assert_eq!(calls[0].1[0]["badge"], json!(1));
}

#[tokio::test]
async fn test_invalid_badge_fails() {
    let h = harness();
    let (dispatcher, _sender) = dispatcher(&h);
    let err = dispatcher
        .send_push(
            obj(json!({"data": {"badge": "many"}})),
            Object::new(),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid value for badge, expected number or 'Increment'"
    );
}

#[tokio::test]
async fn test_expiration_time() {
    let h = harness();
    h.storage
        .seed("_Installation", json!({"objectId": "i1", "deviceType": "android"}))
        .await;
    let (dispatcher, sender) = dispatcher(&h);

    let past = Utc::now().timestamp() - 60;
    let err = dispatcher
        .send_push(
            obj(json!({"data": {}, "expiration_time": past})),
            Object::new(),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), BaasError::PUSH_MISCONFIGURED);
    assert!(sender.calls().is_empty());

    let future = Utc::now().timestamp() + 3600;
    let status = dispatcher
        .send_push(
            obj(json!({"data": {}, "expiration_time": future})),
            Object::new(),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap();
    assert_eq!(status.expiry(), Some(future * 1000));
    assert_eq!(sender.calls()[0].0["expiration_time"], json!(future * 1000));
}

#[tokio::test]
async fn test_no_targets_completes_empty() {
    let h = harness();
    let (dispatcher, sender) = dispatcher(&h);
    let seen = Arc::new(Mutex::new(None));
    let seen_in_callback = seen.clone();
    let status = dispatcher
        .send_push(
            obj(json!({"data": {"alert": "anyone?"}})),
            obj(json!({"deviceType": "ios"})),
            &Auth::master(),
            move |id| {
                *seen_in_callback.lock().unwrap() = Some(id.to_string());
            },
        )
        .await
        .unwrap();
    assert_eq!(status.state(), PushState::Complete);
    assert!(status.results().is_empty());
    assert!(sender.calls().is_empty());
    assert_eq!(seen.lock().unwrap().as_deref(), Some(status.id()));

    let stored = stored_status(&h).await;
    assert_eq!(stored["status"], json!("succeeded"));
    assert_eq!(stored["numSent"], json!(0));
}

#[tokio::test]
async fn test_plain_push_single_adapter_call() {
    let h = harness();
    for (id, device) in [("i1", "ios"), ("i2", "android")] {
        h.storage
            .seed("_Installation", json!({"objectId": id, "deviceType": device}))
            .await;
    }
    let (dispatcher, sender) = dispatcher(&h);
    let status = dispatcher
        .send_push(
            obj(json!({"data": {"alert": "hello"}})),
            Object::new(),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap();
    let calls = sender.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.len(), 2);
    assert_eq!(calls[0].0, obj(json!({"data": {"alert": "hello"}})));
    assert_eq!(stored_status(&h).await["numSent"], json!(2));
    assert_eq!(status.results().len(), 2);
}

#[tokio::test]
async fn test_failed_badge_bump_leaves_installations_untouched() {
    let h = harness();
    h.storage
        .seed("_Installation", json!({"objectId": "i1", "deviceType": "ios", "badge": 1}))
        .await;
    h.storage
        .seed("_Installation", json!({"objectId": "i2", "deviceType": "ios", "badge": "x"}))
        .await;
    let (dispatcher, sender) = dispatcher(&h);
    dispatcher
        .send_push(
            obj(json!({"data": {"badge": "Increment"}})),
            Object::new(),
            &Auth::master(),
            |_| {},
        )
        .await
        .unwrap_err();
    assert!(sender.calls().is_empty());
    assert_eq!(stored_status(&h).await["status"], json!("failed"));

    let mut installations = h.storage.all("_Installation").await;
    installations.sort_by_key(|i| i["objectId"].as_str().map(String::from));
    assert_eq!(installations[0]["badge"], json!(1));
    assert_eq!(installations[1]["badge"], json!("x"));
}
