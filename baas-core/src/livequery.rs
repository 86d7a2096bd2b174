use async_trait::async_trait;
use baas_models::Object;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum LiveQueryEvent {
    Saved {
        class_name: String,
        object: Object,
        original: Option<Object>,
    },
    Deleted {
        class_name: String,
        object: Object,
    },
}

/// Subscription lookup consulted by the pipeline before writes, plus the
/// notification sinks called after them.
#[async_trait]
pub trait LiveQueryRegistry: Send + Sync {
    fn has_subscription(&self, class_name: &str) -> bool;

    async fn on_after_save(
        &self,
        _class_name: &str,
        _object: &Object,
        _original: Option<&Object>,
    ) {
    }

    async fn on_after_delete(&self, _class_name: &str, _object: &Object) {}
}

/// Registry with no subscribers at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLiveQuery;

#[async_trait]
impl LiveQueryRegistry for NoLiveQuery {
    fn has_subscription(&self, _class_name: &str) -> bool {
        false
    }
}

/// In-process fan-out of object changes to per-class channels.
#[derive(Default)]
pub struct LiveQueryServer {
    subscribers: scc::HashMap<String, Vec<flume::Sender<LiveQueryEvent>>>,
}

impl LiveQueryServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, class_name: &str) -> flume::Receiver<LiveQueryEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers
            .entry(class_name.to_string())
            .or_default()
            .get_mut()
            .push(tx);
        rx
    }

    fn publish(&self, class_name: &str, event: LiveQueryEvent) {
        self.subscribers.update(class_name, |_, senders| {
            // drop channels whose receivers are gone
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            trace!(class_name, subscribers = senders.len(), "live query publish");
        });
    }
}

#[async_trait]
impl LiveQueryRegistry for LiveQueryServer {
    fn has_subscription(&self, class_name: &str) -> bool {
        self.subscribers
            .read(class_name, |_, senders| {
                senders.iter().any(|tx| !tx.is_disconnected())
            })
            .unwrap_or(false)
    }

    async fn on_after_save(
        &self,
        class_name: &str,
        object: &Object,
        original: Option<&Object>,
    ) {
        self.publish(
            class_name,
            LiveQueryEvent::Saved {
                class_name: class_name.to_string(),
                object: object.clone(),
                original: original.cloned(),
            },
        );
    }

    async fn on_after_delete(&self, class_name: &str, object: &Object) {
        self.publish(
            class_name,
            LiveQueryEvent::Deleted {
                class_name: class_name.to_string(),
                object: object.clone(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribe_and_receive() {
        let server = LiveQueryServer::new();
        assert!(!server.has_subscription("Chat"));

        let rx = server.subscribe("Chat");
        assert!(server.has_subscription("Chat"));
        assert!(!server.has_subscription("Other"));

        let object = json!({"objectId": "m1"}).as_object().cloned().unwrap();
        server.on_after_delete("Chat", &object).await;
        let event = rx.recv_async().await.unwrap();
        assert_eq!(
            event,
            LiveQueryEvent::Deleted {
                class_name: "Chat".into(),
                object,
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_receiver_clears_subscription() {
        let server = LiveQueryServer::new();
        drop(server.subscribe("Chat"));
        assert!(!server.has_subscription("Chat"));
        server.on_after_save("Chat", &Object::new(), None).await;
        assert!(!server.has_subscription("Chat"));
    }

    #[test]
    fn test_no_live_query() {
        assert!(!NoLiveQuery.has_subscription("Anything"));
    }
}
