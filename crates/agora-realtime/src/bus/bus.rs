//! Event bus — routes inbound events by topic to registered handlers.
//!
//! Dispatch is serialized: one event's handlers run to completion, in
//! subscription order, before the next published event is processed. This
//! is the engine's single-owner mutation path — every state change enters
//! through it, so component maps never see interleaved mutation for the
//! same event stream.
//!
//! Handlers must not publish back onto the same bus from within their own
//! invocation; derived events (timer expirations, sweeps) are published
//! from their own tasks instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use agora_core::error::AppError;
use agora_core::result::AppResult;

use crate::metrics::EngineMetrics;

/// Payload carried by every event. Handlers deserialize into their typed
/// payload structs; unknown topics and extra fields pass through untouched
/// for forward compatibility.
pub type EventPayload = serde_json::Value;

/// A registered handler: an async closure over the raw payload.
pub type BoxedHandler = Arc<dyn Fn(EventPayload) -> BoxFuture<'static, ()> + Send + Sync>;

/// Token returned from subscription, used to unsubscribe at teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken {
    topic: String,
    id: u64,
}

impl SubscriptionToken {
    /// The topic this token is registered under.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

struct Subscriber {
    id: u64,
    label: String,
    handler: BoxedHandler,
}

/// Typed publish/subscribe multiplexer over one transport connection.
pub struct EventBus {
    /// Topic → subscribers in subscription order.
    subscribers: Mutex<HashMap<String, Vec<Subscriber>>>,
    /// Serializes dispatch so handlers never interleave.
    dispatch_gate: tokio::sync::Mutex<()>,
    /// Token id source.
    next_id: AtomicU64,
    /// Metrics collector.
    metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish()
    }
}

impl EventBus {
    /// Create a new bus with no subscribers.
    pub fn new(metrics: Arc<EngineMetrics>) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            dispatch_gate: tokio::sync::Mutex::new(()),
            next_id: AtomicU64::new(1),
            metrics,
        }
    }

    /// Register a raw handler for `topic` under a wiring `label`.
    ///
    /// Labels identify the subscribing component; registering the same
    /// label twice on one topic is a wiring-time programmer error and
    /// fails without touching the existing registration.
    pub fn subscribe(
        &self,
        topic: &str,
        label: &str,
        handler: BoxedHandler,
    ) -> AppResult<SubscriptionToken> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let list = subscribers.entry(topic.to_string()).or_default();

        if list.iter().any(|s| s.label == label) {
            return Err(AppError::subscription(format!(
                "handler '{label}' is already subscribed to '{topic}'"
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        list.push(Subscriber {
            id,
            label: label.to_string(),
            handler,
        });

        Ok(SubscriptionToken {
            topic: topic.to_string(),
            id,
        })
    }

    /// Register a typed handler for `topic`.
    ///
    /// The payload is deserialized into `P` before the handler runs; a
    /// payload that does not deserialize is dropped and logged without any
    /// state change, per the malformed-event contract.
    pub fn on<P, F, Fut>(&self, topic: &str, label: &str, handler: F) -> AppResult<SubscriptionToken>
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let metrics = Arc::clone(&self.metrics);
        let owned_topic = topic.to_string();
        let boxed: BoxedHandler = Arc::new(move |payload: EventPayload| {
            match serde_json::from_value::<P>(payload) {
                Ok(typed) => Box::pin(handler(typed)) as BoxFuture<'static, ()>,
                Err(e) => {
                    warn!(topic = %owned_topic, error = %e, "dropping malformed event payload");
                    EngineMetrics::inc(&metrics.events_malformed);
                    Box::pin(async {})
                }
            }
        });
        self.subscribe(topic, label, boxed)
    }

    /// Remove the registration behind `token`. Unsubscribing an unknown or
    /// already-removed token is a no-op.
    pub fn unsubscribe(&self, token: &SubscriptionToken) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = subscribers.get_mut(&token.topic) {
            list.retain(|s| s.id != token.id);
            if list.is_empty() {
                subscribers.remove(&token.topic);
            }
        }
    }

    /// Publish an event. Handlers for the topic run sequentially in
    /// subscription order; the call returns once all of them finish.
    ///
    /// Topics with no subscribers are accepted (forward-compatible) and
    /// produce nothing beyond a trace line.
    pub async fn publish(&self, topic: &str, payload: EventPayload) {
        let _gate = self.dispatch_gate.lock().await;
        EngineMetrics::inc(&self.metrics.events_published);

        let handlers: Vec<BoxedHandler> = {
            let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
            match subscribers.get(topic) {
                Some(list) => list.iter().map(|s| Arc::clone(&s.handler)).collect(),
                None => Vec::new(),
            }
        };

        if handlers.is_empty() {
            trace!(topic, "event has no subscribers");
            return;
        }

        for handler in handlers {
            handler(payload.clone()).await;
        }
    }

    /// Number of subscribers across all topics.
    pub fn subscriber_count(&self) -> usize {
        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.values().map(|l| l.len()).sum()
    }
}
