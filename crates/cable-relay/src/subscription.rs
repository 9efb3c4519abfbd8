//! A single channel subscription.
//!
//! Outbound, a [`Subscription`] wraps actions into [`Command`]s for its
//! consumer. Inbound, the consumer feeds it lifecycle notifications and
//! received payloads, which it re-emits as named events.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::command::Command;
use crate::emitter::{EventEmitter, ListenerId};
use crate::errors::{RelayError, Result, json_kind};

/// Event emitted by [`Subscription::connected`].
pub const CONNECTED: &str = "connected";
/// Event emitted by [`Subscription::disconnected`].
pub const DISCONNECTED: &str = "disconnected";
/// Event emitted by [`Subscription::rejected`].
pub const REJECTED: &str = "rejected";
/// Event emitted by [`Subscription::error`].
pub const ERROR: &str = "error";
/// Event used for received payloads that name no action.
pub const RECEIVED: &str = "received";

/// The connection-level consumer a subscription talks back to.
pub trait SubscriptionConsumer: Send + Sync {
    /// Deliver an outbound command.
    fn send(&self, command: Command);

    /// Drop the subscription with `identifier`.
    fn remove(&self, identifier: &str);
}

/// One channel subscription.
pub struct Subscription {
    consumer: Arc<dyn SubscriptionConsumer>,
    identifier: String,
    events: EventEmitter<Value>,
}

impl Subscription {
    /// Create a subscription whose identifier is the JSON encoding of
    /// `params`, which must serialize to an object. Keys keep their
    /// serialization order.
    pub fn new(consumer: Arc<dyn SubscriptionConsumer>, params: &impl Serialize) -> Result<Self> {
        let params = serde_json::to_value(params)?;
        if !params.is_object() {
            return Err(RelayError::InvalidParams(json_kind(&params)));
        }
        let identifier = serde_json::to_string(&params)?;
        debug!(identifier = %identifier, "subscription created");
        Ok(Self {
            consumer,
            identifier,
            events: EventEmitter::new(),
        })
    }

    /// The channel identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Invoke a channel action. `data` must be an object or null; the action
    /// name is added under `"action"`, replacing any existing value.
    pub fn perform(&self, action: &str, data: Value) -> Result<()> {
        let mut payload = match data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => return Err(RelayError::InvalidPayload(json_kind(&other))),
        };
        let _ = payload.insert("action".to_owned(), Value::String(action.to_owned()));
        self.send(&Value::Object(payload))
    }

    /// Send `data` to the channel as-is.
    pub fn send(&self, data: &Value) -> Result<()> {
        let encoded = serde_json::to_string(data)?;
        self.consumer
            .send(Command::message(self.identifier.clone(), encoded));
        Ok(())
    }

    /// Ask the consumer to remove this subscription.
    pub fn unsubscribe(&self) {
        debug!(identifier = %self.identifier, "unsubscribing");
        self.consumer.remove(&self.identifier);
    }

    /// Relay a confirmed subscription.
    pub fn connected(&self) -> bool {
        self.events.emit(CONNECTED, &Value::Null)
    }

    /// Relay a lost connection.
    pub fn disconnected(&self) -> bool {
        self.events.emit(DISCONNECTED, &Value::Null)
    }

    /// Relay a rejected subscription.
    pub fn rejected(&self) -> bool {
        self.events.emit(REJECTED, &Value::Null)
    }

    /// Relay an error.
    pub fn error(&self, error: &Value) -> bool {
        self.events.emit(ERROR, error)
    }

    /// Relay an inbound payload under its `action` name.
    ///
    /// A missing or null `action` becomes `"received"` and is written back
    /// into the payload. Null data is treated as an empty object; any other
    /// non-object payload is emitted under `"received"` unchanged.
    pub fn received(&self, data: Value) -> bool {
        let mut map = match data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => return self.events.emit(RECEIVED, &other),
        };
        let action = match map.get("action") {
            None | Some(Value::Null) => {
                let _ = map.insert("action".to_owned(), Value::String(RECEIVED.to_owned()));
                RECEIVED.to_owned()
            }
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
        };
        self.events.emit(&action, &Value::Object(map))
    }

    /// Listen for `event`.
    pub fn on(&self, event: &str, listener: impl Fn(&Value) + Send + Sync + 'static) -> ListenerId {
        self.events.on(event, listener)
    }

    /// Listen for the next `event` only.
    pub fn once(&self, event: &str, listener: impl Fn(&Value) + Send + Sync + 'static) -> ListenerId {
        self.events.once(event, listener)
    }

    /// Stop listening.
    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// The underlying emitter.
    pub fn events(&self) -> &EventEmitter<Value> {
        &self.events
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("identifier", &self.identifier)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
