//! # cable-relay
//!
//! Channel subscriptions for the cable client.
//!
//! - [`Subscription`] encodes channel actions into [`Command`] envelopes and
//!   relays inbound lifecycle notifications and payloads as named events
//! - [`EventEmitter`] is the ordered, re-entrancy-safe fan-out underneath

#![deny(unsafe_code)]

pub mod command;
pub mod emitter;
pub mod errors;
pub mod subscription;

pub use command::Command;
pub use emitter::{EventEmitter, ListenerId};
pub use errors::{RelayError, Result};
pub use subscription::{Subscription, SubscriptionConsumer};
