//! # cable-monitor
//!
//! Liveness monitoring for a persistent message channel.
//!
//! [`ConnectionMonitor`] watches the timestamps of inbound activity on a
//! [`Connection`] and asks it to reopen when it has been silent for longer
//! than the stale threshold. Polls are spaced with exponential backoff and
//! jitter, reopen is suppressed right after a recorded disconnect, and a
//! [`ForegroundObserver`] can force a re-check shortly after the host
//! application comes back to the foreground.
//!
//! The monitor never touches the wire. The transport reports activity with
//! `record_*` calls and receives `reopen()` requests; that is the whole
//! contract.

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod foreground;
pub mod interval;
pub mod monitor;
pub mod timer;

pub use config::MonitorConfig;
pub use connection::Connection;
pub use diagnostics::{DiagnosticSink, RecordingSink, TracingSink};
pub use foreground::{
    AppState, AppStateObserver, ForegroundCallback, ForegroundObserver, ForegroundSubscription,
    InertObserver, detect_foreground_observer,
};
pub use monitor::{ConnectionMonitor, MonitorBuilder, MonitorSnapshot, StaleCheck};
