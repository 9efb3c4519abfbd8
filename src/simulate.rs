//! In-process simulation of a cable connection under a liveness monitor.
//!
//! A [`SimulatedTransport`] plays the server side: it delivers heartbeats
//! while healthy, goes silent on cue, and on `reopen()` drops and
//! re-establishes the connection after a short handshake delay. A
//! [`Subscription`] rides on top and is told about every connect and
//! disconnect, the way a real consumer would relay them.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cable_monitor::{AppState, AppStateObserver, Connection, ConnectionMonitor, MonitorConfig};
use cable_relay::{Command, Subscription, SubscriptionConsumer};

/// Time the simulated handshake takes after a reopen request.
const HANDSHAKE_DELAY: Duration = Duration::from_millis(300);

/// Simulation timeline. All offsets are from the start of the run.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// Total run time.
    pub duration: Duration,
    /// Heartbeat period while the server is healthy.
    pub heartbeat: Duration,
    /// When the server stops sending heartbeats, if ever. A reconnect
    /// restores them.
    pub silence_after: Option<Duration>,
    /// When the host app goes to the background, if ever.
    pub background_at: Option<Duration>,
    /// When the host app returns to the foreground, if ever.
    pub resume_at: Option<Duration>,
}

/// Counters reported when the simulation ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Heartbeats delivered to the monitor.
    pub heartbeats: u32,
    /// Reopen requests received from the monitor.
    pub reopens: u32,
    /// Completed reconnects.
    pub reconnects: u32,
    /// Backoff attempts at the end of the run.
    pub reconnect_attempts: u32,
}

/// Server side of the simulated connection.
pub struct SimulatedTransport {
    this: Weak<SimulatedTransport>,
    runtime: Handle,
    open: AtomicBool,
    silent: AtomicBool,
    heartbeats: AtomicU32,
    reopens: AtomicU32,
    reconnects: AtomicU32,
    monitor: Mutex<Weak<ConnectionMonitor>>,
    subscription: Mutex<Option<Arc<Subscription>>>,
}

impl SimulatedTransport {
    /// A transport that starts open and healthy. Must be created inside a
    /// Tokio runtime.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            runtime: Handle::current(),
            open: AtomicBool::new(true),
            silent: AtomicBool::new(false),
            heartbeats: AtomicU32::new(0),
            reopens: AtomicU32::new(0),
            reconnects: AtomicU32::new(0),
            monitor: Mutex::new(Weak::new()),
            subscription: Mutex::new(None),
        })
    }

    fn attach(&self, monitor: &Arc<ConnectionMonitor>, subscription: Arc<Subscription>) {
        *self.monitor.lock() = Arc::downgrade(monitor);
        *self.subscription.lock() = Some(subscription);
    }

    fn monitor(&self) -> Option<Arc<ConnectionMonitor>> {
        self.monitor.lock().upgrade()
    }

    fn subscription(&self) -> Option<Arc<Subscription>> {
        self.subscription.lock().clone()
    }

    /// Stop sending heartbeats until the next reconnect.
    pub fn go_silent(&self) {
        info!("server stopped sending heartbeats");
        self.silent.store(true, Ordering::SeqCst);
    }

    /// Deliver one heartbeat if the connection is open and the server is
    /// healthy. Returns whether one was delivered.
    pub fn heartbeat(&self) -> bool {
        if !self.is_open() || self.silent.load(Ordering::SeqCst) {
            return false;
        }
        let _ = self.heartbeats.fetch_add(1, Ordering::SeqCst);
        if let Some(monitor) = self.monitor() {
            monitor.record_ping();
        }
        true
    }

    fn complete_handshake(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.silent.store(false, Ordering::SeqCst);
        let count = self.reconnects.fetch_add(1, Ordering::SeqCst) + 1;
        info!(reconnects = count, "simulated connection re-established");
        if let Some(monitor) = self.monitor() {
            monitor.record_connect();
            monitor.record_ping();
        }
        if let Some(subscription) = self.subscription() {
            let _ = subscription.connected();
        }
    }

    /// Snapshot of the transport's counters.
    pub fn summary(&self) -> Summary {
        Summary {
            heartbeats: self.heartbeats.load(Ordering::SeqCst),
            reopens: self.reopens.load(Ordering::SeqCst),
            reconnects: self.reconnects.load(Ordering::SeqCst),
            reconnect_attempts: self.monitor().map_or(0, |m| m.reconnect_attempts()),
        }
    }
}

impl Connection for SimulatedTransport {
    fn reopen(&self) {
        let count = self.reopens.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(reopens = count, "reopen requested, dropping connection");
        self.open.store(false, Ordering::SeqCst);
        if let Some(monitor) = self.monitor() {
            monitor.record_disconnect();
        }
        if let Some(subscription) = self.subscription() {
            let _ = subscription.disconnected();
        }

        let transport = self.this.clone();
        drop(self.runtime.spawn(async move {
            tokio::time::sleep(HANDSHAKE_DELAY).await;
            if let Some(transport) = transport.upgrade() {
                transport.complete_handshake();
            }
        }));
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Consumer that logs every outbound command.
#[derive(Debug, Default)]
struct LoggingConsumer;

impl SubscriptionConsumer for LoggingConsumer {
    fn send(&self, command: Command) {
        debug!(identifier = %command.identifier, data = %command.data, "outbound command");
    }

    fn remove(&self, identifier: &str) {
        debug!(identifier, "subscription removed");
    }
}

/// Run `scenario` until it elapses or `shutdown` is cancelled.
pub async fn run(
    scenario: &Scenario,
    config: MonitorConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<Summary> {
    let transport = SimulatedTransport::new();
    let observer = Arc::new(AppStateObserver::new(AppState::Active));
    let monitor = Arc::new(
        ConnectionMonitor::builder(transport.clone())
            .foreground(observer.clone())
            .config(config)
            .build(),
    );

    let subscription = Arc::new(Subscription::new(
        Arc::new(LoggingConsumer),
        &json!({"channel": "HeartbeatChannel"}),
    )?);
    let _ = subscription.on("connected", |_| info!("subscription connected"));
    let _ = subscription.on("disconnected", |_| info!("subscription disconnected"));
    transport.attach(&monitor, Arc::clone(&subscription));

    monitor.start();
    monitor.record_connect();
    let _ = subscription.connected();
    subscription.perform("follow", json!({"stream": "heartbeats"}))?;

    let tasks = spawn_timeline(scenario, &transport, &observer, &shutdown);

    tokio::select! {
        () = shutdown.cancelled() => info!("shutdown requested"),
        () = tokio::time::sleep(scenario.duration) => info!("simulation finished"),
    }

    monitor.stop();
    shutdown.cancel();
    for task in tasks {
        let _ = task.await;
    }
    subscription.unsubscribe();
    Ok(transport.summary())
}

fn spawn_timeline(
    scenario: &Scenario,
    transport: &Arc<SimulatedTransport>,
    observer: &Arc<AppStateObserver>,
    shutdown: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();

    let (t, token, period) = (Arc::clone(transport), shutdown.clone(), scenario.heartbeat);
    tasks.push(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    let _ = t.heartbeat();
                }
            }
        }
    }));

    if let Some(at) = scenario.silence_after {
        let t = Arc::clone(transport);
        tasks.push(after(at, shutdown.clone(), move || t.go_silent()));
    }
    if let Some(at) = scenario.background_at {
        let o = Arc::clone(observer);
        tasks.push(after(at, shutdown.clone(), move || {
            info!("app moved to background");
            let _ = o.set_state(AppState::Background);
        }));
    }
    if let Some(at) = scenario.resume_at {
        let o = Arc::clone(observer);
        tasks.push(after(at, shutdown.clone(), move || {
            info!("app returned to foreground");
            let _ = o.set_state(AppState::Active);
        }));
    }
    tasks
}

fn after(
    delay: Duration,
    token: CancellationToken,
    action: impl FnOnce() + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = tokio::time::sleep(delay) => action(),
        }
    })
}
