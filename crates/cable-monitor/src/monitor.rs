//! The connection liveness monitor.
//!
//! A [`ConnectionMonitor`] is either stopped or running. While running it
//! keeps exactly one poll timer armed and one foreground subscription open.
//! Each poll runs a staleness check and then re-arms itself with a freshly
//! computed, backoff-scaled interval.
//!
//! All state sits behind one mutex. Collaborator calls (`reopen`, `is_open`,
//! sink lines) happen after the lock is released, so a transport may call
//! back into the monitor from `reopen`.
//!
//! Every timer and foreground callback carries the run epoch it was created
//! in. A callback that wakes after `stop()` (or after a stop/start cycle)
//! sees a different epoch or a stopped monitor and does nothing.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::config::MonitorConfig;
use crate::connection::Connection;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::foreground::{ForegroundObserver, ForegroundSubscription, InertObserver};
use crate::interval::{is_stale, poll_interval, seconds_since};
use crate::timer::{self, TimerHandle};

/// Outcome of a single staleness check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StaleCheck {
    /// Activity was seen within the threshold; nothing was done.
    Fresh,
    /// Stale, but a disconnect was recorded recently so reopen was skipped.
    SkippedRecentDisconnect {
        /// Seconds since the recorded disconnect.
        disconnected_secs: f64,
    },
    /// Stale; the connection was asked to reopen.
    Reopened,
}

/// Point-in-time copy of the monitor's state.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorSnapshot {
    /// When the current (or last) run began.
    pub started_at: Option<Instant>,
    /// When the last run ended; `None` while running.
    pub stopped_at: Option<Instant>,
    /// Last recorded inbound activity.
    pub pinged_at: Option<Instant>,
    /// Last recorded disconnect, cleared on connect.
    pub disconnected_at: Option<Instant>,
    /// Consecutive stale polls since the last connect.
    pub reconnect_attempts: u32,
    /// Whether a poll timer is armed.
    pub poll_armed: bool,
    /// Whether the foreground observer subscription is held.
    pub foreground_subscribed: bool,
}

#[derive(Default)]
struct MonitorState {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
    pinged_at: Option<Instant>,
    disconnected_at: Option<Instant>,
    reconnect_attempts: u32,
    epoch: u64,
    runtime: Option<Handle>,
    poll_timer: Option<TimerHandle>,
    recheck_timer: Option<TimerHandle>,
    foreground_subscription: Option<ForegroundSubscription>,
}

impl MonitorState {
    fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.is_running() && self.epoch == epoch
    }

    fn refreshed_at(&self) -> Option<Instant> {
        self.pinged_at.or(self.started_at)
    }

    fn cancel_timers(&mut self) {
        if let Some(t) = self.poll_timer.take() {
            t.cancel();
        }
        if let Some(t) = self.recheck_timer.take() {
            t.cancel();
        }
    }
}

struct Inner {
    connection: Arc<dyn Connection>,
    sink: Arc<dyn DiagnosticSink>,
    foreground: Arc<dyn ForegroundObserver>,
    config: MonitorConfig,
    rng: Mutex<StdRng>,
    state: Mutex<MonitorState>,
}

impl Inner {
    fn log(&self, message: &str) {
        self.sink.log(message);
    }

    fn next_interval(&self, reconnect_attempts: u32) -> Duration {
        let random: f64 = self.rng.lock().random();
        poll_interval(&self.config, reconnect_attempts, random)
    }

    fn stale_secs(&self, state: &MonitorState, now: Instant) -> Option<f64> {
        let elapsed = seconds_since(state.refreshed_at(), now);
        is_stale(&self.config, elapsed).then_some(elapsed)
    }

    /// Arm the next poll. Caller holds the state lock.
    fn arm_poll(self: &Arc<Self>, state: &mut MonitorState) -> Option<Duration> {
        let runtime = state.runtime.clone()?;
        let interval = self.next_interval(state.reconnect_attempts);
        let weak = Arc::downgrade(self);
        let epoch = state.epoch;
        state.poll_timer = Some(timer::schedule(&runtime, interval, move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_poll(epoch);
            }
        }));
        Some(interval)
    }

    fn on_poll(self: &Arc<Self>, epoch: u64) {
        if self.check_stale(Some(epoch)).is_none() {
            return;
        }

        let mut state = self.state.lock();
        // reopen() may have stopped or restarted us
        if state.is_current(epoch) {
            let _ = self.arm_poll(&mut state);
        }
    }

    /// Staleness check. With `Some(epoch)` the check is skipped (returning
    /// `None`) unless that run is still current; the epoch test and the
    /// attempt increment share one lock acquisition.
    fn check_stale(&self, epoch: Option<u64>) -> Option<StaleCheck> {
        let now = Instant::now();
        let threshold = self.config.stale_threshold_secs();

        let (elapsed, attempts, recent_disconnect) = {
            let mut state = self.state.lock();
            if epoch.is_some_and(|e| !state.is_current(e)) {
                return None;
            }
            let Some(elapsed) = self.stale_secs(&state, now) else {
                return Some(StaleCheck::Fresh);
            };
            let attempts = state.reconnect_attempts;
            state.reconnect_attempts = attempts.saturating_add(1);
            let recent = state
                .disconnected_at
                .map(|t| seconds_since(Some(t), now))
                .filter(|secs| *secs < threshold);
            (elapsed, attempts, recent)
        };

        self.log(&format!(
            "ConnectionMonitor detected stale connection. reconnectAttempts = {attempts}, \
             time stale = {elapsed:.3} s, stale threshold = {threshold} s"
        ));

        if let Some(disconnected_secs) = recent_disconnect {
            self.log(&format!(
                "ConnectionMonitor skipping reopening recent disconnect. \
                 time disconnected = {disconnected_secs:.3} s"
            ));
            Some(StaleCheck::SkippedRecentDisconnect { disconnected_secs })
        } else {
            self.log("ConnectionMonitor reopening");
            self.connection.reopen();
            Some(StaleCheck::Reopened)
        }
    }

    fn visibility_did_change(self: &Arc<Self>, epoch: u64) {
        if !self.foreground.is_foreground() {
            return;
        }
        let mut state = self.state.lock();
        if !state.is_current(epoch) {
            return;
        }
        let Some(runtime) = state.runtime.clone() else {
            return;
        };
        // a newer transition supersedes a pending re-check
        if let Some(t) = state.recheck_timer.take() {
            t.cancel();
        }
        let weak = Arc::downgrade(self);
        state.recheck_timer = Some(timer::schedule(
            &runtime,
            self.config.foreground_recheck_delay,
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.recheck_after_foreground(epoch);
                }
            },
        ));
    }

    fn recheck_after_foreground(&self, epoch: u64) {
        let stale = {
            let mut state = self.state.lock();
            if !state.is_current(epoch) {
                return;
            }
            state.recheck_timer = None;
            self.stale_secs(&state, Instant::now()).is_some()
        };

        let open = self.connection.is_open();
        if stale || !open {
            self.log(&format!(
                "ConnectionMonitor reopening stale connection on change. \
                 stale = {stale}, open = {open}"
            ));
            self.connection.reopen();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.cancel_timers();
        drop(state.foreground_subscription.take());
    }
}

/// Builder for [`ConnectionMonitor`].
pub struct MonitorBuilder {
    connection: Arc<dyn Connection>,
    sink: Arc<dyn DiagnosticSink>,
    foreground: Arc<dyn ForegroundObserver>,
    config: MonitorConfig,
}

impl MonitorBuilder {
    /// Use `sink` for diagnostic lines instead of [`TracingSink`].
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use `observer` for foreground transitions instead of [`InertObserver`].
    #[must_use]
    pub fn foreground(mut self, observer: Arc<dyn ForegroundObserver>) -> Self {
        self.foreground = observer;
        self
    }

    /// Replace the tuning parameters.
    #[must_use]
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a stopped monitor.
    pub fn build(self) -> ConnectionMonitor {
        let rng = match self.config.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        ConnectionMonitor {
            inner: Arc::new(Inner {
                connection: self.connection,
                sink: self.sink,
                foreground: self.foreground,
                config: self.config,
                rng: Mutex::new(rng),
                state: Mutex::new(MonitorState::default()),
            }),
        }
    }
}

/// Watches a [`Connection`] for staleness and asks it to reopen.
///
/// Starts stopped. [`start`](Self::start) must be called from within a Tokio
/// runtime; timers are spawned on that runtime and foreground callbacks
/// arriving from other threads are scheduled onto it as well.
pub struct ConnectionMonitor {
    inner: Arc<Inner>,
}

impl ConnectionMonitor {
    /// Monitor with default tuning, a [`TracingSink`] and an [`InertObserver`].
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self::builder(connection).build()
    }

    /// Start configuring a monitor for `connection`.
    pub fn builder(connection: Arc<dyn Connection>) -> MonitorBuilder {
        MonitorBuilder {
            connection,
            sink: Arc::new(TracingSink),
            foreground: Arc::new(InertObserver),
            config: MonitorConfig::default(),
        }
    }

    /// Begin monitoring. No-op if already running.
    ///
    /// Timers run on the Tokio runtime `start` is called from. Outside a
    /// runtime the monitor logs a diagnostic line and stays stopped.
    pub fn start(&self) {
        let inner = &self.inner;
        let interval = {
            let mut state = inner.state.lock();
            if state.is_running() {
                return;
            }
            let Ok(runtime) = Handle::try_current() else {
                drop(state);
                inner.log("ConnectionMonitor cannot start without a Tokio runtime");
                return;
            };
            state.started_at = Some(Instant::now());
            state.stopped_at = None;
            state.epoch += 1;
            state.runtime = Some(runtime);
            state.cancel_timers();
            let interval = inner.arm_poll(&mut state);

            let weak: Weak<Inner> = Arc::downgrade(inner);
            let epoch = state.epoch;
            let subscription = inner.foreground.subscribe(Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.visibility_did_change(epoch);
                }
            }));
            // a leftover subscription can only exist if stop() was skipped
            drop(state.foreground_subscription.replace(subscription));
            interval
        };

        let interval_ms = interval.map_or(0, |d| d.as_millis());
        inner.log(&format!(
            "ConnectionMonitor started. pollInterval = {interval_ms} ms"
        ));
    }

    /// Stop monitoring. No-op if not running.
    ///
    /// Cancels all pending timers and releases the foreground subscription
    /// before returning.
    pub fn stop(&self) {
        let subscription = {
            let mut state = self.inner.state.lock();
            if !state.is_running() {
                return;
            }
            state.stopped_at = Some(Instant::now());
            state.cancel_timers();
            state.foreground_subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        self.inner.log("ConnectionMonitor stopped");
    }

    /// Whether the monitor is running.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().is_running()
    }

    /// Record inbound traffic of any kind.
    pub fn record_message(&self) {
        self.inner.state.lock().pinged_at = Some(Instant::now());
    }

    /// Record a heartbeat. Same as [`record_message`](Self::record_message).
    pub fn record_ping(&self) {
        self.record_message();
    }

    /// Record a successful (re)connect: resets backoff and clears the
    /// disconnect timestamp.
    pub fn record_connect(&self) {
        {
            let mut state = self.inner.state.lock();
            state.reconnect_attempts = 0;
            state.disconnected_at = None;
        }
        self.inner.log("ConnectionMonitor recorded connect");
    }

    /// Record a disconnect, including ones caused by our own reopen.
    pub fn record_disconnect(&self) {
        self.inner.state.lock().disconnected_at = Some(Instant::now());
        self.inner.log("ConnectionMonitor recorded disconnect");
    }

    /// Run one staleness check immediately, outside the poll schedule.
    ///
    /// Counts toward `reconnect_attempts` exactly like a scheduled poll.
    pub fn reconnect_if_stale(&self) -> StaleCheck {
        self.inner
            .check_stale(None)
            .unwrap_or(StaleCheck::Fresh)
    }

    /// Whether the connection is currently stale.
    pub fn is_stale(&self) -> bool {
        let state = self.inner.state.lock();
        self.inner.stale_secs(&state, Instant::now()).is_some()
    }

    /// Consecutive stale polls since the last connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.state.lock().reconnect_attempts
    }

    /// The tuning this monitor runs with.
    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.inner.state.lock();
        MonitorSnapshot {
            started_at: state.started_at,
            stopped_at: state.stopped_at,
            pinged_at: state.pinged_at,
            disconnected_at: state.disconnected_at,
            reconnect_attempts: state.reconnect_attempts,
            poll_armed: state.poll_timer.is_some(),
            foreground_subscribed: state.foreground_subscription.is_some(),
        }
    }
}

impl std::fmt::Debug for ConnectionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ConnectionMonitor")
            .field("running", &self.is_running())
            .field("reconnect_attempts", &snapshot.reconnect_attempts)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::foreground::{AppState, AppStateObserver};

    #[derive(Default)]
    struct FakeConnection {
        reopens: AtomicU32,
        closed: AtomicBool,
    }

    impl FakeConnection {
        fn reopens(&self) -> u32 {
            self.reopens.load(Ordering::SeqCst)
        }
    }

    impl Connection for FakeConnection {
        fn reopen(&self) {
            let _ = self.reopens.fetch_add(1, Ordering::SeqCst);
        }

        fn is_open(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        conn: Arc<FakeConnection>,
        sink: RecordingSink,
        observer: Arc<AppStateObserver>,
        monitor: ConnectionMonitor,
    }

    fn harness() -> Harness {
        let conn = Arc::new(FakeConnection::default());
        let sink = RecordingSink::new();
        let observer = Arc::new(AppStateObserver::new(AppState::Active));
        let monitor = ConnectionMonitor::builder(conn.clone())
            .sink(Arc::new(sink.clone()))
            .foreground(observer.clone())
            .config(MonitorConfig {
                jitter_seed: Some(7),
                ..MonitorConfig::default()
            })
            .build();
        Harness {
            conn,
            sink,
            observer,
            monitor,
        }
    }

    async fn advance(d: Duration) {
        tokio::time::advance(d).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn new_monitor_is_stopped_and_stale() {
        let h = harness();
        assert!(!h.monitor.is_running());
        assert!(h.monitor.is_stale());
        assert_eq!(h.monitor.reconnect_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_arms_timer_and_subscribes() {
        let h = harness();
        h.monitor.start();

        let snap = h.monitor.snapshot();
        assert!(h.monitor.is_running());
        assert!(snap.poll_armed);
        assert!(snap.foreground_subscribed);
        assert!(snap.started_at.is_some());
        assert!(snap.stopped_at.is_none());
        assert_eq!(h.observer.listener_count(), 1);
        assert!(h.sink.contains("ConnectionMonitor started. pollInterval = "));
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_is_idempotent() {
        let h = harness();
        h.monitor.start();
        let first = h.monitor.snapshot();
        h.monitor.start();

        assert_eq!(h.monitor.snapshot(), first);
        assert_eq!(h.observer.listener_count(), 1);
        assert_eq!(h.sink.count_matching("started"), 1);
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_releases_everything_and_is_idempotent() {
        let h = harness();
        h.monitor.start();
        h.monitor.stop();
        h.monitor.stop();

        let snap = h.monitor.snapshot();
        assert!(!h.monitor.is_running());
        assert!(!snap.poll_armed);
        assert!(!snap.foreground_subscribed);
        assert!(snap.stopped_at.is_some());
        assert_eq!(h.observer.listener_count(), 0);
        assert_eq!(h.sink.count_matching("stopped"), 1);
    }

    #[test]
    fn stop_before_start_is_noop() {
        let h = harness();
        h.monitor.stop();
        assert!(h.sink.lines().is_empty());
        assert!(h.monitor.snapshot().stopped_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn record_ping_keeps_connection_fresh() {
        let h = harness();
        h.monitor.start();
        advance(Duration::from_secs(5)).await;
        h.monitor.record_ping();
        advance(Duration::from_secs(5)).await;

        assert!(!h.monitor.is_stale());
        assert_eq!(h.monitor.reconnect_if_stale(), StaleCheck::Fresh);
        assert_eq!(h.monitor.reconnect_attempts(), 0);
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn staleness_boundary_is_strict() {
        let h = harness();
        h.monitor.record_ping();
        advance(Duration::from_secs(6)).await;
        assert!(!h.monitor.is_stale());

        advance(Duration::from_micros(100)).await;
        assert!(h.monitor.is_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn started_at_stands_in_for_missing_ping() {
        let h = harness();
        h.monitor.start();
        advance(Duration::from_secs(3)).await;
        assert!(!h.monitor.is_stale());
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stale_check_reopens_and_counts() {
        let h = harness();
        h.monitor.record_ping();
        advance(Duration::from_secs(10)).await;

        assert_eq!(h.monitor.reconnect_if_stale(), StaleCheck::Reopened);
        assert_eq!(h.conn.reopens(), 1);
        assert_eq!(h.monitor.reconnect_attempts(), 1);
        assert!(h.sink.contains("reconnectAttempts = 0"));
        assert!(h.sink.contains("ConnectionMonitor reopening"));
    }

    #[tokio::test(start_paused = true)]
    async fn recent_disconnect_suppresses_reopen() {
        let h = harness();
        h.monitor.record_ping();
        advance(Duration::from_secs(8)).await;
        h.monitor.record_disconnect();
        advance(Duration::from_secs(2)).await;

        let outcome = h.monitor.reconnect_if_stale();
        assert!(matches!(
            outcome,
            StaleCheck::SkippedRecentDisconnect { disconnected_secs } if (disconnected_secs - 2.0).abs() < 1e-9
        ));
        assert_eq!(h.conn.reopens(), 0);
        assert_eq!(h.monitor.reconnect_attempts(), 1);
        assert!(h.sink.contains("skipping reopening recent disconnect"));
    }

    #[tokio::test(start_paused = true)]
    async fn old_disconnect_does_not_suppress() {
        let h = harness();
        h.monitor.record_disconnect();
        advance(Duration::from_secs(7)).await;

        assert_eq!(h.monitor.reconnect_if_stale(), StaleCheck::Reopened);
        assert_eq!(h.conn.reopens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn record_connect_resets_backoff() {
        let h = harness();
        h.monitor.record_disconnect();
        let _ = h.monitor.reconnect_if_stale();
        let _ = h.monitor.reconnect_if_stale();
        assert_eq!(h.monitor.reconnect_attempts(), 2);
        assert!(h.monitor.snapshot().disconnected_at.is_some());

        h.monitor.record_connect();
        let snap = h.monitor.snapshot();
        assert_eq!(snap.reconnect_attempts, 0);
        assert!(snap.disconnected_at.is_none());
        assert!(h.sink.contains("recorded connect"));
    }

    #[tokio::test(start_paused = true)]
    async fn foreground_with_closed_connection_reopens() {
        let h = harness();
        h.monitor.start();
        h.monitor.record_ping();
        h.conn.closed.store(true, Ordering::SeqCst);

        let _ = h.observer.set_state(AppState::Background);
        let _ = h.observer.set_state(AppState::Active);
        advance(Duration::from_millis(199)).await;
        assert_eq!(h.conn.reopens(), 0);

        advance(Duration::from_millis(1)).await;
        assert_eq!(h.conn.reopens(), 1);
        assert!(h.sink.contains("open = false"));
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn foreground_with_healthy_connection_does_nothing() {
        let h = harness();
        h.monitor.start();
        h.monitor.record_ping();

        let _ = h.observer.set_state(AppState::Background);
        let _ = h.observer.set_state(AppState::Active);
        advance(Duration::from_millis(500)).await;
        assert_eq!(h.conn.reopens(), 0);
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn background_transition_schedules_nothing() {
        let h = harness();
        h.monitor.start();
        h.conn.closed.store(true, Ordering::SeqCst);

        let _ = h.observer.set_state(AppState::Background);
        assert!(h.monitor.inner.state.lock().recheck_timer.is_none());
        advance(Duration::from_secs(1)).await;
        assert_eq!(h.conn.reopens(), 0);
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_foreground_recheck() {
        let h = harness();
        h.monitor.start();
        h.conn.closed.store(true, Ordering::SeqCst);
        let _ = h.observer.set_state(AppState::Background);
        let _ = h.observer.set_state(AppState::Active);
        h.monitor.stop();

        advance(Duration::from_secs(1)).await;
        assert_eq!(h.conn.reopens(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_epoch_callbacks_are_ignored() {
        let h = harness();
        h.monitor.start();
        let old_epoch = h.monitor.inner.state.lock().epoch;
        h.monitor.stop();
        h.monitor.start();
        advance(Duration::from_secs(20)).await;
        let attempts = h.monitor.reconnect_attempts();

        // a callback from the previous run must not touch state
        h.monitor.inner.on_poll(old_epoch);
        h.monitor.inner.recheck_after_foreground(old_epoch);
        assert_eq!(h.monitor.reconnect_attempts(), attempts);
        h.monitor.stop();
    }

    #[test]
    fn start_outside_runtime_stays_stopped() {
        let h = harness();
        h.monitor.start();

        let snap = h.monitor.snapshot();
        assert!(!h.monitor.is_running());
        assert!(snap.started_at.is_none());
        assert!(!snap.poll_armed);
        assert!(!snap.foreground_subscribed);
        assert_eq!(h.observer.listener_count(), 0);
        assert!(h.sink.contains("cannot start without a Tokio runtime"));

        h.monitor.stop();
        assert!(!h.sink.contains("ConnectionMonitor stopped"));
    }

    #[test]
    fn start_succeeds_once_a_runtime_is_available() {
        let h = harness();
        h.monitor.start();
        assert!(!h.monitor.is_running());

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            h.monitor.start();
            assert!(h.monitor.is_running());
            assert!(h.monitor.snapshot().poll_armed);
            h.monitor.stop();
        });
        assert!(h.sink.contains("ConnectionMonitor started"));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_for_stopped_run_neither_counts_nor_reopens() {
        let h = harness();
        h.monitor.start();
        let epoch = h.monitor.inner.state.lock().epoch;
        h.monitor.stop();
        advance(Duration::from_secs(30)).await;

        // a poll that woke before stop() and runs after it
        assert!(h.monitor.inner.check_stale(Some(epoch)).is_none());
        assert_eq!(h.monitor.reconnect_attempts(), 0);
        assert_eq!(h.conn.reopens(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_for_current_run_counts_and_reopens() {
        let h = harness();
        h.monitor.start();
        let epoch = h.monitor.inner.state.lock().epoch;
        assert_eq!(
            h.monitor.inner.check_stale(Some(epoch)),
            Some(StaleCheck::Fresh)
        );

        advance(Duration::from_secs(10)).await;
        let (attempts, reopens) = (h.monitor.reconnect_attempts(), h.conn.reopens());
        assert_eq!(
            h.monitor.inner.check_stale(Some(epoch)),
            Some(StaleCheck::Reopened)
        );
        assert_eq!(h.monitor.reconnect_attempts(), attempts + 1);
        assert_eq!(h.conn.reopens(), reopens + 1);
        h.monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_monitor_releases_subscription() {
        let h = harness();
        h.monitor.start();
        assert_eq!(h.observer.listener_count(), 1);
        drop(h.monitor);
        assert_eq!(h.observer.listener_count(), 0);
    }

    #[test]
    fn seeded_monitors_draw_identical_intervals() {
        let a = harness();
        let b = harness();
        let ia: Vec<_> = (0..5).map(|n| a.monitor.inner.next_interval(n)).collect();
        let ib: Vec<_> = (0..5).map(|n| b.monitor.inner.next_interval(n)).collect();
        assert_eq!(ia, ib);
    }

    #[test]
    fn debug_output_names_type() {
        let h = harness();
        let debug = format!("{:?}", h.monitor);
        assert!(debug.contains("ConnectionMonitor"));
        assert!(debug.contains("running: false"));
    }
}
