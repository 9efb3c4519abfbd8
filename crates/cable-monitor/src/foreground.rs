//! Host foreground/background lifecycle integration.
//!
//! Two observers implement [`ForegroundObserver`]:
//!
//! - [`AppStateObserver`]: driven by the host reporting [`AppState`]
//!   changes (e.g. from a mobile or desktop shell's lifecycle callbacks)
//! - [`InertObserver`]: for hosts with no such facility; always foreground,
//!   never notifies
//!
//! [`detect_foreground_observer`] picks one at construction time. The
//! monitor treats both identically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

/// Callback invoked on every foreground-state change.
pub type ForegroundCallback = Arc<dyn Fn() + Send + Sync>;

/// Source of foreground/background transitions.
pub trait ForegroundObserver: Send + Sync {
    /// Whether the application is currently in the foreground (active).
    fn is_foreground(&self) -> bool;

    /// Register `on_change`; it stays registered until the returned
    /// subscription is released.
    fn subscribe(&self, on_change: ForegroundCallback) -> ForegroundSubscription;
}

/// A live observer registration. Released by [`unsubscribe`] or on drop.
///
/// [`unsubscribe`]: ForegroundSubscription::unsubscribe
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct ForegroundSubscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ForegroundSubscription {
    /// Subscription that runs `release` when released.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Subscription with nothing to release.
    pub fn inert() -> Self {
        Self { release: None }
    }

    /// Release the registration.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ForegroundSubscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for ForegroundSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForegroundSubscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Host application lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Visible and receiving input.
    Active,
    /// Visible but not receiving input (e.g. during a system overlay).
    Inactive,
    /// Not visible.
    Background,
}

impl AppState {
    /// Lowercase name, for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Background => "background",
        }
    }
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type ListenerList = Mutex<Vec<(u64, ForegroundCallback)>>;

/// Observer fed by the host's lifecycle notifications.
///
/// Listeners run in subscription order on the thread that calls
/// [`set_state`](Self::set_state), outside the internal lock.
pub struct AppStateObserver {
    state: Mutex<AppState>,
    listeners: Arc<ListenerList>,
    next_id: AtomicU64,
}

impl AppStateObserver {
    /// Create an observer starting in `initial`.
    pub fn new(initial: AppState) -> Self {
        Self {
            state: Mutex::new(initial),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// The last state reported by the host.
    pub fn current_state(&self) -> AppState {
        *self.state.lock()
    }

    /// Report a lifecycle change. Listeners are notified only when the state
    /// actually changes; returns whether it did.
    pub fn set_state(&self, next: AppState) -> bool {
        let previous = std::mem::replace(&mut *self.state.lock(), next);
        if previous == next {
            return false;
        }
        debug!(from = %previous, to = %next, "app state changed");

        let listeners: Vec<ForegroundCallback> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for listener in listeners {
            listener();
        }
        true
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl Default for AppStateObserver {
    fn default() -> Self {
        Self::new(AppState::Active)
    }
}

impl ForegroundObserver for AppStateObserver {
    fn is_foreground(&self) -> bool {
        self.current_state() == AppState::Active
    }

    fn subscribe(&self, on_change: ForegroundCallback) -> ForegroundSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, on_change));

        let listeners: Weak<ListenerList> = Arc::downgrade(&self.listeners);
        ForegroundSubscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().retain(|(lid, _)| *lid != id);
            }
        })
    }
}

impl std::fmt::Debug for AppStateObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStateObserver")
            .field("state", &self.current_state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Fallback observer: always foreground, never notifies.
#[derive(Clone, Copy, Debug, Default)]
pub struct InertObserver;

impl ForegroundObserver for InertObserver {
    fn is_foreground(&self) -> bool {
        true
    }

    fn subscribe(&self, _on_change: ForegroundCallback) -> ForegroundSubscription {
        ForegroundSubscription::inert()
    }
}

/// Use the host's observer when one is available, else the inert fallback.
pub fn detect_foreground_observer(
    platform: Option<Arc<AppStateObserver>>,
) -> Arc<dyn ForegroundObserver> {
    match platform {
        Some(observer) => observer,
        None => {
            debug!("no platform lifecycle observer, foreground re-checks disabled");
            Arc::new(InertObserver)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    fn counting_callback() -> (Arc<AtomicU32>, ForegroundCallback) {
        let count = Arc::new(AtomicU32::new(0));
        let count2 = Arc::clone(&count);
        let cb: ForegroundCallback = Arc::new(move || {
            let _ = count2.fetch_add(1, Ordering::SeqCst);
        });
        (count, cb)
    }

    #[test]
    fn notifies_only_on_change() {
        let observer = AppStateObserver::new(AppState::Active);
        let (count, cb) = counting_callback();
        let _sub = observer.subscribe(cb);

        assert!(!observer.set_state(AppState::Active));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(observer.set_state(AppState::Background));
        assert!(observer.set_state(AppState::Active));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn is_foreground_tracks_active() {
        let observer = AppStateObserver::new(AppState::Background);
        assert!(!observer.is_foreground());
        let _ = observer.set_state(AppState::Inactive);
        assert!(!observer.is_foreground());
        let _ = observer.set_state(AppState::Active);
        assert!(observer.is_foreground());
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let observer = AppStateObserver::default();
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                observer.subscribe(Arc::new(move || order.lock().push(i)))
            })
            .collect();

        let _ = observer.set_state(AppState::Background);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let observer = AppStateObserver::default();
        let (count, cb) = counting_callback();
        let sub = observer.subscribe(cb);
        assert_eq!(observer.listener_count(), 1);

        sub.unsubscribe();
        assert_eq!(observer.listener_count(), 0);
        let _ = observer.set_state(AppState::Background);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let observer = AppStateObserver::default();
        let (_count, cb) = counting_callback();
        drop(observer.subscribe(cb));
        assert_eq!(observer.listener_count(), 0);
    }

    #[test]
    fn subscription_outliving_observer_is_harmless() {
        let observer = AppStateObserver::default();
        let (_count, cb) = counting_callback();
        let sub = observer.subscribe(cb);
        drop(observer);
        sub.unsubscribe();
    }

    #[test]
    fn listener_may_unsubscribe_reentrantly() {
        let observer = Arc::new(AppStateObserver::default());
        let slot: Arc<Mutex<Option<ForegroundSubscription>>> = Arc::new(Mutex::new(None));
        let slot2 = Arc::clone(&slot);
        let sub = observer.subscribe(Arc::new(move || {
            if let Some(sub) = slot2.lock().take() {
                sub.unsubscribe();
            }
        }));
        *slot.lock() = Some(sub);

        let _ = observer.set_state(AppState::Background);
        assert_eq!(observer.listener_count(), 0);
    }

    #[test]
    fn inert_observer_is_foreground_and_silent() {
        let observer = InertObserver;
        assert!(observer.is_foreground());
        let (count, cb) = counting_callback();
        observer.subscribe(cb).unsubscribe();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn detect_prefers_platform_observer() {
        let platform = Arc::new(AppStateObserver::new(AppState::Background));
        let observer = detect_foreground_observer(Some(Arc::clone(&platform)));
        assert!(!observer.is_foreground());

        let fallback = detect_foreground_observer(None);
        assert!(fallback.is_foreground());
    }

    #[test]
    fn app_state_display() {
        assert_eq!(AppState::Active.to_string(), "active");
        assert_eq!(AppState::Background.as_str(), "background");
    }
}
