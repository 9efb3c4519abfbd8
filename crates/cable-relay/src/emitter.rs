//! Named-event fan-out.
//!
//! An [`EventEmitter`] maps event names to ordered listener lists. Listeners
//! run in subscription order on the emitting thread, outside the internal
//! lock, so a listener may add or remove listeners (including itself) while
//! an emit is in flight. Such changes take effect from the next emit.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

/// Identifies a registered listener for [`EventEmitter::off`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: ListenerId,
    once: bool,
    listener: Listener<T>,
}

/// Map from event name to an ordered list of listeners.
pub struct EventEmitter<T> {
    events: Mutex<HashMap<String, Vec<Entry<T>>>>,
    next_id: AtomicU64,
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> EventEmitter<T> {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every emit of `event`.
    pub fn on(&self, event: &str, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        self.add(event, false, Arc::new(listener))
    }

    /// Register `listener` for the next emit of `event` only.
    pub fn once(&self, event: &str, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        self.add(event, true, Arc::new(listener))
    }

    fn add(&self, event: &str, once: bool, listener: Listener<T>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.events
            .lock()
            .entry(event.to_owned())
            .or_default()
            .push(Entry { id, once, listener });
        id
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut events = self.events.lock();
        let mut found = false;
        events.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            found |= entries.len() < before;
            !entries.is_empty()
        });
        found
    }

    /// Call every listener for `event` with `payload`, in registration order.
    ///
    /// Returns `true` if at least one listener ran.
    pub fn emit(&self, event: &str, payload: &T) -> bool {
        let listeners: Vec<Listener<T>> = {
            let mut events = self.events.lock();
            let Some(entries) = events.get_mut(event) else {
                trace!(event, "emit with no listeners");
                return false;
            };
            let listeners = entries.iter().map(|e| Arc::clone(&e.listener)).collect();
            entries.retain(|e| !e.once);
            if entries.is_empty() {
                let _ = events.remove(event);
            }
            listeners
        };

        for listener in &listeners {
            listener(payload);
        }
        !listeners.is_empty()
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.events.lock().get(event).map_or(0, Vec::len)
    }

    /// Names of events with at least one listener, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.events.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove every listener for `event`, or for all events when `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        let mut events = self.events.lock();
        match event {
            Some(name) => {
                let _ = events.remove(name);
            }
            None => events.clear(),
        }
    }
}

impl<T> std::fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.event_names())
            .finish_non_exhaustive()
    }
}
