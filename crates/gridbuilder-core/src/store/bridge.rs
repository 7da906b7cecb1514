//! Re-render bridge between a [`Store`] and UI elements.
//!
//! Elements that read a key while rendering are remembered as readers of that
//! key. When the key changes, connected readers get `request_update`. Readers
//! that were dropped or detached are pruned, at most once per cleanup interval.

use super::observable::{
    DisposeHandler, GetHandler, ResetHandler, SetHandler, Store, StoreState, Subscription, Unsubscribe,
};
use crate::config::DEFAULT_CLEANUP_INTERVAL_MS;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// A rendered UI element.
pub trait Element {
    /// Whether the element is still attached to the UI tree.
    fn is_connected(&self) -> bool;

    /// Schedule a re-render.
    fn request_update(&self);
}

struct BridgeInner<K> {
    readers: RefCell<HashMap<K, Vec<Weak<dyn Element>>>>,
    rendering: RefCell<Vec<Weak<dyn Element>>>,
    cleanup_interval: Duration,
    last_cleanup: Cell<Instant>,
    cleanup_pending: Cell<bool>,
}

fn same_element(a: &Weak<dyn Element>, b: &Weak<dyn Element>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}

fn is_live(element: &Weak<dyn Element>) -> bool {
    element.upgrade().is_some_and(|e| e.is_connected())
}

/// Tracks which elements read which keys.
pub struct UpdateBridge<K> {
    inner: Rc<BridgeInner<K>>,
}

impl<K> Clone for UpdateBridge<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: Clone + Eq + Hash + 'static> Default for UpdateBridge<K> {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CLEANUP_INTERVAL_MS))
    }
}

impl<K: Clone + Eq + Hash + 'static> UpdateBridge<K> {
    pub fn new(cleanup_interval: Duration) -> Self {
        Self {
            inner: Rc::new(BridgeInner {
                readers: RefCell::new(HashMap::new()),
                rendering: RefCell::new(Vec::new()),
                cleanup_interval,
                last_cleanup: Cell::new(Instant::now()),
                cleanup_pending: Cell::new(false),
            }),
        }
    }

    /// Attach the bridge to a store.
    pub fn attach<S>(&self, store: &Store<S>) -> Unsubscribe
    where
        S: StoreState<Key = K>,
    {
        store.use_subscriptions([self.subscription::<S::Value>()])
    }

    /// Handlers to register on a store.
    pub fn subscription<V: 'static>(&self) -> Subscription<K, V> {
        let on_get: GetHandler<K> = {
            let bridge = self.clone();
            Rc::new(move |key: &K| bridge.track_read(key))
        };
        let on_set: SetHandler<K, V> = {
            let bridge = self.clone();
            Rc::new(move |key: &K, _: &V, _: &V| {
                bridge.notify_readers(key);
                bridge.schedule_cleanup();
            })
        };
        let on_reset: ResetHandler = {
            let bridge = self.clone();
            Rc::new(move || bridge.notify_all())
        };
        let on_dispose: DisposeHandler = {
            let bridge = self.clone();
            Rc::new(move || bridge.inner.readers.borrow_mut().clear())
        };
        Subscription {
            get: Some(on_get),
            set: Some(on_set),
            reset: Some(on_reset),
            dispose: Some(on_dispose),
        }
    }

    /// Run `render` with `element` recorded as the reader of every key
    /// read from the store meanwhile. Calls may nest.
    pub fn render<R>(&self, element: &Rc<dyn Element>, render: impl FnOnce() -> R) -> R {
        self.inner.rendering.borrow_mut().push(Rc::downgrade(element));
        let result = render();
        self.inner.rendering.borrow_mut().pop();
        result
    }

    fn track_read(&self, key: &K) {
        let Some(current) = self.inner.rendering.borrow().last().cloned() else {
            return;
        };
        let mut readers = self.inner.readers.borrow_mut();
        let list = readers.entry(key.clone()).or_default();
        if !list.iter().any(|r| same_element(r, &current)) {
            list.push(current);
        }
    }

    fn live_readers(&self, key: &K) -> Vec<Rc<dyn Element>> {
        self.inner
            .readers
            .borrow()
            .get(key)
            .map(|list| list.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    fn notify_readers(&self, key: &K) {
        for element in self.live_readers(key) {
            if element.is_connected() {
                element.request_update();
            }
        }
    }

    fn notify_all(&self) {
        let keys: Vec<K> = self.inner.readers.borrow().keys().cloned().collect();
        let mut notified: Vec<Rc<dyn Element>> = Vec::new();
        for key in keys {
            for element in self.live_readers(&key) {
                if notified.iter().any(|e| std::ptr::addr_eq(Rc::as_ptr(e), Rc::as_ptr(&element))) {
                    continue;
                }
                if element.is_connected() {
                    element.request_update();
                }
                notified.push(element);
            }
        }
    }

    fn schedule_cleanup(&self) {
        self.inner.cleanup_pending.set(true);
        self.tick();
    }

    /// Run a pending cleanup if the interval has elapsed since the last one.
    /// Returns the number of readers pruned.
    pub fn tick(&self) -> usize {
        if !self.inner.cleanup_pending.get()
            || self.inner.last_cleanup.get().elapsed() < self.inner.cleanup_interval
        {
            return 0;
        }
        self.sweep()
    }

    /// Prune dropped and detached readers now.
    pub fn sweep(&self) -> usize {
        let mut pruned = 0;
        let mut readers = self.inner.readers.borrow_mut();
        for list in readers.values_mut() {
            let before = list.len();
            list.retain(is_live);
            pruned += before - list.len();
        }
        readers.retain(|_, list| !list.is_empty());
        self.inner.cleanup_pending.set(false);
        self.inner.last_cleanup.set(Instant::now());
        if pruned > 0 {
            log::debug!("update bridge pruned {} detached readers", pruned);
        }
        pruned
    }

    /// Number of readers recorded for `key`, live or not.
    pub fn reader_count(&self, key: &K) -> usize {
        self.inner.readers.borrow().get(key).map_or(0, Vec::len)
    }
}
