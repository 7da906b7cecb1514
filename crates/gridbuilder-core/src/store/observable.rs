//! Observable property store.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

/// A property bag the store can observe, one value per key.
pub trait StoreState: Clone + 'static {
    type Key: Clone + Eq + Hash + std::fmt::Debug + 'static;
    type Value: Clone + 'static;

    /// Keys currently present.
    fn keys(&self) -> Vec<Self::Key>;

    /// Current value of `key`. Unknown keys map to the type's "absent" value.
    fn get(&self, key: &Self::Key) -> Self::Value;

    fn set(&mut self, key: &Self::Key, value: Self::Value);
}

/// Untyped bags: absent keys read as `None`, writing `None` removes the key.
impl<V: Clone + 'static> StoreState for HashMap<String, V> {
    type Key = String;
    type Value = Option<V>;

    fn keys(&self) -> Vec<String> {
        HashMap::keys(self).cloned().collect()
    }

    fn get(&self, key: &String) -> Option<V> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &String, value: Option<V>) {
        match value {
            Some(value) => {
                self.insert(key.clone(), value);
            }
            None => {
                self.remove(key);
            }
        }
    }
}

/// Called with the key being read.
pub type GetHandler<K> = Rc<dyn Fn(&K)>;
/// Called with `(key, new_value, old_value)`.
pub type SetHandler<K, V> = Rc<dyn Fn(&K, &V, &V)>;
pub type ResetHandler = Rc<dyn Fn()>;
pub type DisposeHandler = Rc<dyn Fn()>;
/// Per-key change callback used by [`Store::on_change`].
pub type ChangeCallback<V> = Rc<dyn Fn(&V)>;

/// Decides whether a write is a change: `(new, old, key) -> bool`.
pub type ShouldUpdate<K, V> = Box<dyn Fn(&V, &V, &K) -> bool>;

/// One lifecycle handler, tagged by the event it listens to.
pub enum Handler<K, V> {
    Get(GetHandler<K>),
    Set(SetHandler<K, V>),
    Reset(ResetHandler),
    Dispose(DisposeHandler),
}

/// A bundle of handlers registered together with [`Store::use_subscriptions`].
pub struct Subscription<K, V> {
    pub get: Option<GetHandler<K>>,
    pub set: Option<SetHandler<K, V>>,
    pub reset: Option<ResetHandler>,
    pub dispose: Option<DisposeHandler>,
}

impl<K, V> Default for Subscription<K, V> {
    fn default() -> Self {
        Self {
            get: None,
            set: None,
            reset: None,
            dispose: None,
        }
    }
}

impl<K, V> Subscription<K, V> {
    fn into_handlers(self) -> Vec<Handler<K, V>> {
        let mut handlers = Vec::new();
        if let Some(h) = self.get {
            handlers.push(Handler::Get(h));
        }
        if let Some(h) = self.set {
            handlers.push(Handler::Set(h));
        }
        if let Some(h) = self.reset {
            handlers.push(Handler::Reset(h));
        }
        if let Some(h) = self.dispose {
            handlers.push(Handler::Dispose(h));
        }
        handlers
    }
}

/// Identifier of one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Removes the handlers it was created for. Dropping it keeps them registered.
pub struct Unsubscribe {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Unsubscribe {
    fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// Combine several handles into one.
    pub fn merge(handles: Vec<Unsubscribe>) -> Self {
        Self::new(move || {
            for handle in handles {
                handle.unsubscribe();
            }
        })
    }

    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

struct Listeners<K, V> {
    get: Vec<(ListenerId, GetHandler<K>)>,
    set: Vec<(ListenerId, SetHandler<K, V>)>,
    reset: Vec<(ListenerId, ResetHandler)>,
    dispose: Vec<(ListenerId, DisposeHandler)>,
}

impl<K, V> Listeners<K, V> {
    fn remove(&mut self, ids: &[ListenerId]) {
        self.get.retain(|(id, _)| !ids.contains(id));
        self.set.retain(|(id, _)| !ids.contains(id));
        self.reset.retain(|(id, _)| !ids.contains(id));
        self.dispose.retain(|(id, _)| !ids.contains(id));
    }
}

/// An `on_change` registration, kept so the callback can be removed by reference.
struct ChangeEntry<V> {
    callback: ChangeCallback<V>,
    listeners: Vec<ListenerId>,
}

struct Inner<S: StoreState> {
    state: RefCell<S>,
    default: Box<dyn Fn() -> S>,
    should_update: ShouldUpdate<S::Key, S::Value>,
    listeners: RefCell<Listeners<S::Key, S::Value>>,
    changes: RefCell<HashMap<S::Key, Vec<ChangeEntry<S::Value>>>>,
    next_id: Cell<u64>,
}

impl<S: StoreState> Inner<S> {
    fn remove_listeners(&self, ids: &[ListenerId]) {
        self.listeners.borrow_mut().remove(ids);
        let mut changes = self.changes.borrow_mut();
        for entries in changes.values_mut() {
            entries.retain(|entry| !entry.listeners.iter().any(|id| ids.contains(id)));
        }
        changes.retain(|_, entries| !entries.is_empty());
    }
}

/// A shared, observable property store.
///
/// Handlers run synchronously in registration order, on the caller's stack.
/// No borrow is held while a handler runs, so handlers may read and write the
/// store again.
pub struct Store<S: StoreState> {
    inner: Rc<Inner<S>>,
}

impl<S: StoreState> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> Store<S>
where
    S: StoreState,
    S::Value: PartialEq,
{
    /// Create a store whose initial and post-reset state comes from `default`.
    /// Writes are changes when `new != old`.
    pub fn new(default: impl Fn() -> S + 'static) -> Self {
        Self::with_should_update(default, |new, old, _| new != old)
    }
}

impl<S: StoreState> Store<S> {
    /// Create a store with a custom change predicate.
    pub fn with_should_update(
        default: impl Fn() -> S + 'static,
        should_update: impl Fn(&S::Value, &S::Value, &S::Key) -> bool + 'static,
    ) -> Self {
        let state = default();
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                default: Box::new(default),
                should_update: Box::new(should_update),
                listeners: RefCell::new(Listeners {
                    get: Vec::new(),
                    set: Vec::new(),
                    reset: Vec::new(),
                    dispose: Vec::new(),
                }),
                changes: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    fn next_listener_id(&self) -> ListenerId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        ListenerId(id)
    }

    fn unsubscribe_for(&self, ids: Vec<ListenerId>) -> Unsubscribe {
        let weak: Weak<Inner<S>> = Rc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove_listeners(&ids);
            }
        })
    }

    // --- Reads and writes ---

    /// Read a value. Get handlers are notified first.
    pub fn get(&self, key: &S::Key) -> S::Value {
        let handlers: Vec<GetHandler<S::Key>> = self
            .inner
            .listeners
            .borrow()
            .get
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler(key);
        }
        self.peek(key)
    }

    /// Read a value without notifying get handlers.
    pub fn peek(&self, key: &S::Key) -> S::Value {
        self.inner.state.borrow().get(key)
    }

    /// Borrow the whole state without notifying anyone.
    ///
    /// The state stays borrowed while `f` runs: `f` may read the store but
    /// must not write to it. Take a [`snapshot`](Self::snapshot) to edit
    /// based on what was read.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// A copy of the whole state.
    pub fn snapshot(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// Write a value. Returns false, and notifies nobody, when the change
    /// predicate says the value is unchanged.
    pub fn set(&self, key: S::Key, value: S::Value) -> bool {
        let old = self.peek(&key);
        if !(self.inner.should_update)(&value, &old, &key) {
            return false;
        }
        self.inner.state.borrow_mut().set(&key, value.clone());
        self.emit_set(&key, &value, &old);
        true
    }

    /// Apply `edit` to a copy of the state, commit it, then fire set handlers
    /// for every key whose value changed.
    pub fn update<R>(&self, edit: impl FnOnce(&mut S) -> R) -> R {
        let mut draft = self.snapshot();
        let result = edit(&mut draft);

        let before = self.inner.state.replace(draft);
        let changed: Vec<(S::Key, S::Value, S::Value)> = {
            let after = self.inner.state.borrow();
            let mut keys = before.keys();
            for key in after.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            keys.into_iter()
                .filter_map(|key| {
                    let old = before.get(&key);
                    let new = after.get(&key);
                    (self.inner.should_update)(&new, &old, &key).then_some((key, new, old))
                })
                .collect()
        };

        for (key, new, old) in &changed {
            self.emit_set(key, new, old);
        }
        result
    }

    /// Re-fire set handlers for `key` with old and new both equal to the
    /// current value.
    pub fn force_update(&self, key: &S::Key) {
        let value = self.peek(key);
        self.emit_set(key, &value, &value);
    }

    /// Replace the state with a fresh default and notify reset handlers.
    pub fn reset(&self) {
        let fresh = (self.inner.default)();
        self.inner.state.replace(fresh);
        let handlers: Vec<ResetHandler> = self
            .inner
            .listeners
            .borrow()
            .reset
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    /// Notify dispose handlers, then reset. Dispose handlers still see the
    /// state as it was.
    pub fn dispose(&self) {
        let handlers: Vec<DisposeHandler> = self
            .inner
            .listeners
            .borrow()
            .dispose
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
        self.reset();
    }

    fn emit_set(&self, key: &S::Key, new: &S::Value, old: &S::Value) {
        let handlers: Vec<SetHandler<S::Key, S::Value>> = self
            .inner
            .listeners
            .borrow()
            .set
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler(key, new, old);
        }
    }

    // --- Subscriptions ---

    /// Register one handler.
    pub fn on(&self, handler: Handler<S::Key, S::Value>) -> Unsubscribe {
        let id = self.register(handler);
        self.unsubscribe_for(vec![id])
    }

    fn register(&self, handler: Handler<S::Key, S::Value>) -> ListenerId {
        let id = self.next_listener_id();
        let mut listeners = self.inner.listeners.borrow_mut();
        match handler {
            Handler::Get(h) => listeners.get.push((id, h)),
            Handler::Set(h) => listeners.set.push((id, h)),
            Handler::Reset(h) => listeners.reset.push((id, h)),
            Handler::Dispose(h) => listeners.dispose.push((id, h)),
        }
        id
    }

    /// Register several handler bundles at once.
    pub fn use_subscriptions(
        &self,
        subscriptions: impl IntoIterator<Item = Subscription<S::Key, S::Value>>,
    ) -> Unsubscribe {
        let ids = subscriptions
            .into_iter()
            .flat_map(Subscription::into_handlers)
            .map(|handler| self.register(handler))
            .collect();
        self.unsubscribe_for(ids)
    }

    /// Call `callback` with the new value whenever `key` changes, and with
    /// the post-reset value whenever the store resets.
    pub fn on_change(&self, key: S::Key, callback: ChangeCallback<S::Value>) -> Unsubscribe {
        let on_set: SetHandler<S::Key, S::Value> = {
            let key = key.clone();
            let callback = Rc::clone(&callback);
            Rc::new(move |changed: &S::Key, new: &S::Value, _old: &S::Value| {
                if *changed == key {
                    callback(new);
                }
            })
        };
        let on_reset: ResetHandler = {
            let key = key.clone();
            let callback = Rc::clone(&callback);
            let weak = Rc::downgrade(&self.inner);
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let value = inner.state.borrow().get(&key);
                    callback(&value);
                }
            })
        };

        let ids = vec![self.register(Handler::Set(on_set)), self.register(Handler::Reset(on_reset))];
        self.inner
            .changes
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(ChangeEntry {
                callback,
                listeners: ids.clone(),
            });
        self.unsubscribe_for(ids)
    }

    /// Remove every `on_change` registration of `callback` for `key`.
    /// Returns false if there was none.
    pub fn remove_listener(&self, key: &S::Key, callback: &ChangeCallback<S::Value>) -> bool {
        let ids: Vec<ListenerId> = match self.inner.changes.borrow().get(key) {
            Some(entries) => entries
                .iter()
                .filter(|entry| std::ptr::addr_eq(Rc::as_ptr(&entry.callback), Rc::as_ptr(callback)))
                .flat_map(|entry| entry.listeners.iter().copied())
                .collect(),
            None => Vec::new(),
        };
        if ids.is_empty() {
            return false;
        }
        self.inner.remove_listeners(&ids);
        true
    }

    /// Number of registered handlers of every kind.
    pub fn listener_count(&self) -> usize {
        let listeners = self.inner.listeners.borrow();
        listeners.get.len() + listeners.set.len() + listeners.reset.len() + listeners.dispose.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Bag = HashMap<String, i32>;

    fn bag_store() -> Store<Bag> {
        Store::new(|| {
            let mut bag = Bag::new();
            bag.insert("count".to_string(), 0);
            bag
        })
    }

    fn key(k: &str) -> String {
        k.to_string()
    }

    fn recorder() -> (Rc<RefCell<Vec<Option<i32>>>>, ChangeCallback<Option<i32>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let callback: ChangeCallback<Option<i32>> = Rc::new(move |v: &Option<i32>| sink.borrow_mut().push(*v));
        (seen, callback)
    }

    #[test]
    fn test_set_then_get() {
        let store = bag_store();
        assert!(store.set(key("count"), Some(3)));
        assert_eq!(store.get(&key("count")), Some(3));
        assert_eq!(store.get(&key("unknown")), None);
    }

    #[test]
    fn test_equal_set_is_silent() {
        let store = bag_store();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let on_set: SetHandler<String, Option<i32>> = Rc::new(move |_, _, _| counter.set(counter.get() + 1));
        store.on(Handler::Set(on_set));

        assert!(store.set(key("count"), Some(7)));
        assert!(!store.set(key("count"), Some(7)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_set_handler_receives_old_and_new() {
        let store = bag_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.on(Handler::Set(Rc::new(move |k: &String, new: &Option<i32>, old: &Option<i32>| {
            sink.borrow_mut().push((k.clone(), *new, *old));
        })));

        store.set(key("count"), Some(1));
        store.set(key("fresh"), Some(5));
        assert_eq!(
            *seen.borrow(),
            vec![(key("count"), Some(1), Some(0)), (key("fresh"), Some(5), None)]
        );
    }

    #[test]
    fn test_get_handlers_fire_before_read() {
        let store = bag_store();
        let reads = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reads);
        let on_get: GetHandler<String> = Rc::new(move |k: &String| sink.borrow_mut().push(k.clone()));
        store.on(Handler::Get(on_get));

        store.get(&key("count"));
        store.peek(&key("count"));
        assert_eq!(*reads.borrow(), vec![key("count")]);
    }

    #[test]
    fn test_custom_should_update() {
        // Only accept increases.
        let store = Store::<Bag>::with_should_update(Bag::new, |new: &Option<i32>, old: &Option<i32>, _: &String| {
            new > old
        });
        assert!(store.set(key("n"), Some(2)));
        assert!(!store.set(key("n"), Some(1)));
        assert_eq!(store.peek(&key("n")), Some(2));
    }

    #[test]
    fn test_on_change_filters_by_key() {
        let store = bag_store();
        let (seen, callback) = recorder();
        store.on_change(key("count"), callback);

        store.set(key("other"), Some(1));
        store.set(key("count"), Some(2));
        assert_eq!(*seen.borrow(), vec![Some(2)]);
    }

    #[test]
    fn test_on_change_fires_on_reset_with_default() {
        let store = bag_store();
        let (seen, callback) = recorder();
        store.on_change(key("count"), callback);

        store.reset();
        assert_eq!(*seen.borrow(), vec![Some(0)]);
    }

    #[test]
    fn test_reset_reinvokes_factory() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let store: Store<Bag> = Store::new(move || {
            counter.set(counter.get() + 1);
            let mut bag = Bag::new();
            bag.insert("generation".to_string(), counter.get());
            bag
        });
        assert_eq!(store.peek(&key("generation")), Some(1));
        store.reset();
        assert_eq!(store.peek(&key("generation")), Some(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_unsubscribe_removes_both_handlers() {
        let store = bag_store();
        let (seen, callback) = recorder();
        let handle = store.on_change(key("count"), callback);
        assert_eq!(store.listener_count(), 2);

        handle.unsubscribe();
        assert_eq!(store.listener_count(), 0);
        store.set(key("count"), Some(9));
        store.reset();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_remove_listener_by_reference() {
        let store = bag_store();
        let (seen, callback) = recorder();
        let (other_seen, other) = recorder();
        store.on_change(key("count"), Rc::clone(&callback));
        store.on_change(key("count"), other);

        assert!(store.remove_listener(&key("count"), &callback));
        assert!(!store.remove_listener(&key("count"), &callback));
        store.set(key("count"), Some(4));
        assert!(seen.borrow().is_empty());
        assert_eq!(*other_seen.borrow(), vec![Some(4)]);
    }

    #[test]
    fn test_dispose_runs_before_reset() {
        let store = bag_store();
        store.set(key("count"), Some(42));

        let seen_on_dispose = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen_on_dispose);
        let reader = store.clone();
        let on_dispose: DisposeHandler = Rc::new(move || sink.set(Some(reader.peek(&"count".to_string()))));
        store.on(Handler::Dispose(on_dispose));

        store.dispose();
        assert_eq!(seen_on_dispose.get(), Some(Some(42)));
        assert_eq!(store.peek(&key("count")), Some(0));
    }

    #[test]
    fn test_force_update_passes_current_value_twice() {
        let store = bag_store();
        store.set(key("count"), Some(5));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.on(Handler::Set(Rc::new(move |_: &String, new: &Option<i32>, old: &Option<i32>| {
            sink.borrow_mut().push((*new, *old));
        })));

        store.force_update(&key("count"));
        assert_eq!(*seen.borrow(), vec![(Some(5), Some(5))]);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let store = bag_store();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let sink = Rc::clone(&order);
            let on_set: SetHandler<String, Option<i32>> = Rc::new(move |_, _, _| sink.borrow_mut().push(tag));
            store.on(Handler::Set(on_set));
        }
        store.set(key("count"), Some(1));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_reentrant_set_from_handler() {
        let store = bag_store();
        let mirror = store.clone();
        store.on(Handler::Set(Rc::new(move |k: &String, new: &Option<i32>, _: &Option<i32>| {
            if k == "count" {
                mirror.set("double".to_string(), new.map(|v| v * 2));
            }
        })));

        store.set(key("count"), Some(21));
        assert_eq!(store.peek(&key("double")), Some(42));
    }

    #[test]
    fn test_update_notifies_changed_keys_only() {
        let store = bag_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.on(Handler::Set(Rc::new(move |k: &String, _: &Option<i32>, _: &Option<i32>| sink.borrow_mut().push(k.clone()))));

        store.update(|bag| {
            bag.insert("count".to_string(), 0);
            bag.insert("added".to_string(), 1);
        });
        assert_eq!(*seen.borrow(), vec![key("added")]);

        seen.borrow_mut().clear();
        store.update(|bag| {
            bag.remove("added");
        });
        assert_eq!(*seen.borrow(), vec![key("added")]);
        assert_eq!(store.peek(&key("added")), None);
    }

    #[test]
    fn test_use_subscriptions_bundle() {
        let store = bag_store();
        let events = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&events), Rc::clone(&events));
        let on_set: SetHandler<String, Option<i32>> = Rc::new(move |_, _, _| a.borrow_mut().push("set"));
        let on_reset: ResetHandler = Rc::new(move || b.borrow_mut().push("reset"));
        let handle = store.use_subscriptions(vec![Subscription {
            set: Some(on_set),
            reset: Some(on_reset),
            ..Subscription::default()
        }]);

        store.set(key("count"), Some(1));
        store.reset();
        assert_eq!(*events.borrow(), vec!["set", "reset"]);

        handle.unsubscribe();
        assert_eq!(store.listener_count(), 0);
    }
}
