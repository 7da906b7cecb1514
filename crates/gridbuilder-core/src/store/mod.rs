//! Observable key-value store.
//!
//! - [`Store`]: a shared property bag whose reads, writes, resets and
//!   disposal can be observed.
//! - [`UpdateBridge`]: tracks which UI elements read which keys and asks them
//!   to re-render when those keys change.
//!
//! # Invariants
//!
//! 1. A write whose value the change predicate considers equal notifies nobody.
//! 2. Handlers run synchronously in registration order.
//! 3. Dispose handlers run before the reset that follows them.

mod bridge;
mod observable;

pub use bridge::{Element, UpdateBridge};
pub use observable::{
    ChangeCallback, DisposeHandler, GetHandler, Handler, ListenerId, ResetHandler, SetHandler,
    ShouldUpdate, Store, StoreState, Subscription, Unsubscribe,
};
