//! Change listeners for the queue
//!
//! Listeners get a shared borrow of the manager when they fire, so they can
//! re-read whatever state they display but cannot mutate the queue from
//! inside a dispatch.

use super::manager::QueueManager;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

pub type Listener = Box<dyn FnMut(&QueueManager) + Send + 'static>;

/// Identifies one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: Vec<(ListenerId, Listener)>,
    dispatching: bool,
    /// Slots moved out of the registry by the running dispatch
    checked_out: usize,
    /// Unsubscribed while their slot was checked out for a dispatch
    removed: Vec<ListenerId>,
}

/// Ordered set of listeners owned by a `QueueManager`
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub(crate) fn register(&self, listener: Listener) -> Subscription {
        let mut reg = self.inner.lock();
        let id = ListenerId(reg.next_id);
        reg.next_id += 1;
        reg.slots.push((id, listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn len(&self) -> usize {
        let reg = self.inner.lock();
        (reg.slots.len() + reg.checked_out).saturating_sub(reg.removed.len())
    }

    /// Invoke every listener once, in registration order.
    ///
    /// The slots are moved out of the lock for the duration of the calls so a
    /// listener may drop a `Subscription` (its own or another) without
    /// deadlocking. They are put back by a guard, so the registry stays
    /// intact when a listener panics.
    pub(crate) fn dispatch(&self, queue: &QueueManager) {
        let active = {
            let mut reg = self.inner.lock();
            reg.dispatching = true;
            reg.checked_out = reg.slots.len();
            std::mem::take(&mut reg.slots)
        };
        let mut guard = DispatchGuard {
            registry: &self.inner,
            active,
        };

        for (id, listener) in guard.active.iter_mut() {
            if guard.registry.lock().removed.contains(id) {
                continue;
            }
            listener(queue);
        }
    }
}

/// Returns checked-out slots to the registry at the end of a dispatch
struct DispatchGuard<'a> {
    registry: &'a Mutex<Registry>,
    active: Vec<(ListenerId, Listener)>,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let active = std::mem::take(&mut self.active);
        let dropped = {
            let mut reg = self.registry.lock();
            reg.dispatching = false;
            reg.checked_out = 0;
            let removed = std::mem::take(&mut reg.removed);

            let mut kept = Vec::with_capacity(active.len());
            let mut dropped = Vec::new();
            for slot in active {
                if removed.contains(&slot.0) {
                    dropped.push(slot);
                } else {
                    kept.push(slot);
                }
            }
            kept.append(&mut reg.slots);
            reg.slots = kept;
            dropped
        };
        // Closures may own other subscriptions; drop them outside the lock.
        drop(dropped);
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

/// Handle returned by `QueueManager::add_listener`.
///
/// Dropping it unregisters the listener. Call [`Subscription::detach`] to keep
/// the listener for as long as the manager lives.
#[must_use = "dropping a Subscription immediately unregisters its listener"]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Keep the listener registered without holding on to the handle
    pub fn detach(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };

        let removed = {
            let mut reg = inner.lock();
            match reg.slots.iter().position(|(id, _)| *id == self.id) {
                Some(pos) => Some(reg.slots.remove(pos)),
                None => {
                    if reg.dispatching {
                        reg.removed.push(self.id);
                    }
                    None
                }
            }
        };
        drop(removed);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &(self.registry.strong_count() > 0))
            .finish()
    }
}
