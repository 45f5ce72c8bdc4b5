//! In-process event bus
//!
//! A typed publish/subscribe register keyed by [`EventTag`], plus a wildcard
//! tag that receives every event. The bus is constructed explicitly and
//! injected wherever it is needed; there is no process-global instance, so
//! tests can scope and tear down their own bus deterministically.
//!
//! Delivery is synchronous and fire-and-forget: `publish` invokes handlers
//! in subscription order, first the handlers for the event's tag and then
//! the wildcard handlers. There is no queuing or backpressure. A handler
//! registered under both a specific tag and the wildcard receives the event
//! twice, once per registration. Handler panics are contained by the
//! dispatcher so one bad subscriber cannot break delivery to the rest.

use crate::events::{EventTag, LifecycleEvent};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use tracing::error;

type Handler = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: HashMap<EventTag, Vec<(u64, Handler)>>,
}

/// Cloneable handle to a shared event bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for the given tag.
    ///
    /// The returned [`Subscription`] removes the handler when dropped or
    /// when [`Subscription::unsubscribe`] is called.
    pub fn subscribe(
        &self,
        tag: EventTag,
        handler: impl Fn(&LifecycleEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .handlers
                .entry(tag)
                .or_default()
                .push((id, Arc::new(handler)));
            id
        };

        Subscription {
            bus: Arc::downgrade(&self.inner),
            tag,
            id,
        }
    }

    /// Deliver an event synchronously to all matching handlers.
    pub fn publish(&self, event: &LifecycleEvent) {
        let handlers = {
            let inner = self.lock();
            let mut handlers: Vec<Handler> = Vec::new();
            if let Some(list) = inner.handlers.get(&event.tag) {
                handlers.extend(list.iter().map(|(_, h)| Arc::clone(h)));
            }
            if event.tag != EventTag::Wildcard {
                if let Some(list) = inner.handlers.get(&EventTag::Wildcard) {
                    handlers.extend(list.iter().map(|(_, h)| Arc::clone(h)));
                }
            }
            handlers
        };

        for handler in handlers {
            // A panicking subscriber must not stop delivery to the rest.
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(tag = %event.tag, "Event handler panicked; continuing delivery");
            }
        }
    }

    /// Number of live subscriptions for a tag.
    pub fn subscriber_count(&self, tag: EventTag) -> usize {
        self.lock().handlers.get(&tag).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        // Handlers run outside the lock, so the only way to poison it is a
        // panic inside the registry bookkeeping itself.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Handle to a registered handler.
pub struct Subscription {
    bus: Weak<Mutex<BusInner>>,
    tag: EventTag,
    id: u64,
}

impl Subscription {
    /// Remove the handler now instead of at drop time.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            let mut inner = match bus.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(list) = inner.handlers.get_mut(&self.tag) {
                list.retain(|(id, _)| *id != self.id);
            }
        }
    }
}
