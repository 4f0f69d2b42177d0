use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::session::Session;

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Listener list owned by a session store. Listeners run synchronously, in
/// the order they subscribed.
#[derive(Clone, Default)]
pub struct AuthEvents {
    registry: Arc<Mutex<Registry>>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    pub(crate) fn emit(&self, session: &Session) {
        // Snapshot first so a listener may subscribe or unsubscribe while being called.
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(session);
        }
    }
}

/// Handle returned by [`AuthEvents::subscribe`].
#[must_use = "keep the subscription to unsubscribe later"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_in_subscription_order_until_unsubscribed() {
        let events = AuthEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let seen = seen.clone();
            events.subscribe(move |_| seen.lock().unwrap().push("first"))
        };
        let _second = {
            let seen = seen.clone();
            events.subscribe(move |_| seen.lock().unwrap().push("second"))
        };

        events.emit(&Session::anonymous());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);

        first.unsubscribe();
        assert_eq!(events.listener_count(), 1);
        events.emit(&Session::anonymous());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "second"]);
    }

    #[test]
    fn unsubscribe_after_events_dropped_is_harmless() {
        let events = AuthEvents::new();
        let sub = events.subscribe(|_| {});
        drop(events);
        sub.unsubscribe();
    }
}
