// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Listener registration shared by the network monitor and presence channel.
//!
//! A [`Subscription`] is the handle returned by every `subscribe` call.
//! Cancelling or dropping it detaches the listener; nothing else keeps a
//! listener alive.

use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Callback invoked with each new value.
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Handle to an active subscription.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription that runs `cancel` once when cancelled or dropped.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing behind it.
    pub fn noop() -> Self {
        Subscription { cancel: None }
    }

    /// Returns true until the subscription has been cancelled.
    ///
    /// Always false for [`Subscription::noop`].
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Detach the listener.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// A set of listeners that can be notified together.
pub struct ListenerSet<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: Clone + 'static> ListenerSet<T> {
    pub fn new() -> Self {
        ListenerSet {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener. The returned subscription removes it again.
    pub fn subscribe(&self, listener: Listener<T>) -> Subscription {
        let id = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, listener));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut registry = inner.lock().unwrap_or_else(PoisonError::into_inner);
                registry.listeners.retain(|(existing, _)| *existing != id);
            }
        })
    }

    /// Invoke every registered listener with `value`.
    ///
    /// Listeners are called outside the registry lock, so a listener may
    /// subscribe or unsubscribe without deadlocking.
    pub fn emit(&self, value: T) {
        let listeners: Vec<Listener<T>> = {
            let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(value.clone());
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + 'static> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
