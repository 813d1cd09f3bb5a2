//! Change notification for the event logs
//!
//! A constructible publish/subscribe object with two channels,
//! `feedback-updated` and `data-updated`. Notifications carry no payload:
//! a subscriber treats each one as an invalidation signal and re-pulls the
//! aggregates it renders.
//!
//! Two subscription styles are offered:
//! - synchronous handlers, invoked on the appending thread before
//!   `append` returns (exactly once per successful append)
//! - an async `watch()` receiver backed by a tokio broadcast channel, for
//!   consumers running on a runtime

use crate::types::Channel;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast;
use tracing::debug;

/// Callback invoked with the channel that fired
pub type Handler = Arc<dyn Fn(Channel) + Send + Sync>;

struct Registration {
    id: u64,
    channel: Channel,
    handler: Handler,
}

struct NotifierInner {
    handlers: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<Channel>,
}

impl NotifierInner {
    fn remove(&self, id: u64) -> bool {
        let mut handlers = match self.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = handlers.len();
        handlers.retain(|r| r.id != id);
        handlers.len() != before
    }
}

/// Process-wide change notifier, owned by the application and injected
/// into the store and its consumers. Cloning shares the same registry.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<NotifierInner>,
}

impl ChangeNotifier {
    /// Create a notifier whose async watchers buffer up to `capacity`
    /// signals before lagging
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(NotifierInner {
                handlers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                tx,
            }),
        }
    }

    /// Register `handler` on `channel`.
    ///
    /// Subscribing the same handler instance (same `Arc`) to the same
    /// channel twice registers it once; both returned subscriptions refer
    /// to that single registration.
    pub fn subscribe(&self, channel: Channel, handler: Handler) -> Subscription {
        let mut handlers = self.lock_handlers();

        let existing = handlers
            .iter()
            .find(|r| r.channel == channel && same_handler(&r.handler, &handler))
            .map(|r| r.id);

        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                handlers.push(Registration {
                    id,
                    channel,
                    handler,
                });
                debug!("Subscribed handler {} to {}", id, channel);
                id
            }
        };

        Subscription {
            id,
            channel,
            notifier: Arc::downgrade(&self.inner),
        }
    }

    /// Convenience wrapper around [`subscribe`](Self::subscribe) for closures
    pub fn subscribe_fn<F>(&self, channel: Channel, f: F) -> Subscription
    where
        F: Fn(Channel) + Send + Sync + 'static,
    {
        self.subscribe(channel, Arc::new(f))
    }

    /// Fire `channel`. Handlers run after the registry lock is released,
    /// so a handler may itself subscribe or unsubscribe.
    pub fn notify(&self, channel: Channel) {
        let targets: Vec<Handler> = self
            .lock_handlers()
            .iter()
            .filter(|r| r.channel == channel)
            .map(|r| Arc::clone(&r.handler))
            .collect();

        for handler in targets {
            handler(channel);
        }

        // No watchers is not an error
        let _ = self.inner.tx.send(channel);
    }

    /// Receive every signal fired after this call, on both channels
    pub fn watch(&self) -> broadcast::Receiver<Channel> {
        self.inner.tx.subscribe()
    }

    /// Number of handlers registered on `channel`
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.lock_handlers()
            .iter()
            .filter(|r| r.channel == channel)
            .count()
    }

    fn lock_handlers(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        match self.inner.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("feedback_handlers", &self.subscriber_count(Channel::FeedbackUpdated))
            .field("data_handlers", &self.subscriber_count(Channel::DataUpdated))
            .field("watchers", &self.inner.tx.receiver_count())
            .finish()
    }
}

fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Handle returned by [`ChangeNotifier::subscribe`]
///
/// Dropping it keeps the handler registered; call
/// [`unsubscribe`](Self::unsubscribe) on teardown.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    channel: Channel,
    notifier: Weak<NotifierInner>,
}

impl Subscription {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Detach the handler. Returns false if it was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.notifier.upgrade() {
            Some(inner) => {
                let removed = inner.remove(self.id);
                if removed {
                    debug!("Unsubscribed handler {} from {}", self.id, self.channel);
                }
                removed
            }
            None => false,
        }
    }
}
