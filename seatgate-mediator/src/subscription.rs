//! Subscription handles and the dispatch loop.
//!
//! Every live registration, whether on broker signals or bus topics, is a
//! [`SubscriptionHandle`] carrying a single channel of tagged results. An
//! `Err(Status)` ends the subscription: the handle reports it once and then
//! yields nothing further. There is no automatic re-subscribe.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use seatgate_core::{Status, SubscriptionEvent};

/// A live registration on a broker query or bus topic.
pub struct SubscriptionHandle<T> {
    id: Uuid,
    source: String,
    rx: mpsc::UnboundedReceiver<SubscriptionEvent<T>>,
    active: bool,
}

impl<T> SubscriptionHandle<T> {
    pub fn new(source: impl Into<String>, rx: mpsc::UnboundedReceiver<SubscriptionEvent<T>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            rx,
            active: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Query or topic this handle is registered on.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next update or error, in emission order.
    ///
    /// Returns `None` once the feed is closed or after an error was delivered.
    pub async fn next(&mut self) -> Option<SubscriptionEvent<T>> {
        if !self.active {
            return None;
        }
        match self.rx.recv().await {
            Some(Ok(item)) => Some(Ok(item)),
            Some(Err(status)) => {
                self.active = false;
                self.rx.close();
                Some(Err(status))
            }
            None => {
                self.active = false;
                None
            }
        }
    }
}

impl<T> std::fmt::Debug for SubscriptionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("active", &self.active)
            .finish()
    }
}

struct Subscriber<K, T> {
    filter: K,
    tx: mpsc::UnboundedSender<SubscriptionEvent<T>>,
}

/// Fan-out registry backing in-memory feeds.
///
/// `K` is the filter a subscriber registered with (a topic, a signal query).
pub(crate) struct SubscriberSet<K, T> {
    subscribers: Mutex<Vec<Subscriber<K, T>>>,
}

impl<K, T> Default for SubscriberSet<K, T> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<K, T: Clone> SubscriberSet<K, T> {
    pub(crate) fn register(&self, filter: K, source: String) -> SubscriptionHandle<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(Subscriber { filter, tx });
        SubscriptionHandle::new(source, rx)
    }

    /// Deliver to every subscriber whose filter yields an item.
    ///
    /// Dropped handles are pruned. Returns the number of deliveries.
    pub(crate) fn deliver<F>(&self, mut select: F) -> usize
    where
        F: FnMut(&K) -> Option<T>,
    {
        let mut delivered = 0;
        self.subscribers.lock().retain(|sub| {
            if sub.tx.is_closed() {
                return false;
            }
            if let Some(item) = select(&sub.filter) {
                if sub.tx.send(Ok(item)).is_ok() {
                    delivered += 1;
                } else {
                    return false;
                }
            }
            true
        });
        delivered
    }

    /// Fail every subscriber whose filter matches, removing it.
    pub(crate) fn fail<F>(&self, mut matches: F, status: &Status) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let mut failed = 0;
        self.subscribers.lock().retain(|sub| {
            if matches(&sub.filter) {
                let _ = sub.tx.send(Err(status.clone()));
                failed += 1;
                false
            } else {
                true
            }
        });
        failed
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Drive a subscription until it ends, routing items and errors.
///
/// Items are handed to `on_item` in emission order. The first error is
/// handed to `on_error` and ends the loop.
pub async fn dispatch<T, I, E>(mut handle: SubscriptionHandle<T>, mut on_item: I, on_error: E)
where
    I: FnMut(T),
    E: Fn(&Status),
{
    while let Some(event) = handle.next().await {
        match event {
            Ok(item) => on_item(item),
            Err(status) => on_error(&status),
        }
    }
    tracing::debug!(
        "Subscription {} on {} is no longer active",
        handle.id(),
        handle.source()
    );
}
