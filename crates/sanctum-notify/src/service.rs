//! The notification service.
//!
//! State lives behind one mutex. Every mutation stamps its snapshot of the
//! sorted list with a version taken under that lock. Subscriber callbacks
//! run after the lock is released, so a callback may call back into the
//! service.
//!
//! Delivery goes through an outbox with a single active deliverer. A
//! publisher that finds delivery in progress (another thread, or a
//! callback re-entering the service) leaves its snapshot in the outbox and
//! returns; the deliverer picks it up next. Subscribers therefore see
//! snapshots one at a time in version order, and a snapshot older than one
//! already delivered is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;

use crate::types::{Notification, NotificationData, NotificationId};

/// How long a `normal` priority notification stays up.
pub const AUTO_DISMISS_DELAY: Duration = Duration::from_secs(5);

type Subscriber = Arc<dyn Fn(&[Notification]) + Send + Sync>;

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Cloneable handle; clones share the same list and subscribers.
#[derive(Clone)]
pub struct NotificationService {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    outbox: Mutex<Outbox>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_subscriber: AtomicU64,
    auto_dismiss: Duration,
}

#[derive(Default)]
struct State {
    /// Insertion order.
    items: Vec<Notification>,
    timers: HashMap<NotificationId, JoinHandle<()>>,
    last_timestamp: Option<DateTime<Utc>>,
    version: u64,
}

/// A sorted list tagged with the state version it was taken at.
struct Snapshot {
    version: u64,
    items: Vec<Notification>,
}

#[derive(Default)]
struct Outbox {
    pending: Option<Snapshot>,
    delivered: u64,
    delivering: bool,
}

/// Releases the deliverer role when a subscriber panics mid-delivery.
struct Delivering<'a>(&'a Mutex<Outbox>);

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).delivering = false;
        }
    }
}

impl State {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn sorted(&self) -> Vec<Notification> {
        let mut items = self.items.clone();
        // Stable: equal timestamps keep insertion order.
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items
    }

    fn snapshot(&mut self) -> Snapshot {
        self.version += 1;
        Snapshot {
            version: self.version,
            items: self.sorted(),
        }
    }

    fn remove(&mut self, id: &NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| &n.id != id);
        self.items.len() != before
    }
}

impl NotificationService {
    pub fn new() -> Self {
        Self::with_auto_dismiss(AUTO_DISMISS_DELAY)
    }

    /// A service whose `normal` notifications expire after `delay`.
    pub fn with_auto_dismiss(delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                outbox: Mutex::new(Outbox::default()),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(1),
                auto_dismiss: delay,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a notification and return its id.
    ///
    /// Subscribers are notified before this returns, unless delivery is
    /// already in progress elsewhere, in which case the active deliverer
    /// hands them this change. A `normal` priority
    /// notification schedules its own dismissal on the current tokio
    /// runtime; outside a runtime it stays until dismissed.
    pub fn show(&self, data: NotificationData) -> NotificationId {
        let id = NotificationId::generate();
        let snapshot = {
            let mut state = self.state();
            let notification = Notification {
                id: id.clone(),
                app_id: data.app_id,
                title: data.title,
                body: data.body,
                priority: data.priority,
                timestamp: state.next_timestamp(),
            };
            tracing::debug!(
                id = %id,
                app_id = %notification.app_id,
                priority = %notification.priority,
                "notification shown"
            );
            state.items.push(notification);

            if data.priority.auto_dismisses() {
                if let Some(timer) = self.schedule_dismiss(&id) {
                    state.timers.insert(id.clone(), timer);
                }
            }
            state.snapshot()
        };
        self.publish(snapshot);
        id
    }

    fn schedule_dismiss(&self, id: &NotificationId) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(id = %id, "no async runtime, notification will not auto-dismiss");
                return None;
            }
        };
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let id = id.clone();
        let delay = self.inner.auto_dismiss;
        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                NotificationService { inner }.expire(&id);
            }
        }))
    }

    /// Timer path: like `dismiss`, but the timer is the caller and is not
    /// aborted.
    fn expire(&self, id: &NotificationId) {
        let snapshot = {
            let mut state = self.state();
            state.timers.remove(id);
            if !state.remove(id) {
                return;
            }
            tracing::debug!(id = %id, "notification expired");
            state.snapshot()
        };
        self.publish(snapshot);
    }

    /// Remove a notification and cancel its timer. Unknown ids are ignored
    /// and do not reach subscribers.
    pub fn dismiss(&self, id: &NotificationId) {
        let snapshot = {
            let mut state = self.state();
            if !state.remove(id) {
                return;
            }
            if let Some(timer) = state.timers.remove(id) {
                timer.abort();
            }
            tracing::debug!(id = %id, "notification dismissed");
            state.snapshot()
        };
        self.publish(snapshot);
    }

    /// Remove everything and cancel every pending timer.
    pub fn clear(&self) {
        let snapshot = {
            let mut state = self.state();
            for (_, timer) in state.timers.drain() {
                timer.abort();
            }
            let count = state.items.len();
            state.items.clear();
            tracing::debug!(count, "notifications cleared");
            state.snapshot()
        };
        self.publish(snapshot);
    }

    /// Most recent first.
    pub fn get_all(&self) -> Vec<Notification> {
        self.state().sorted()
    }

    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        self.state().items.iter().find(|n| &n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of auto-dismiss timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.state().timers.len()
    }

    // ── subscribers ──

    /// Register `callback` to receive the full sorted list after every
    /// change. Dropping the returned [`Subscription`] deregisters it.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Notification]) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.inner.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: Snapshot) {
        {
            let mut outbox = self.outbox();
            let newer = snapshot.version > outbox.delivered
                && outbox
                    .pending
                    .as_ref()
                    .is_none_or(|p| snapshot.version > p.version);
            if newer {
                outbox.pending = Some(snapshot);
            }
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }
        let _delivering = Delivering(&self.inner.outbox);

        loop {
            let next = {
                let mut outbox = self.outbox();
                match outbox.pending.take() {
                    Some(next) => {
                        outbox.delivered = next.version;
                        next
                    }
                    None => {
                        outbox.delivering = false;
                        return;
                    }
                }
            };
            self.deliver(&next.items);
        }
    }

    fn deliver(&self, items: &[Notification]) {
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        tracing::trace!(subscribers = subscribers.len(), count = items.len(), "notifications published");
        for subscriber in subscribers {
            subscriber(items);
        }
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("active", &self.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Keeps a subscriber registered for as long as it is alive.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn data(title: &str, priority: Priority) -> NotificationData {
        NotificationData::new("test", title, "").with_priority(priority)
    }

    #[test]
    fn get_all_is_most_recent_first() {
        let service = NotificationService::new();
        for title in ["a", "b", "c"] {
            service.show(data(title, Priority::High));
        }
        let titles: Vec<String> = service.get_all().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);

        let all = service.get_all();
        assert!(all.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let ts = Utc::now();
        let mut state = State::default();
        for title in ["first", "second"] {
            state.items.push(Notification {
                id: NotificationId::generate(),
                app_id: "x".into(),
                title: title.into(),
                body: String::new(),
                priority: Priority::Low,
                timestamp: ts,
            });
        }
        let titles: Vec<String> = state.sorted().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn dismiss_unknown_is_silent() {
        let service = NotificationService::new();
        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        let _sub = service.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        service.dismiss(&NotificationId::from("notif_missing"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn normal_without_runtime_has_no_timer() {
        let service = NotificationService::new();
        service.show(data("n", Priority::Normal));
        assert_eq!(service.len(), 1);
        assert_eq!(service.pending_timers(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let service = NotificationService::new();
        let sub = service.subscribe(|_| {});
        assert_eq!(service.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(service.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_reenter() {
        let service = NotificationService::new();
        let handle = service.clone();
        let seen = Arc::new(AtomicU64::new(0));
        let s = Arc::clone(&seen);
        let _sub = service.subscribe(move |list| {
            s.store(handle.get_all().len() as u64, Ordering::SeqCst);
            assert_eq!(list.len(), handle.len());
        });
        service.show(data("x", Priority::Urgent));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_change_is_delivered_after_the_current_one() {
        let service = NotificationService::new();
        let handle = service.clone();
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&log);
        let _sub = service.subscribe(move |list| {
            l.lock().unwrap().push(list.len());
            if let Some(first) = list.first() {
                handle.dismiss(&first.id);
            }
        });

        service.show(data("x", Priority::High));
        assert_eq!(*log.lock().unwrap(), vec![1, 0]);
        assert!(service.is_empty());
    }

    #[test]
    fn concurrent_publishers_deliver_serially_and_end_current() {
        use std::sync::atomic::AtomicBool;

        let service = NotificationService::new();
        let busy = Arc::new(AtomicBool::new(false));
        let last = Arc::new(Mutex::new(None::<Vec<NotificationId>>));
        let (b, l) = (Arc::clone(&busy), Arc::clone(&last));
        let _sub = service.subscribe(move |list| {
            assert!(!b.swap(true, Ordering::SeqCst), "overlapping delivery");
            *l.lock().unwrap() = Some(list.iter().map(|n| n.id.clone()).collect());
            b.store(false, Ordering::SeqCst);
        });

        let threads: Vec<_> = (0..4)
            .map(|t| {
                let service = service.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = service.show(data(&format!("{t}-{i}"), Priority::Low));
                        if i % 2 == 0 {
                            service.dismiss(&id);
                        }
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let current: Vec<NotificationId> = service.get_all().into_iter().map(|n| n.id).collect();
        assert_eq!(current.len(), 100);
        assert_eq!(last.lock().unwrap().clone(), Some(current));
    }
}
