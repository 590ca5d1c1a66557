//! Cookie change notification plumbing.
//!
//! The store dispatches every mutation to registered callbacks on the
//! thread that performed the mutation (the build context). The context
//! factory's callback is responsible for redispatching to the control
//! context before the owning profile sees the event.

use crate::cookies::canonicalcookie::CanonicalCookie;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Why a cookie change event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieChangeCause {
    /// The cookie was inserted.
    Inserted,
    /// The cookie was deleted by an explicit request.
    Explicit,
    /// The cookie was replaced by one with the same name and path.
    Overwrite,
    /// The cookie expired and was purged.
    Expired,
    /// The cookie was evicted to enforce a store limit.
    Evicted,
}

impl CookieChangeCause {
    /// Every cause except insertion describes a removal.
    pub fn is_deletion(self) -> bool {
        !matches!(self, CookieChangeCause::Inserted)
    }
}

/// The payload delivered to the owning profile.
#[derive(Debug, Clone)]
pub struct CookieDetails {
    pub cookie: CanonicalCookie,
    pub removed: bool,
    pub cause: CookieChangeCause,
}

impl CookieDetails {
    pub fn new(cookie: CanonicalCookie, cause: CookieChangeCause) -> Self {
        Self {
            cookie,
            removed: cause.is_deletion(),
            cause,
        }
    }
}

type ChangeCallback = Arc<dyn Fn(&CanonicalCookie, CookieChangeCause) + Send + Sync>;

/// Fan-out of cookie change events to registered callbacks.
#[derive(Default)]
pub struct CookieChangeDispatcher {
    callbacks: Arc<DashMap<u64, ChangeCallback>>,
    next_id: AtomicU64,
}

impl CookieChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every change; it stays active until the
    /// returned subscription is dropped.
    pub fn add_callback_for_all_changes(
        &self,
        callback: impl Fn(&CanonicalCookie, CookieChangeCause) + Send + Sync + 'static,
    ) -> CookieChangeSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.insert(id, Arc::new(callback));
        CookieChangeSubscription {
            id,
            callbacks: Arc::clone(&self.callbacks),
        }
    }

    /// Deliver one change to every registered callback, on the caller's
    /// thread.
    pub fn notify(&self, cookie: &CanonicalCookie, cause: CookieChangeCause) {
        for entry in self.callbacks.iter() {
            (entry.value())(cookie, cause);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.len()
    }
}

/// Keeps one change callback registered; dropping it unregisters.
pub struct CookieChangeSubscription {
    id: u64,
    callbacks: Arc<DashMap<u64, ChangeCallback>>,
}

impl Drop for CookieChangeSubscription {
    fn drop(&mut self) {
        self.callbacks.remove(&self.id);
    }
}

impl std::fmt::Debug for CookieChangeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieChangeSubscription")
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    fn cookie() -> CanonicalCookie {
        CanonicalCookie::new(
            "name".to_string(),
            "value".to_string(),
            "example.com".to_string(),
            "/".to_string(),
            OffsetDateTime::now_utc(),
            None,
        )
    }

    #[test]
    fn test_notify_reaches_subscriber() {
        let dispatcher = CookieChangeDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let _sub = dispatcher.add_callback_for_all_changes(move |c, cause| {
            seen_clone.lock().unwrap().push((c.name.clone(), cause));
        });

        dispatcher.notify(&cookie(), CookieChangeCause::Inserted);
        dispatcher.notify(&cookie(), CookieChangeCause::Explicit);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, CookieChangeCause::Inserted);
        assert_eq!(seen[1].1, CookieChangeCause::Explicit);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let dispatcher = CookieChangeDispatcher::new();
        let seen = Arc::new(Mutex::new(0usize));

        let seen_clone = Arc::clone(&seen);
        let sub = dispatcher.add_callback_for_all_changes(move |_, _| {
            *seen_clone.lock().unwrap() += 1;
        });

        dispatcher.notify(&cookie(), CookieChangeCause::Inserted);
        drop(sub);
        dispatcher.notify(&cookie(), CookieChangeCause::Inserted);

        assert_eq!(*seen.lock().unwrap(), 1);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn test_cause_classification() {
        assert!(!CookieChangeCause::Inserted.is_deletion());
        for cause in [
            CookieChangeCause::Explicit,
            CookieChangeCause::Overwrite,
            CookieChangeCause::Expired,
            CookieChangeCause::Evicted,
        ] {
            assert!(cause.is_deletion());
        }
    }

    #[test]
    fn test_details_removed_flag() {
        let details = CookieDetails::new(cookie(), CookieChangeCause::Inserted);
        assert!(!details.removed);
        let details = CookieDetails::new(cookie(), CookieChangeCause::Overwrite);
        assert!(details.removed);
    }
}
