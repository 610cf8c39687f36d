// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Building blocks for optimistic mutations.
//!
//! - `BusySet`: in-flight entity ids; gates duplicate writes and drives
//!   per-row disablement in the UI
//! - `AliveFlag`: cleared when a screen goes away so late results are dropped
//! - `RefreshPolicy`: decides whether a focus event should refetch

use chrono::{DateTime, Duration, Utc};
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What happened to a requested mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Write succeeded and the view was refetched from the server.
    Applied,
    /// Write succeeded but the refetch failed; the pre-mutation view was kept.
    AppliedStale,
    /// The entity already had a mutation in flight; nothing was sent.
    Skipped,
    /// The screen went away before the result arrived; nothing was committed.
    Detached,
}

/// Set of entity ids with a mutation in flight.
#[derive(Debug, Default, Clone)]
pub struct BusySet {
    ids: Arc<DashSet<String>>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` busy. Returns `None` if it already is.
    pub fn try_acquire(&self, id: &str) -> Option<BusyGuard> {
        if self.ids.insert(id.to_string()) {
            Some(BusyGuard {
                ids: Arc::clone(&self.ids),
                id: id.to_string(),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Clears its busy marker when dropped, on every exit path.
#[derive(Debug)]
pub struct BusyGuard {
    ids: Arc<DashSet<String>>,
    id: String,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.ids.remove(&self.id);
    }
}

/// Shared "screen is still mounted" flag.
#[derive(Debug, Clone)]
pub struct AliveFlag(Arc<AtomicBool>);

impl Default for AliveFlag {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl AliveFlag {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Focus-time refetch rules.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    pub stale_after: Duration,
}

impl RefreshPolicy {
    pub fn new(stale_after_secs: i64) -> Self {
        Self {
            stale_after: Duration::seconds(stale_after_secs),
        }
    }

    /// Data never fetched, or fetched longer ago than `stale_after`.
    pub fn is_stale(&self, last_fetch_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_fetch_at {
            Some(at) => now - at > self.stale_after,
            None => true,
        }
    }
}

/// Remembers the last navigation refresh token seen.
#[derive(Debug, Default, Clone)]
pub struct RefreshTokenTracker {
    last: Option<String>,
}

impl RefreshTokenTracker {
    /// Record `token`; returns true when it differs from the last one seen.
    pub fn observe(&mut self, token: Option<&str>) -> bool {
        match token {
            Some(t) if self.last.as_deref() != Some(t) => {
                self.last = Some(t.to_string());
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_set_blocks_second_acquire() {
        let busy = BusySet::new();
        let guard = busy.try_acquire("svc-1").expect("first acquire");
        assert!(busy.contains("svc-1"));
        assert!(busy.try_acquire("svc-1").is_none());
        assert!(busy.try_acquire("svc-2").is_some());

        drop(guard);
        assert!(!busy.contains("svc-1"));
        assert!(busy.try_acquire("svc-1").is_some());
    }

    #[test]
    fn test_busy_guard_clears_on_early_return() {
        fn fails_while_busy(busy: &BusySet) -> Result<(), &'static str> {
            let _guard = busy.try_acquire("bike-1").ok_or("busy")?;
            Err("write failed")
        }

        let busy = BusySet::new();
        assert_eq!(fails_while_busy(&busy), Err("write failed"));
        assert!(busy.is_empty());
    }

    #[test]
    fn test_alive_flag() {
        let alive = AliveFlag::default();
        let clone = alive.clone();
        assert!(clone.is_alive());
        alive.kill();
        assert!(!clone.is_alive());
    }

    #[test]
    fn test_refresh_policy_staleness() {
        let policy = RefreshPolicy::new(30);
        let now = Utc::now();
        assert!(policy.is_stale(None, now));
        assert!(!policy.is_stale(Some(now - Duration::seconds(30)), now));
        assert!(policy.is_stale(Some(now - Duration::seconds(31)), now));
    }

    #[test]
    fn test_refresh_token_tracker() {
        let mut tracker = RefreshTokenTracker::default();
        assert!(!tracker.observe(None));
        assert!(tracker.observe(Some("t1")));
        assert!(!tracker.observe(Some("t1")));
        assert!(!tracker.observe(None));
        assert!(tracker.observe(Some("t2")));
    }
}
