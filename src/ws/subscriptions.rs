//! Feed state transitions and per-URL subscription tracking.

use super::FeedStatus;
use crate::shared::FeedUrl;
use std::collections::HashMap;

// ─── State machine ───────────────────────────────────────────────────────────

/// Events that move a feed between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSignal {
    ConnectStarted,
    Opened,
    /// Remote close, transport error, failed connect or idle timeout.
    Dropped,
    /// Reconnect policy gave up.
    Exhausted,
    /// A new subscriber arrived for a failed feed.
    Revived,
}

impl FeedStatus {
    /// Next status for `signal`, or `None` when the transition is not allowed.
    pub fn on(self, signal: FeedSignal) -> Option<FeedStatus> {
        use FeedSignal::*;
        use FeedStatus::*;
        match (self, signal) {
            (Idle, ConnectStarted) | (Closed, ConnectStarted) => Some(Connecting),
            (Connecting, Opened) => Some(Open),
            (Connecting, Dropped) | (Open, Dropped) => Some(Closed),
            (Closed, Exhausted) => Some(Failed),
            (Failed, Revived) => Some(Idle),
            _ => None,
        }
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

struct Entry<T> {
    ref_count: usize,
    resource: T,
}

/// Outcome of releasing one subscriber.
#[derive(Debug, PartialEq, Eq)]
pub enum Release<T> {
    /// No such URL was tracked.
    Unknown,
    /// Other subscribers remain.
    Retained(usize),
    /// Last subscriber left; the caller owns the resource and must tear it down.
    Closed(T),
}

/// Reference-counted map from feed URL to its connection resource.
///
/// At most one resource exists per URL. It is created by the first `acquire`
/// and handed back exactly once, by the `release` that drops the count to zero.
pub struct SubscriptionRegistry<T> {
    entries: HashMap<FeedUrl, Entry<T>>,
}

impl<T> Default for SubscriptionRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> SubscriptionRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. `open` runs only for the first one. Returns the resource
    /// and whether it was created by this call.
    pub fn acquire(&mut self, url: &FeedUrl, open: impl FnOnce() -> T) -> (&mut T, bool) {
        let mut created = false;
        let entry = self.entries.entry(url.clone()).or_insert_with(|| {
            created = true;
            Entry {
                ref_count: 0,
                resource: open(),
            }
        });
        entry.ref_count += 1;
        (&mut entry.resource, created)
    }

    pub fn release(&mut self, url: &FeedUrl) -> Release<T> {
        let Some(entry) = self.entries.get_mut(url) else {
            return Release::Unknown;
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count > 0 {
            return Release::Retained(entry.ref_count);
        }
        match self.entries.remove(url) {
            Some(entry) => Release::Closed(entry.resource),
            None => Release::Unknown,
        }
    }

    /// Release only if `is_current` accepts the tracked resource. Lets a holder
    /// from an earlier, drained entry leave without touching its replacement.
    pub fn release_if(
        &mut self,
        url: &FeedUrl,
        is_current: impl FnOnce(&T) -> bool,
    ) -> Release<T> {
        match self.entries.get(url) {
            Some(entry) if is_current(&entry.resource) => self.release(url),
            _ => Release::Unknown,
        }
    }

    pub fn get(&self, url: &FeedUrl) -> Option<&T> {
        self.entries.get(url).map(|e| &e.resource)
    }

    pub fn ref_count(&self, url: &FeedUrl) -> usize {
        self.entries.get(url).map_or(0, |e| e.ref_count)
    }

    pub fn urls(&self) -> Vec<FeedUrl> {
        let mut urls: Vec<FeedUrl> = self.entries.keys().cloned().collect();
        urls.sort();
        urls
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry regardless of its count.
    pub fn drain(&mut self) -> Vec<(FeedUrl, T)> {
        self.entries
            .drain()
            .map(|(url, entry)| (url, entry.resource))
            .collect()
    }
}
