//! Orderbook state containers: full-snapshot replacement with staleness checks.

use super::OrderBookSnapshot;
use chrono::{DateTime, Utc};

/// What the view layer should render for a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum BookView {
    /// No snapshot has ever been applied. Not the same as an empty book.
    AwaitingFirstSnapshot,
    Ready(OrderBookSnapshot),
}

impl BookView {
    pub fn snapshot(&self) -> Option<&OrderBookSnapshot> {
        match self {
            BookView::AwaitingFirstSnapshot => None,
            BookView::Ready(snapshot) => Some(snapshot),
        }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, BookView::AwaitingFirstSnapshot)
    }
}

/// Result of offering a snapshot to the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Older than the current snapshot; discarded.
    Stale { last_applied_at: DateTime<Utc> },
}

/// Applies incoming full snapshots in timestamp order.
///
/// A snapshot strictly older than the last applied one is discarded. Equal or newer
/// snapshots replace the current state wholesale; no merging happens.
///
/// Without a sequence number a missed frame cannot be told apart from "no update
/// occurred", so only reordering is detected here.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReconciler {
    current: Option<OrderBookSnapshot>,
    last_applied_at: Option<DateTime<Utc>>,
    discarded: u64,
}

impl SnapshotReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a decoded snapshot.
    pub fn apply(&mut self, snapshot: OrderBookSnapshot) -> ApplyOutcome {
        if let Some(last) = self.last_applied_at {
            if snapshot.received_at < last {
                self.discarded += 1;
                tracing::debug!(
                    stale_at = %snapshot.received_at,
                    last_applied_at = %last,
                    "Discarding out-of-order snapshot"
                );
                return ApplyOutcome::Stale {
                    last_applied_at: last,
                };
            }
        }

        self.last_applied_at = Some(snapshot.received_at);
        self.current = Some(snapshot);
        ApplyOutcome::Applied
    }

    pub fn view(&self) -> BookView {
        match &self.current {
            Some(snapshot) => BookView::Ready(snapshot.clone()),
            None => BookView::AwaitingFirstSnapshot,
        }
    }

    pub fn current(&self) -> Option<&OrderBookSnapshot> {
        self.current.as_ref()
    }

    pub fn last_applied_at(&self) -> Option<DateTime<Utc>> {
        self.last_applied_at
    }

    /// Number of snapshots dropped as out-of-order.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn is_awaiting_first(&self) -> bool {
        self.current.is_none()
    }
}
