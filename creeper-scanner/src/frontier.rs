//! Shared crawl state owned by the orchestrator: the bounded frontier of
//! pending work and the visited set.
//!
//! The frontier also tracks every unit of work that is queued or being
//! processed. The run ends exactly when that count returns to zero, which
//! is decided under the same lock that guards the queue.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// A URL waiting to be processed, with the depth it was discovered at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: String,
    pub depth: usize,
}

impl FrontierItem {
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<FrontierItem>,
    /// Queued plus actively processed units.
    in_flight: usize,
    closed: bool,
}

/// Bounded multi-producer, multi-consumer work queue.
///
/// `offer` never blocks: when the queue is full the item is dropped.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    capacity: usize,
    notify: Notify,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            capacity: capacity.max(1),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `item` if there is room. Returns false when it was dropped,
    /// either because the queue is full or the frontier is closed.
    pub fn offer(&self, item: FrontierItem) -> bool {
        let mut state = self.lock();
        if state.closed || state.queue.len() >= self.capacity {
            return false;
        }
        state.queue.push_back(item);
        state.in_flight += 1;
        drop(state);

        self.notify.notify_one();
        true
    }

    /// Wait for the next item. Returns `None` once the frontier is closed or
    /// `cancel` fires. Every item handed out must be matched by a call to
    /// [`Frontier::complete`].
    pub async fn take(&self, cancel: &CancellationToken) -> Option<FrontierItem> {
        loop {
            // Register interest before inspecting state so a wakeup between
            // the check and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(item) = state.queue.pop_front() {
                    return Some(item);
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Mark one unit of work as finished, whether it was fetched or
    /// abandoned. Closes the frontier when nothing is left in flight.
    pub fn complete(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 && state.queue.is_empty() && !state.closed {
            state.closed = true;
            drop(state);
            self.notify.notify_waiters();
        }
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Registry of normalized URLs that already have an owner.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `url`, returning true only for the first caller.
    pub fn insert_if_absent(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
