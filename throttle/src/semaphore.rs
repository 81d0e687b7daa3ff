use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Caps the number of operations running simultaneously.
///
/// Cloning is cheap; all clones share the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    limit: usize,
    sem: Arc<tokio::sync::Semaphore>,
    counters: Arc<Counters>,
}

/// A held slot. Dropping it lets the next waiter proceed.
#[derive(Debug)]
pub struct Permit {
    _permit: tokio::sync::OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ConcurrencyLimit {
    pub fn new(limit: std::num::NonZeroUsize) -> Self {
        let limit = limit.get();
        Self {
            limit,
            sem: Arc::new(tokio::sync::Semaphore::new(limit)),
            counters: Arc::default(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of permits ever held at the same time.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::Acquire)
    }

    /// Wait for a free slot.
    pub async fn permit(&self) -> Permit {
        // the semaphore is owned by this struct and never closed
        let permit = self
            .sem
            .clone()
            .acquire_owned()
            .await
            .expect("concurrency semaphore must never be closed");
        let now = self.counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.peak.fetch_max(now, Ordering::AcqRel);
        tracing::trace!("acquired slot, in flight: {}/{}", now, self.limit);
        Permit {
            _permit: permit,
            counters: self.counters.clone(),
        }
    }
}
