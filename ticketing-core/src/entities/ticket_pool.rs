//! The bounded ticket pool shared by every actor of one event.
//!
//! All mutation goes through [`TicketPool::add`] and [`TicketPool::remove`],
//! which take a single short critical section over the count and its
//! ledger. Neither ever waits on another actor beyond that section, so a
//! rejected caller simply gets an error back and decides whether to retry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use ticketing_sdk::objects::PoolStatus;

/// Rejections from the pool. None of them change any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error(
        "adding {requested} tickets would exceed the pool capacity of {capacity} \
         (currently holding {count})"
    )]
    CapacityExceeded {
        requested: u32,
        count: u32,
        capacity: u32,
    },

    #[error("cannot remove {requested} tickets, only {count} available")]
    InsufficientStock { requested: u32, count: u32 },

    #[error(
        "adding {requested} tickets would exceed the event total of {allotment} \
         ({remaining} left to release)"
    )]
    AllotmentExhausted {
        requested: u32,
        remaining: u64,
        allotment: u64,
    },
}

/// Consistent view of the pool and its ledger, taken under one lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub count: u32,
    pub capacity: u32,
    pub released: u64,
    pub retrieved: u64,
    pub remaining_allotment: Option<u64>,
    pub production_finished: bool,
}

impl From<PoolSnapshot> for PoolStatus {
    fn from(snapshot: PoolSnapshot) -> Self {
        PoolStatus {
            count: snapshot.count,
            capacity: snapshot.capacity,
            released: snapshot.released,
            retrieved: snapshot.retrieved,
            remaining_allotment: snapshot.remaining_allotment,
        }
    }
}

#[derive(Debug, Default)]
struct PoolState {
    count: u32,
    released: u64,
    retrieved: u64,
    active_producers: usize,
}

/// A capacity-bounded ticket counter with a lifetime ledger.
///
/// Invariants held at every observable point:
/// - `0 <= count <= capacity`
/// - `count == released - retrieved`
/// - `released <= allotment` when an allotment is set
#[derive(Debug)]
pub struct TicketPool {
    capacity: u32,
    allotment: Option<u64>,
    state: Mutex<PoolState>,
}

impl TicketPool {
    /// A pool with no lifetime cap on released tickets.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            allotment: None,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// A pool that will never release more than `allotment` tickets in total.
    pub fn with_allotment(capacity: u32, allotment: u32) -> Self {
        Self {
            capacity,
            allotment: Some(u64::from(allotment)),
            state: Mutex::new(PoolState::default()),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn allotment(&self) -> Option<u64> {
        self.allotment
    }

    // Every critical section leaves the state consistent before it can
    // panic, so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit `n` tickets, all or nothing.
    ///
    /// `n == 0` succeeds without touching anything. A request larger than
    /// the capacity always fails, whatever the current count.
    pub fn add(&self, n: u32) -> Result<PoolSnapshot, PoolError> {
        let mut state = self.lock();
        if n == 0 {
            return Ok(self.snapshot_of(&state));
        }

        let next = state
            .count
            .checked_add(n)
            .filter(|next| *next <= self.capacity)
            .ok_or(PoolError::CapacityExceeded {
                requested: n,
                count: state.count,
                capacity: self.capacity,
            })?;

        if let Some(allotment) = self.allotment {
            let remaining = allotment.saturating_sub(state.released);
            if u64::from(n) > remaining {
                return Err(PoolError::AllotmentExhausted {
                    requested: n,
                    remaining,
                    allotment,
                });
            }
        }

        state.count = next;
        state.released += u64::from(n);
        Ok(self.snapshot_of(&state))
    }

    /// Withdraw `n` tickets, all or nothing. `n == 0` is a no-op success.
    pub fn remove(&self, n: u32) -> Result<PoolSnapshot, PoolError> {
        let mut state = self.lock();
        if n == 0 {
            return Ok(self.snapshot_of(&state));
        }

        let next = state
            .count
            .checked_sub(n)
            .ok_or(PoolError::InsufficientStock {
                requested: n,
                count: state.count,
            })?;

        state.count = next;
        state.retrieved += u64::from(n);
        Ok(self.snapshot_of(&state))
    }

    /// Tickets currently held. May be stale as soon as it returns.
    pub fn current_count(&self) -> u32 {
        self.lock().count
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.lock();
        self.snapshot_of(&state)
    }

    /// Tickets that may still be released, or `None` for an uncapped pool.
    pub fn remaining_allotment(&self) -> Option<u64> {
        let state = self.lock();
        self.remaining_of(&state)
    }

    /// No more tickets will arrive: either every producer is gone or the
    /// whole allotment has already been released.
    pub fn production_finished(&self) -> bool {
        let state = self.lock();
        self.finished_of(&state)
    }

    /// Record a live producer until the returned guard is dropped.
    ///
    /// Consumers use the producer count to tell "empty for now" from "empty
    /// for good", so producers must be registered before any consumer
    /// starts looking.
    pub fn register_producer(self: &Arc<Self>) -> ProducerGuard {
        self.lock().active_producers += 1;
        ProducerGuard {
            pool: Arc::clone(self),
        }
    }

    pub fn active_producers(&self) -> usize {
        self.lock().active_producers
    }

    fn remaining_of(&self, state: &PoolState) -> Option<u64> {
        self.allotment
            .map(|allotment| allotment.saturating_sub(state.released))
    }

    fn finished_of(&self, state: &PoolState) -> bool {
        state.active_producers == 0 || self.remaining_of(state) == Some(0)
    }

    fn snapshot_of(&self, state: &PoolState) -> PoolSnapshot {
        PoolSnapshot {
            count: state.count,
            capacity: self.capacity,
            released: state.released,
            retrieved: state.retrieved,
            remaining_allotment: self.remaining_of(state),
            production_finished: self.finished_of(state),
        }
    }
}

/// Keeps a producer counted as active on its pool.
#[derive(Debug)]
pub struct ProducerGuard {
    pool: Arc<TicketPool>,
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        let mut state = self.pool.lock();
        state.active_producers = state.active_producers.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_to_capacity_then_reject() {
        let pool = TicketPool::new(100);
        pool.add(100).unwrap();

        let err = pool.add(1).unwrap_err();
        assert!(matches!(err, PoolError::CapacityExceeded { .. }));
        assert_eq!(pool.current_count(), 100);
    }

    #[test]
    fn test_remove_from_empty_pool() {
        let pool = TicketPool::new(10);
        let err = pool.remove(1).unwrap_err();
        assert_eq!(
            err,
            PoolError::InsufficientStock {
                requested: 1,
                count: 0
            }
        );
        assert_eq!(pool.current_count(), 0);
    }

    #[test]
    fn test_zero_is_a_noop_success() {
        let pool = TicketPool::new(5);
        assert_eq!(pool.add(0).unwrap().count, 0);
        assert_eq!(pool.remove(0).unwrap().count, 0);
        assert_eq!(pool.snapshot().released, 0);
    }

    #[test]
    fn test_oversized_request_always_fails() {
        let pool = TicketPool::new(10);
        assert!(matches!(
            pool.add(11),
            Err(PoolError::CapacityExceeded { .. })
        ));
        assert!(matches!(
            pool.add(u32::MAX),
            Err(PoolError::CapacityExceeded { .. })
        ));
        assert_eq!(pool.current_count(), 0);
    }

    #[test]
    fn test_add_then_remove_restores_count() {
        let pool = TicketPool::new(50);
        pool.add(7).unwrap();
        let before = pool.current_count();

        pool.add(20).unwrap();
        pool.remove(20).unwrap();

        assert_eq!(pool.current_count(), before);
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.released, 27);
        assert_eq!(snapshot.retrieved, 20);
    }

    #[test]
    fn test_allotment_caps_lifetime_releases() {
        let pool = TicketPool::with_allotment(100, 15);
        pool.add(10).unwrap();
        pool.remove(10).unwrap();

        let err = pool.add(10).unwrap_err();
        assert_eq!(
            err,
            PoolError::AllotmentExhausted {
                requested: 10,
                remaining: 5,
                allotment: 15
            }
        );

        let snapshot = pool.add(5).unwrap();
        assert_eq!(snapshot.remaining_allotment, Some(0));
        assert!(snapshot.production_finished);
    }

    #[test]
    fn test_capacity_is_checked_before_allotment() {
        let pool = TicketPool::with_allotment(10, 5);
        assert!(matches!(
            pool.add(11),
            Err(PoolError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_producer_guard_tracks_liveness() {
        let pool = Arc::new(TicketPool::new(10));
        assert!(pool.production_finished());

        let first = pool.register_producer();
        let second = pool.register_producer();
        assert_eq!(pool.active_producers(), 2);
        assert!(!pool.production_finished());

        drop(first);
        assert!(!pool.production_finished());
        drop(second);
        assert!(pool.production_finished());
    }

    #[test]
    fn test_concurrent_mutations_keep_invariants() {
        let pool = TicketPool::new(64);

        std::thread::scope(|scope| {
            for worker in 0..8u32 {
                let pool = &pool;
                scope.spawn(move || {
                    for round in 0..2_000u32 {
                        let n = (worker + round) % 9;
                        let result = if (worker + round) % 2 == 0 {
                            pool.add(n)
                        } else {
                            pool.remove(n)
                        };
                        let snapshot = result.unwrap_or_else(|_| pool.snapshot());
                        assert!(snapshot.count <= snapshot.capacity);
                        assert_eq!(
                            u64::from(snapshot.count),
                            snapshot.released - snapshot.retrieved
                        );
                    }
                });
            }
        });

        let snapshot = pool.snapshot();
        assert!(snapshot.count <= 64);
        assert_eq!(
            u64::from(snapshot.count),
            snapshot.released - snapshot.retrieved
        );
    }

    #[test]
    fn test_concurrent_batches_are_never_lost() {
        let pool = TicketPool::new(200);
        let added = std::sync::atomic::AtomicU64::new(0);
        let removed = std::sync::atomic::AtomicU64::new(0);

        std::thread::scope(|scope| {
            for _ in 0..5 {
                scope.spawn(|| {
                    if pool.add(10).is_ok() {
                        added.fetch_add(10, std::sync::atomic::Ordering::Relaxed);
                    }
                });
            }
            for _ in 0..3 {
                scope.spawn(|| {
                    if pool.remove(10).is_ok() {
                        removed.fetch_add(10, std::sync::atomic::Ordering::Relaxed);
                    }
                });
            }
        });

        let added = added.into_inner();
        let removed = removed.into_inner();
        assert_eq!(added, 50);
        assert_eq!(u64::from(pool.current_count()), added - removed);
    }
}
