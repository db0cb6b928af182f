//! VendorActor.
//!
//! A vendor releases a batch of `release_rate` tickets per cycle, shrinking
//! the last batch to whatever is left of the event's allotment. Rejected
//! batches have no side effect; the vendor just waits and tries again.
//!
//! ```text
//! Producing --added, allotment left--> Waiting --delay elapsed--> Producing
//! Producing --rejected--------------> Waiting
//! Producing --allotment released----> Terminated(AllotmentExhausted)
//! Waiting   --shutdown--------------> Terminated(Cancelled)
//! ```

use super::{ActorReport, Pacing, pause};
use crate::entities::{PoolError, PoolSnapshot, ProducerGuard, TicketPool, VendorId};
use std::sync::Arc;
use ticketing_sdk::objects::{ActorKind, Termination};
use tokio::sync::watch;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorState {
    Producing,
    Waiting,
    Terminated(Termination),
}

impl VendorState {
    /// Where a vendor goes after one release attempt.
    pub fn after_release(result: &Result<PoolSnapshot, PoolError>) -> Self {
        match result {
            Ok(snapshot) if snapshot.remaining_allotment == Some(0) => {
                VendorState::Terminated(Termination::AllotmentExhausted)
            }
            Ok(_) | Err(_) => VendorState::Waiting,
        }
    }
}

pub struct VendorActor {
    label: String,
    vendor_id: VendorId,
    pool: Arc<TicketPool>,
    release_rate: u32,
    pacing: Pacing,
    _producer: ProducerGuard,
}

impl VendorActor {
    /// Create a vendor bound to `pool`.
    ///
    /// The vendor counts as an active producer from this moment until the
    /// actor is dropped, whether or not it has been run yet.
    pub fn new(
        label: impl Into<String>,
        vendor_id: VendorId,
        pool: Arc<TicketPool>,
        release_rate: u32,
        pacing: Pacing,
    ) -> Self {
        let producer = pool.register_producer();
        Self {
            label: label.into(),
            vendor_id,
            pool,
            release_rate,
            pacing,
            _producer: producer,
        }
    }

    /// Run until the allotment is released or shutdown is signaled.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> ActorReport {
        let mut report = ActorReport::new(
            self.label.clone(),
            ActorKind::Vendor,
            Some(self.vendor_id),
        );
        let mut state = VendorState::Producing;

        info!(
            actor = %self.label,
            vendor_id = %self.vendor_id,
            release_rate = self.release_rate,
            "VendorActor started"
        );

        loop {
            let next = match state {
                VendorState::Producing => {
                    if *shutdown_rx.borrow() {
                        VendorState::Terminated(Termination::Cancelled)
                    } else {
                        self.produce(&mut report)
                    }
                }
                VendorState::Waiting => {
                    if pause(&mut shutdown_rx, self.pacing.next_delay()).await {
                        VendorState::Terminated(Termination::Cancelled)
                    } else {
                        VendorState::Producing
                    }
                }
                VendorState::Terminated(reason) => {
                    report.termination = reason;
                    break;
                }
            };
            debug!(actor = %self.label, from = ?state, to = ?next, "VendorActor transition");
            state = next;
        }

        info!(
            actor = %self.label,
            vendor_id = %self.vendor_id,
            tickets = report.tickets,
            attempts = report.attempts,
            rejections = report.rejections,
            termination = %report.termination,
            "VendorActor terminated"
        );
        report
    }

    fn produce(&self, report: &mut ActorReport) -> VendorState {
        let batch = match self.pool.remaining_allotment() {
            Some(0) => return VendorState::Terminated(Termination::AllotmentExhausted),
            Some(remaining) => u32::try_from(remaining)
                .map_or(self.release_rate, |remaining| remaining.min(self.release_rate)),
            None => self.release_rate,
        };

        report.attempts += 1;
        let result = self.pool.add(batch);
        match &result {
            Ok(snapshot) => {
                report.tickets += u64::from(batch);
                debug!(actor = %self.label, batch, count = snapshot.count, "Released tickets");
            }
            Err(e @ (PoolError::CapacityExceeded { .. } | PoolError::AllotmentExhausted { .. })) => {
                report.rejections += 1;
                debug!(actor = %self.label, batch, error = %e, "Release rejected, waiting");
            }
            Err(e) => {
                report.rejections += 1;
                error!(actor = %self.label, batch, error = %e, "Unexpected pool error while releasing");
            }
        }
        VendorState::after_release(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pacing() -> Pacing {
        Pacing::fixed(Duration::from_millis(1))
    }

    #[test]
    fn test_transition_after_release() {
        let pool = TicketPool::with_allotment(10, 4);
        let partial = pool.add(2);
        assert_eq!(VendorState::after_release(&partial), VendorState::Waiting);

        let rejected = pool.add(5);
        assert_eq!(VendorState::after_release(&rejected), VendorState::Waiting);

        let last = pool.add(2);
        assert_eq!(
            VendorState::after_release(&last),
            VendorState::Terminated(Termination::AllotmentExhausted)
        );
    }

    #[tokio::test]
    async fn test_vendor_releases_whole_allotment() {
        let pool = Arc::new(TicketPool::with_allotment(100, 25));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let actor = VendorActor::new("vendor-0", VendorId::new(), pool.clone(), 10, pacing());
        let report = actor.run(shutdown_rx).await;

        assert_eq!(report.tickets, 25);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.termination, Termination::AllotmentExhausted);
        assert_eq!(pool.current_count(), 25);
        assert_eq!(pool.active_producers(), 0);
    }

    #[tokio::test]
    async fn test_zero_allotment_terminates_immediately() {
        let pool = Arc::new(TicketPool::with_allotment(10, 0));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let report = VendorActor::new("vendor-0", VendorId::new(), pool, 5, pacing())
            .run(shutdown_rx)
            .await;

        assert_eq!(report.attempts, 0);
        assert_eq!(report.termination, Termination::AllotmentExhausted);
    }

    #[tokio::test]
    async fn test_full_pool_waits_until_cancelled() {
        let pool = Arc::new(TicketPool::with_allotment(10, 100));
        pool.add(10).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            VendorActor::new("vendor-0", VendorId::new(), pool.clone(), 5, pacing())
                .run(shutdown_rx),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.termination, Termination::Cancelled);
        assert_eq!(report.tickets, 0);
        assert!(report.rejections >= 1);
        assert_eq!(pool.current_count(), 10);
        assert_eq!(pool.active_producers(), 0);
    }
}
