//! CustomerActor.
//!
//! A customer withdraws `retrieval_rate` tickets per cycle. While producers
//! are still active an empty pool only means "not yet", so the customer
//! waits and retries. Once production has finished it takes whatever is
//! left (at most `retrieval_rate`) and stops when the pool is empty.

use super::{ActorReport, Pacing, pause};
use crate::entities::{PoolError, PoolSnapshot, TicketPool};
use std::sync::Arc;
use ticketing_sdk::objects::{ActorKind, Termination};
use tokio::sync::watch;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerState {
    Consuming,
    Waiting,
    Terminated(Termination),
}

impl CustomerState {
    /// Decide, from a fresh snapshot, whether to keep going and how many
    /// tickets to ask for.
    pub fn plan(snapshot: &PoolSnapshot, retrieval_rate: u32) -> Result<u32, Termination> {
        match (snapshot.production_finished, snapshot.count) {
            (true, 0) => Err(Termination::ProductionFinished),
            (true, count) => Ok(retrieval_rate.min(count)),
            (false, _) => Ok(retrieval_rate),
        }
    }
}

pub struct CustomerActor {
    label: String,
    pool: Arc<TicketPool>,
    retrieval_rate: u32,
    pacing: Pacing,
}

impl CustomerActor {
    pub fn new(
        label: impl Into<String>,
        pool: Arc<TicketPool>,
        retrieval_rate: u32,
        pacing: Pacing,
    ) -> Self {
        Self {
            label: label.into(),
            pool,
            retrieval_rate,
            pacing,
        }
    }

    /// Run until production is over and the pool is drained, or until
    /// shutdown is signaled.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> ActorReport {
        let mut report = ActorReport::new(self.label.clone(), ActorKind::Customer, None);
        let mut state = CustomerState::Consuming;

        info!(
            actor = %self.label,
            retrieval_rate = self.retrieval_rate,
            "CustomerActor started"
        );

        loop {
            let next = match state {
                CustomerState::Consuming => {
                    if *shutdown_rx.borrow() {
                        CustomerState::Terminated(Termination::Cancelled)
                    } else {
                        self.consume(&mut report)
                    }
                }
                CustomerState::Waiting => {
                    if pause(&mut shutdown_rx, self.pacing.next_delay()).await {
                        CustomerState::Terminated(Termination::Cancelled)
                    } else {
                        CustomerState::Consuming
                    }
                }
                CustomerState::Terminated(reason) => {
                    report.termination = reason;
                    break;
                }
            };
            debug!(actor = %self.label, from = ?state, to = ?next, "CustomerActor transition");
            state = next;
        }

        info!(
            actor = %self.label,
            tickets = report.tickets,
            attempts = report.attempts,
            rejections = report.rejections,
            termination = %report.termination,
            "CustomerActor terminated"
        );
        report
    }

    fn consume(&self, report: &mut ActorReport) -> CustomerState {
        let request = match CustomerState::plan(&self.pool.snapshot(), self.retrieval_rate) {
            Ok(request) => request,
            Err(reason) => return CustomerState::Terminated(reason),
        };

        report.attempts += 1;
        match self.pool.remove(request) {
            Ok(snapshot) => {
                report.tickets += u64::from(request);
                debug!(actor = %self.label, request, count = snapshot.count, "Retrieved tickets");
            }
            Err(e @ PoolError::InsufficientStock { .. }) => {
                report.rejections += 1;
                debug!(actor = %self.label, request, error = %e, "Retrieval rejected, waiting");
            }
            Err(e) => {
                report.rejections += 1;
                error!(actor = %self.label, request, error = %e, "Unexpected pool error while retrieving");
            }
        }
        CustomerState::Waiting
    }
}
