//! EventSession.
//!
//! Spawns the vendor and customer actors of one configuration and keeps the
//! shutdown signal they all listen on. Vendors are constructed (and so
//! registered as producers) before any customer is spawned, otherwise an
//! early customer could see an empty pool with no producers and leave.

use super::{ActorPacing, ActorReport, CustomerActor, VendorActor};
use crate::entities::{ConfigId, Configuration, PoolSnapshot, TicketPool, VendorId};
use std::sync::Arc;
use ticketing_sdk::objects::{ActorKind, ActorSummary, EventSummary};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Who takes part in an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    /// One vendor actor per entry.
    pub vendors: Vec<VendorId>,
    pub customers: u32,
    pub pacing: ActorPacing,
}

/// Final accounting once every actor of a session has stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub config_id: ConfigId,
    pub actors: Vec<ActorReport>,
    pub snapshot: PoolSnapshot,
}

impl SessionReport {
    pub fn tickets_released(&self) -> u64 {
        self.tickets_by(ActorKind::Vendor)
    }

    pub fn tickets_retrieved(&self) -> u64 {
        self.tickets_by(ActorKind::Customer)
    }

    fn tickets_by(&self, kind: ActorKind) -> u64 {
        self.actors
            .iter()
            .filter(|report| report.kind == kind)
            .map(|report| report.tickets)
            .sum()
    }

    pub fn to_summary(&self) -> EventSummary {
        EventSummary {
            config_id: self.config_id.into(),
            tickets_released: self.tickets_released(),
            tickets_retrieved: self.tickets_retrieved(),
            final_count: self.snapshot.count,
            actors: self.actors.iter().map(ActorSummary::from).collect(),
        }
    }
}

pub struct EventSession {
    config_id: ConfigId,
    pool: Arc<TicketPool>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    tasks: JoinSet<ActorReport>,
}

/// Cancels a session without owning it, e.g. while another task joins it.
#[derive(Debug, Clone)]
pub struct SessionCanceller {
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl SessionCanceller {
    pub fn cancel(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

impl EventSession {
    /// Spawn every actor of `plan` against the configuration's pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(configuration: &Configuration, plan: SessionPlan) -> Self {
        let shutdown_tx = Arc::new(watch::Sender::new(false));
        let pool = Arc::clone(configuration.pool());
        let mut tasks = JoinSet::new();

        let vendors: Vec<VendorActor> = plan
            .vendors
            .iter()
            .enumerate()
            .map(|(index, vendor_id)| {
                VendorActor::new(
                    format!("vendor-{index}"),
                    *vendor_id,
                    Arc::clone(&pool),
                    configuration.release_rate(),
                    plan.pacing.release,
                )
            })
            .collect();

        for actor in vendors {
            tasks.spawn(actor.run(shutdown_tx.subscribe()));
        }

        for index in 0..plan.customers {
            let actor = CustomerActor::new(
                format!("customer-{index}"),
                Arc::clone(&pool),
                configuration.retrieval_rate(),
                plan.pacing.retrieval,
            );
            tasks.spawn(actor.run(shutdown_tx.subscribe()));
        }

        info!(
            config_id = %configuration.id(),
            vendors = plan.vendors.len(),
            customers = plan.customers,
            "EventSession started"
        );

        Self {
            config_id: configuration.id(),
            pool,
            shutdown_tx,
            tasks,
        }
    }

    pub fn config_id(&self) -> ConfigId {
        self.config_id
    }

    /// Signal every actor to stop. Each one notices within a pacing interval.
    pub fn cancel(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn canceller(&self) -> SessionCanceller {
        SessionCanceller {
            shutdown_tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Wait for every actor to stop on its own and collect their reports.
    pub async fn join(self) -> SessionReport {
        self.join_until(std::future::pending()).await
    }

    /// Wait for every actor to stop, cancelling the session once `halt`
    /// completes.
    pub async fn join_until(mut self, halt: impl Future<Output = ()>) -> SessionReport {
        let mut actors = Vec::with_capacity(self.tasks.len());
        let Self {
            config_id,
            shutdown_tx,
            tasks,
            ..
        } = &mut self;
        tokio::pin!(halt);
        let mut halted = false;

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok(report)) => actors.push(report),
                    Some(Err(e)) => {
                        error!(%config_id, error = %e, "Actor task failed");
                    }
                    None => break,
                },
                _ = &mut halt, if !halted => {
                    halted = true;
                    shutdown_tx.send_replace(true);
                }
            }
        }

        // Vendors first, then customers, each in label order.
        actors.sort_by(|a, b| {
            (a.kind == ActorKind::Customer)
                .cmp(&(b.kind == ActorKind::Customer))
                .then_with(|| a.label.cmp(&b.label))
        });

        let snapshot = self.pool.snapshot();
        info!(
            config_id = %self.config_id,
            count = snapshot.count,
            released = snapshot.released,
            retrieved = snapshot.retrieved,
            "EventSession finished"
        );

        SessionReport {
            config_id: self.config_id,
            actors,
            snapshot,
        }
    }

    /// Cancel, then wait for every actor to stop.
    pub async fn shutdown(self) -> SessionReport {
        self.cancel();
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::Pacing;
    use std::time::Duration;
    use ticketing_sdk::objects::{CreateConfigurationRequest, Termination};

    fn fast_pacing() -> ActorPacing {
        ActorPacing {
            release: Pacing::fixed(Duration::from_millis(1)),
            retrieval: Pacing::fixed(Duration::from_millis(1)),
        }
    }

    fn configuration(total: i64, capacity: i64) -> Configuration {
        Configuration::create(&CreateConfigurationRequest {
            event_name: "Concert".to_string(),
            location: "Arena".to_string(),
            total_tickets: total,
            release_rate: 10,
            retrieval_rate: 10,
            max_capacity: capacity,
        })
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_vendors_and_customers_balance_exactly() {
        let configuration = configuration(50, 200);
        let session = EventSession::start(
            &configuration,
            SessionPlan {
                vendors: (0..5).map(|_| VendorId::new()).collect(),
                customers: 3,
                pacing: fast_pacing(),
            },
        );

        let report = tokio::time::timeout(Duration::from_secs(10), session.join())
            .await
            .unwrap();

        assert_eq!(report.actors.len(), 8);
        assert_eq!(report.tickets_released(), 50);
        assert_eq!(report.snapshot.released, report.tickets_released());
        assert_eq!(report.snapshot.retrieved, report.tickets_retrieved());
        assert_eq!(
            u64::from(report.snapshot.count),
            report.tickets_released() - report.tickets_retrieved()
        );
        assert_eq!(report.snapshot.count, 0);
        assert!(
            report
                .actors
                .iter()
                .all(|actor| actor.termination != Termination::Cancelled)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_cancels_stuck_actors() {
        // Capacity 10 with no customers: vendors fill it and then block.
        let configuration = configuration(1_000, 10);
        let session = EventSession::start(
            &configuration,
            SessionPlan {
                vendors: vec![VendorId::new(), VendorId::new()],
                customers: 0,
                pacing: fast_pacing(),
            },
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        let report = tokio::time::timeout(Duration::from_secs(5), session.shutdown())
            .await
            .unwrap();

        assert_eq!(report.snapshot.count, 10);
        assert_eq!(report.tickets_released(), 10);
        assert!(
            report
                .actors
                .iter()
                .all(|actor| actor.termination == Termination::Cancelled)
        );
        assert_eq!(configuration.pool().active_producers(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_join_until_cancels_when_halted() {
        let configuration = configuration(1_000, 10);
        let session = EventSession::start(
            &configuration,
            SessionPlan {
                vendors: vec![VendorId::new()],
                customers: 0,
                pacing: fast_pacing(),
            },
        );

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            session.join_until(tokio::time::sleep(Duration::from_millis(50))),
        )
        .await
        .unwrap();

        assert_eq!(report.actors.len(), 1);
        assert_eq!(report.actors[0].termination, Termination::Cancelled);
        assert_eq!(report.snapshot.count, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_canceller_stops_session_being_joined() {
        let configuration = configuration(1_000, 10);
        let session = EventSession::start(
            &configuration,
            SessionPlan {
                vendors: vec![VendorId::new()],
                customers: 1,
                pacing: fast_pacing(),
            },
        );
        let canceller = session.canceller();
        let joiner = tokio::spawn(session.join());

        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();

        let report = tokio::time::timeout(Duration::from_secs(5), joiner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.actors.len(), 2);
        assert_eq!(configuration.pool().active_producers(), 0);
    }

    #[tokio::test]
    async fn test_summary_lists_vendors_first() {
        let configuration = configuration(0, 10);
        let vendor_id = VendorId::new();
        let report = EventSession::start(
            &configuration,
            SessionPlan {
                vendors: vec![vendor_id],
                customers: 1,
                pacing: fast_pacing(),
            },
        )
        .join()
        .await;

        let summary = report.to_summary();
        assert_eq!(summary.actors.len(), 2);
        assert_eq!(summary.actors[0].kind, ActorKind::Vendor);
        assert_eq!(summary.actors[0].vendor_id, Some(vendor_id.into()));
        assert_eq!(summary.actors[1].kind, ActorKind::Customer);
        assert_eq!(summary.final_count, 0);
    }
}
