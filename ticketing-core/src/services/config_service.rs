//! Configuration lifecycle and pool operations.

use crate::actors::{ActorPacing, EventSession, SessionCanceller, SessionPlan, SessionReport};
use crate::entities::configuration::ticket_count;
use crate::entities::{ConfigId, Configuration, PoolSnapshot, TicketPool, VendorId};
use crate::error::TicketingError;
use crate::repositories::ConfigurationRepository;
use std::collections::HashMap;
use std::sync::Arc;
use ticketing_sdk::objects::CreateConfigurationRequest;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

/// An event session as tracked by the service.
enum SessionSlot {
    /// Nobody is joining the session yet.
    Attached(EventSession),
    /// An `await_event` caller owns the session and will receive its report.
    Detached(DetachedSession),
}

struct DetachedSession {
    canceller: SessionCanceller,
    /// Becomes `Some` once the awaiting caller has joined every actor. The
    /// sender is dropped if that caller gives up.
    report: watch::Receiver<Option<SessionReport>>,
}

impl DetachedSession {
    fn is_finished(&self) -> bool {
        self.report.has_changed().is_err() || self.report.borrow().is_some()
    }

    /// Cancel the session and wait until its actors have stopped.
    async fn cancel_and_wait(mut self) {
        self.canceller.cancel();
        // An error means the awaiting caller went away and its JoinSet
        // aborted the actors.
        let _ = self.report.wait_for(Option::is_some).await;
    }
}

impl SessionSlot {
    fn cancel(&self) {
        match self {
            SessionSlot::Attached(session) => session.cancel(),
            SessionSlot::Detached(detached) => detached.canceller.cancel(),
        }
    }

    /// Cancel and wait for every actor to stop. The report is returned only
    /// when no `await_event` caller is going to receive it.
    async fn shutdown(self) -> Option<SessionReport> {
        match self {
            SessionSlot::Attached(session) => Some(session.shutdown().await),
            SessionSlot::Detached(detached) => {
                detached.cancel_and_wait().await;
                None
            }
        }
    }
}

/// Owns every configuration, its pool, and the event session running on it.
///
/// Every change to the set of sessions, and every removal of a
/// configuration, happens under the `sessions` lock, so no session can be
/// started on a configuration that is being removed.
pub struct ConfigService {
    repository: Arc<dyn ConfigurationRepository>,
    sessions: Mutex<HashMap<ConfigId, SessionSlot>>,
    pacing: ActorPacing,
    halt_tx: watch::Sender<bool>,
}

impl ConfigService {
    pub fn new(repository: Arc<dyn ConfigurationRepository>, pacing: ActorPacing) -> Self {
        Self {
            repository,
            sessions: Mutex::new(HashMap::new()),
            pacing,
            halt_tx: watch::Sender::new(false),
        }
    }

    /// Validate, build the configuration with its empty pool, and store it.
    ///
    /// Validation happens before anything is built, and a failed save
    /// leaves nothing behind.
    #[tracing::instrument(skip_all, err, fields(event = %request.event_name))]
    pub async fn create_configuration(
        &self,
        request: &CreateConfigurationRequest,
    ) -> Result<Arc<Configuration>, TicketingError> {
        let configuration = Arc::new(Configuration::create(request)?);
        let config_id = self.repository.save(Arc::clone(&configuration)).await?;

        info!(
            %config_id,
            max_capacity = configuration.max_capacity(),
            total_tickets = configuration.total_tickets(),
            "Configuration created"
        );
        Ok(configuration)
    }

    pub async fn find(&self, config_id: ConfigId) -> Result<Arc<Configuration>, TicketingError> {
        self.repository
            .find_by_id(config_id)
            .await?
            .ok_or_else(|| TicketingError::not_found(format!("configuration {config_id}")))
    }

    pub async fn list(&self) -> Result<Vec<Arc<Configuration>>, TicketingError> {
        Ok(self.repository.list().await?)
    }

    pub async fn pool(&self, config_id: ConfigId) -> Result<Arc<TicketPool>, TicketingError> {
        Ok(Arc::clone(self.find(config_id).await?.pool()))
    }

    /// Remove a configuration together with its pool.
    ///
    /// Runs as one step under the sessions lock: cancel the event session
    /// and wait for its actors to stop, then delete the record, which drops
    /// the last owner of the pool. An awaited session keeps its report for
    /// the awaiting caller, so `None` is returned for it. If the delete
    /// fails the actors stay stopped and the record stays in place, so the
    /// removal can simply be retried.
    #[tracing::instrument(skip(self), err)]
    pub async fn remove_configuration(
        &self,
        config_id: ConfigId,
    ) -> Result<Option<SessionReport>, TicketingError> {
        let mut sessions = self.sessions.lock().await;
        self.find(config_id).await?;

        let report = match sessions.remove(&config_id) {
            Some(slot) => slot.shutdown().await,
            None => None,
        };

        if !self.repository.delete(config_id).await? {
            warn!(%config_id, "Configuration vanished during removal");
            return Err(TicketingError::not_found(format!(
                "configuration {config_id}"
            )));
        }

        info!(%config_id, "Configuration removed");
        Ok(report)
    }

    /// One-off batch of tickets from a vendor.
    #[tracing::instrument(skip(self), err)]
    pub async fn add_tickets(
        &self,
        config_id: ConfigId,
        count: i64,
    ) -> Result<PoolSnapshot, TicketingError> {
        let count = ticket_count(count)?;
        let snapshot = self.pool(config_id).await?.add(count)?;
        info!(%config_id, count, pool_count = snapshot.count, "Tickets added");
        Ok(snapshot)
    }

    /// One-off withdrawal on behalf of a customer.
    #[tracing::instrument(skip(self), err)]
    pub async fn retrieve_tickets(
        &self,
        config_id: ConfigId,
        count: i64,
    ) -> Result<PoolSnapshot, TicketingError> {
        let count = ticket_count(count)?;
        let snapshot = self.pool(config_id).await?.remove(count)?;
        info!(%config_id, count, pool_count = snapshot.count, "Tickets retrieved");
        Ok(snapshot)
    }

    pub async fn pool_status(&self, config_id: ConfigId) -> Result<PoolSnapshot, TicketingError> {
        Ok(self.pool(config_id).await?.snapshot())
    }

    /// Spawn the actors of an event. Only one session may run per
    /// configuration.
    #[tracing::instrument(skip(self, vendors), err, fields(vendors = vendors.len()))]
    pub async fn start_event(
        &self,
        config_id: ConfigId,
        vendors: Vec<VendorId>,
        customers: u32,
    ) -> Result<(), TicketingError> {
        let mut sessions = self.sessions.lock().await;
        if *self.halt_tx.borrow() {
            return Err(TicketingError::Conflict(
                "events are shutting down".to_string(),
            ));
        }
        // Checked under the lock so a concurrent removal cannot slip between
        // the lookup and the spawn.
        let configuration = self.find(config_id).await?;

        let stale = matches!(
            sessions.get(&config_id),
            Some(SessionSlot::Detached(detached)) if detached.is_finished()
        );
        if stale {
            sessions.remove(&config_id);
        }
        if sessions.contains_key(&config_id) {
            return Err(TicketingError::Conflict(format!(
                "event {config_id} is already running"
            )));
        }

        let session = EventSession::start(
            &configuration,
            SessionPlan {
                vendors,
                customers,
                pacing: self.pacing,
            },
        );
        sessions.insert(config_id, SessionSlot::Attached(session));
        Ok(())
    }

    /// Cancel a running event and collect its reports.
    ///
    /// An event that is being awaited is left alone and reported as a
    /// conflict: its report belongs to the awaiting caller.
    #[tracing::instrument(skip(self), err)]
    pub async fn stop_event(&self, config_id: ConfigId) -> Result<SessionReport, TicketingError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.remove(&config_id) {
            Some(SessionSlot::Attached(session)) => Ok(session.shutdown().await),
            Some(detached @ SessionSlot::Detached(_)) => {
                sessions.insert(config_id, detached);
                Err(TicketingError::Conflict(format!(
                    "event {config_id} is being awaited"
                )))
            }
            None => Err(TicketingError::not_found(format!("running event {config_id}"))),
        }
    }

    /// Wait for a running event to finish on its own, or until `halt` is
    /// called.
    ///
    /// The session stays registered while it is awaited, so removal of the
    /// configuration or `halt` still cancel it.
    pub async fn await_event(&self, config_id: ConfigId) -> Result<SessionReport, TicketingError> {
        let (report_tx, report_rx) = watch::channel(None);
        let session = {
            let mut sessions = self.sessions.lock().await;
            match sessions.remove(&config_id) {
                Some(SessionSlot::Attached(session)) => {
                    sessions.insert(
                        config_id,
                        SessionSlot::Detached(DetachedSession {
                            canceller: session.canceller(),
                            report: report_rx.clone(),
                        }),
                    );
                    session
                }
                Some(detached @ SessionSlot::Detached(_)) => {
                    sessions.insert(config_id, detached);
                    return Err(TicketingError::Conflict(format!(
                        "event {config_id} is already being awaited"
                    )));
                }
                None => {
                    return Err(TicketingError::not_found(format!(
                        "running event {config_id}"
                    )));
                }
            }
        };

        let mut halt_rx = self.halt_tx.subscribe();
        let halted = async move {
            let closed = halt_rx.wait_for(|halted| *halted).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        };
        let report = session.join_until(halted).await;

        // Publish before taking the lock: a removal holding it may be
        // waiting for exactly this.
        report_tx.send_replace(Some(report.clone()));
        drop(report_tx);

        let mut sessions = self.sessions.lock().await;
        let ours = matches!(
            sessions.get(&config_id),
            Some(SessionSlot::Detached(detached)) if detached.report.same_channel(&report_rx)
        );
        if ours {
            sessions.remove(&config_id);
        }
        Ok(report)
    }

    pub async fn is_running(&self, config_id: ConfigId) -> bool {
        match self.sessions.lock().await.get(&config_id) {
            Some(SessionSlot::Attached(_)) => true,
            Some(SessionSlot::Detached(detached)) => !detached.is_finished(),
            None => false,
        }
    }

    /// Cancel every running event, including those being awaited, and
    /// refuse to start new ones. Reports go to whoever joins each session.
    pub async fn halt(&self) {
        let sessions = self.sessions.lock().await;
        self.halt_tx.send_replace(true);
        for slot in sessions.values() {
            slot.cancel();
        }
        info!(cancelled = sessions.len(), "Event sessions halted");
    }

    /// Halt, then wait for every event to stop. Returns the reports of the
    /// events nobody was awaiting.
    pub async fn stop_all(&self) -> Vec<SessionReport> {
        self.halt().await;
        let slots: Vec<SessionSlot> = self
            .sessions
            .lock()
            .await
            .drain()
            .map(|(_, slot)| slot)
            .collect();

        let mut reports = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(report) = slot.shutdown().await {
                reports.push(report);
            }
        }
        reports
    }
}
