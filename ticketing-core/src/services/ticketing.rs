use super::{ConfigService, VendorService};
use crate::actors::{ActorPacing, SessionReport};
use crate::entities::{ConfigId, VendorId};
use crate::error::TicketingError;
use crate::repositories::{ConfigurationRepository, VendorRepository};
use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use ticketing_sdk::objects::{
    AddTicketsRequest, AwaitEventRequest, ConfigurationView, CreateConfigurationRequest,
    EventSummary, GetConfigurationRequest, Outcome, PoolStatus, PoolStatusRequest,
    RemoveConfigurationRequest, RetrieveTicketsRequest, StartEventRequest, StopEventRequest,
    VendorDeleteRequest, VendorLoggedIn, VendorLoginRequest, VendorRegisterRequest,
    VendorRegistered,
};
use tracing::{error, warn};

/// Facade over the configuration and vendor services.
///
/// Collaborators are handed in explicitly; nothing is looked up globally.
pub struct TicketingService {
    configs: ConfigService,
    vendors: VendorService,
}

impl TicketingService {
    pub fn new(configs: ConfigService, vendors: VendorService) -> Self {
        Self { configs, vendors }
    }

    /// Build the service graph on top of the given repositories.
    pub fn with_repositories(
        configurations: Arc<dyn ConfigurationRepository>,
        vendors: Arc<dyn VendorRepository>,
        pacing: ActorPacing,
    ) -> Self {
        Self::new(
            ConfigService::new(configurations, pacing),
            VendorService::new(vendors),
        )
    }

    pub fn configs(&self) -> &ConfigService {
        &self.configs
    }

    pub fn vendors(&self) -> &VendorService {
        &self.vendors
    }

    /// Credit every vendor actor's released tickets to its vendor record.
    ///
    /// A vendor deleted while its actor was running is skipped: the tickets
    /// are already in the pool and there is no record left to credit.
    pub async fn settle(&self, report: &SessionReport) {
        for actor in &report.actors {
            let Some(vendor_id) = actor.vendor_id else {
                continue;
            };
            if actor.tickets == 0 {
                continue;
            }
            if let Err(e) = self.vendors.credit_tickets(vendor_id, actor.tickets).await {
                warn!(%vendor_id, tickets = actor.tickets, error = %e, "Could not credit vendor");
            }
        }
    }

    async fn start_event(&self, request: StartEventRequest) -> Result<(), TicketingError> {
        let mut vendors = Vec::with_capacity(request.vendor_ids.len());
        for vendor_id in request.vendor_ids {
            vendors.push(self.vendors.find(VendorId::from(vendor_id)).await?.id);
        }
        self.configs
            .start_event(ConfigId::from(request.config_id), vendors, request.customers)
            .await
    }

    async fn finish_event(
        &self,
        result: Result<SessionReport, TicketingError>,
    ) -> Result<EventSummary, TicketingError> {
        let report = result?;
        self.settle(&report).await;
        Ok(report.to_summary())
    }
}

/// Turn a service result into an outcome, logging failures.
fn respond<T>(
    operation: &'static str,
    result: Result<T, TicketingError>,
    on_success: impl FnOnce(&T) -> String,
    on_failure: impl FnOnce(&TicketingError) -> String,
) -> Outcome<T> {
    match result {
        Ok(data) => Outcome::success(on_success(&data), data),
        Err(e) => {
            match &e {
                TicketingError::Repository(_) | TicketingError::Credential(_) => {
                    error!(operation, error = %e, "Operation failed unexpectedly");
                }
                _ => warn!(operation, error = %e, "Operation rejected"),
            }
            Outcome::failure(on_failure(&e))
        }
    }
}

impl Processor<CreateConfigurationRequest> for TicketingService {
    type Output = Outcome<ConfigurationView>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:CreateConfiguration")]
    async fn process(
        &self,
        request: CreateConfigurationRequest,
    ) -> Result<Outcome<ConfigurationView>, Infallible> {
        let result = self
            .configs
            .create_configuration(&request)
            .await
            .map(|configuration| configuration.to_view());
        Ok(respond(
            "create_configuration",
            result,
            |_| "Configuration was successfully added to the system.".to_string(),
            |e| format!("Configuration was not added to the system: {e}"),
        ))
    }
}

impl Processor<GetConfigurationRequest> for TicketingService {
    type Output = Outcome<ConfigurationView>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:GetConfiguration")]
    async fn process(
        &self,
        request: GetConfigurationRequest,
    ) -> Result<Outcome<ConfigurationView>, Infallible> {
        let result = self
            .configs
            .find(request.config_id.into())
            .await
            .map(|configuration| configuration.to_view());
        Ok(respond(
            "get_configuration",
            result,
            |_| "Configuration found".to_string(),
            |e| e.to_string(),
        ))
    }
}

impl Processor<RemoveConfigurationRequest> for TicketingService {
    type Output = Outcome;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:RemoveConfiguration")]
    async fn process(&self, request: RemoveConfigurationRequest) -> Result<Outcome, Infallible> {
        let result = self
            .configs
            .remove_configuration(request.config_id.into())
            .await;
        if let Ok(Some(report)) = &result {
            self.settle(report).await;
        }
        Ok(respond(
            "remove_configuration",
            result.map(|_| ()),
            |_| "Configuration was removed from the system.".to_string(),
            |e| format!("Configuration was not removed: {e}"),
        ))
    }
}

impl Processor<AddTicketsRequest> for TicketingService {
    type Output = Outcome<PoolStatus>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:AddTickets")]
    async fn process(&self, request: AddTicketsRequest) -> Result<Outcome<PoolStatus>, Infallible> {
        let result = self
            .configs
            .add_tickets(request.config_id.into(), request.count)
            .await
            .map(PoolStatus::from);
        Ok(respond(
            "add_tickets",
            result,
            |_| format!("{} tickets added successfully", request.count),
            |e| format!("Error in adding tickets: {e}"),
        ))
    }
}

impl Processor<RetrieveTicketsRequest> for TicketingService {
    type Output = Outcome<PoolStatus>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:RetrieveTickets")]
    async fn process(
        &self,
        request: RetrieveTicketsRequest,
    ) -> Result<Outcome<PoolStatus>, Infallible> {
        let result = self
            .configs
            .retrieve_tickets(request.config_id.into(), request.count)
            .await
            .map(PoolStatus::from);
        Ok(respond(
            "retrieve_tickets",
            result,
            |_| format!("{} tickets retrieved successfully", request.count),
            |e| format!("Error in retrieving tickets: {e}"),
        ))
    }
}

impl Processor<PoolStatusRequest> for TicketingService {
    type Output = Outcome<PoolStatus>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:PoolStatus")]
    async fn process(&self, request: PoolStatusRequest) -> Result<Outcome<PoolStatus>, Infallible> {
        let result = self
            .configs
            .pool_status(request.config_id.into())
            .await
            .map(PoolStatus::from);
        Ok(respond(
            "pool_status",
            result,
            |status| format!("{} tickets in pool", status.count),
            |e| e.to_string(),
        ))
    }
}

impl Processor<VendorRegisterRequest> for TicketingService {
    type Output = Outcome<VendorRegistered>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:VendorRegister")]
    async fn process(
        &self,
        request: VendorRegisterRequest,
    ) -> Result<Outcome<VendorRegistered>, Infallible> {
        let result = self
            .vendors
            .register(
                &request.name,
                &request.email,
                &request.username,
                &request.password,
            )
            .await
            .map(|vendor_id| VendorRegistered {
                vendor_id: vendor_id.into(),
            });
        Ok(respond(
            "register_vendor",
            result,
            |registered| format!("Registration was successful with id {}", registered.vendor_id),
            |e| format!("Registration was not successful: {e}"),
        ))
    }
}

impl Processor<VendorLoginRequest> for TicketingService {
    type Output = Outcome<VendorLoggedIn>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:VendorLogin")]
    async fn process(
        &self,
        request: VendorLoginRequest,
    ) -> Result<Outcome<VendorLoggedIn>, Infallible> {
        let result = self
            .vendors
            .authenticate(&request.username, &request.password)
            .await
            .map(|vendor| VendorLoggedIn {
                vendor_id: vendor.id.into(),
                username: vendor.username,
            });
        Ok(respond(
            "login_vendor",
            result,
            |_| "Login successful".to_string(),
            |e| match e {
                TicketingError::Authentication(reason) => format!("Login failed: {reason}"),
                other => format!("Error occurred while logging in: {other}"),
            },
        ))
    }
}

impl Processor<VendorDeleteRequest> for TicketingService {
    type Output = Outcome;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:VendorDelete")]
    async fn process(&self, request: VendorDeleteRequest) -> Result<Outcome, Infallible> {
        let result = self.vendors.delete(request.vendor_id.into()).await;
        Ok(respond(
            "delete_vendor",
            result,
            |_| "Vendor was deleted successfully".to_string(),
            |e| format!("Vendor was not deleted: {e}"),
        ))
    }
}

impl Processor<StartEventRequest> for TicketingService {
    type Output = Outcome;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:StartEvent")]
    async fn process(&self, request: StartEventRequest) -> Result<Outcome, Infallible> {
        let vendors = request.vendor_ids.len();
        let customers = request.customers;
        let result = self.start_event(request).await;
        Ok(respond(
            "start_event",
            result,
            |_| format!("Event started with {vendors} vendors and {customers} customers"),
            |e| format!("Event was not started: {e}"),
        ))
    }
}

impl Processor<StopEventRequest> for TicketingService {
    type Output = Outcome<EventSummary>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:StopEvent")]
    async fn process(&self, request: StopEventRequest) -> Result<Outcome<EventSummary>, Infallible> {
        let stopped = self.configs.stop_event(request.config_id.into()).await;
        let result = self.finish_event(stopped).await;
        Ok(respond(
            "stop_event",
            result,
            |summary| format!("Event stopped with {} tickets left in pool", summary.final_count),
            |e| format!("Event was not stopped: {e}"),
        ))
    }
}

impl Processor<AwaitEventRequest> for TicketingService {
    type Output = Outcome<EventSummary>;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Facade:AwaitEvent")]
    async fn process(&self, request: AwaitEventRequest) -> Result<Outcome<EventSummary>, Infallible> {
        let finished = self.configs.await_event(request.config_id.into()).await;
        let result = self.finish_event(finished).await;
        Ok(respond(
            "await_event",
            result,
            |summary| {
                format!(
                    "Event finished: {} released, {} retrieved",
                    summary.tickets_released, summary.tickets_retrieved
                )
            },
            |e| format!("Event could not be awaited: {e}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::Pacing;
    use crate::repositories::{InMemoryConfigurationRepository, InMemoryVendorRepository};
    use std::time::Duration;
    use uuid::Uuid;

    fn service() -> TicketingService {
        TicketingService::with_repositories(
            Arc::new(InMemoryConfigurationRepository::new()),
            Arc::new(InMemoryVendorRepository::new()),
            ActorPacing {
                release: Pacing::fixed(Duration::from_millis(1)),
                retrieval: Pacing::fixed(Duration::from_millis(1)),
            },
        )
    }

    fn create_request(max_capacity: i64, total_tickets: i64) -> CreateConfigurationRequest {
        CreateConfigurationRequest {
            event_name: "Film Festival".to_string(),
            location: "Odeon".to_string(),
            total_tickets,
            release_rate: 10,
            retrieval_rate: 10,
            max_capacity,
        }
    }

    async fn create(service: &TicketingService, max_capacity: i64, total: i64) -> Uuid {
        let outcome = service
            .process(create_request(max_capacity, total))
            .await
            .unwrap();
        assert!(outcome.status, "{}", outcome.message);
        outcome.data.unwrap().config_id
    }

    #[tokio::test]
    async fn test_create_reports_validation_failure() {
        let service = service();
        let outcome = service.process(create_request(0, 10)).await.unwrap();

        assert!(!outcome.status);
        assert!(outcome.data.is_none());
        assert!(outcome.message.contains("max capacity"));
        assert!(service.configs().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_tickets_messages() {
        let service = service();
        let config_id = create(&service, 100, 1_000).await;

        let outcome = service
            .process(AddTicketsRequest { config_id, count: 100 })
            .await
            .unwrap();
        assert!(outcome.status);
        assert_eq!(outcome.message, "100 tickets added successfully");

        let outcome = service
            .process(AddTicketsRequest { config_id, count: 1 })
            .await
            .unwrap();
        assert!(!outcome.status);
        assert!(outcome.message.starts_with("Error in adding tickets"));

        let status = service
            .process(PoolStatusRequest { config_id })
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(status.count, 100);
    }

    #[tokio::test]
    async fn test_unknown_configuration_is_not_found() {
        let service = service();
        let outcome = service
            .process(RetrieveTicketsRequest {
                config_id: Uuid::now_v7(),
                count: 1,
            })
            .await
            .unwrap();
        assert!(!outcome.status);
        assert!(outcome.message.contains("not found"));
    }

    #[tokio::test]
    async fn test_removed_configuration_has_no_pool() {
        let service = service();
        let config_id = create(&service, 50, 50).await;

        let outcome = service
            .process(RemoveConfigurationRequest { config_id })
            .await
            .unwrap();
        assert!(outcome.status);

        let outcome = service.process(PoolStatusRequest { config_id }).await.unwrap();
        assert!(!outcome.status);
        assert!(outcome.message.contains("not found"));
    }

    #[tokio::test]
    async fn test_vendor_login_flow() {
        let service = service();
        let outcome = service
            .process(VendorRegisterRequest {
                name: "Box Office".to_string(),
                email: "box@office.test".to_string(),
                username: "boxoffice".to_string(),
                password: "s3cret".to_string(),
            })
            .await
            .unwrap();
        assert!(outcome.status);
        let vendor_id = outcome.data.unwrap().vendor_id;

        let outcome = service
            .process(VendorLoginRequest {
                username: "boxoffice".to_string(),
                password: "s3cret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.message, "Login successful");
        assert_eq!(outcome.data.unwrap().vendor_id, vendor_id);

        let outcome = service
            .process(VendorLoginRequest {
                username: "boxoffice".to_string(),
                password: "guess".to_string(),
            })
            .await
            .unwrap();
        assert!(!outcome.status);
        assert_eq!(outcome.message, "Login failed: password is incorrect");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_event_run_credits_vendors() {
        let service = service();
        let config_id = create(&service, 200, 50).await;

        let mut vendor_ids = Vec::new();
        for index in 0..5 {
            let id = service
                .vendors()
                .enroll(
                    "Vendor",
                    "v@x.test",
                    &format!("vendor{index}"),
                    "$argon2id$stub".to_string(),
                )
                .await
                .unwrap();
            vendor_ids.push(Uuid::from(id));
        }

        let outcome = service
            .process(StartEventRequest {
                config_id,
                vendor_ids: vendor_ids.clone(),
                customers: 3,
            })
            .await
            .unwrap();
        assert!(outcome.status, "{}", outcome.message);

        let summary = tokio::time::timeout(
            Duration::from_secs(10),
            service.process(AwaitEventRequest { config_id }),
        )
        .await
        .unwrap()
        .unwrap()
        .data
        .unwrap();

        assert_eq!(summary.tickets_released, 50);
        assert_eq!(summary.tickets_retrieved, 50);
        assert_eq!(summary.final_count, 0);

        let mut credited = 0;
        for vendor_id in vendor_ids {
            credited += service
                .vendors()
                .find(vendor_id.into())
                .await
                .unwrap()
                .tickets_added;
        }
        assert_eq!(credited, 50);
    }

    #[tokio::test]
    async fn test_start_event_rejects_unknown_vendor() {
        let service = service();
        let config_id = create(&service, 50, 50).await;

        let outcome = service
            .process(StartEventRequest {
                config_id,
                vendor_ids: vec![Uuid::now_v7()],
                customers: 1,
            })
            .await
            .unwrap();
        assert!(!outcome.status);
        assert!(!service.configs().is_running(config_id.into()).await);
    }

    /// Collects the name of every span opened while it is installed.
    #[derive(Clone, Default)]
    struct SpanNames(Arc<std::sync::Mutex<Vec<&'static str>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanNames {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().unwrap().push(attrs.metadata().name());
        }
    }

    #[tokio::test]
    async fn test_facade_operations_open_named_spans() {
        use tracing_subscriber::layer::SubscriberExt;

        let names = SpanNames::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(names.clone()));

        let service = service();
        service.process(create_request(10, 10)).await.unwrap();
        service
            .process(PoolStatusRequest {
                config_id: Uuid::now_v7(),
            })
            .await
            .unwrap();

        let names = names.0.lock().unwrap();
        assert!(names.contains(&"Facade:CreateConfiguration"));
        assert!(names.contains(&"Facade:PoolStatus"));
    }
}
