//! Drives the event plan loaded from the configuration file.
//!
//! Vendors are enrolled first, then every event is created and started, and
//! finally each event is awaited until it sells out or the service halts.

use crate::config::LoadedConfig;
use crate::config::file::{EventConfig, VendorConfig};
use kanau::processor::Processor;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use ticketing_core::TicketingError;
use ticketing_core::services::TicketingService;
use ticketing_sdk::objects::{AwaitEventRequest, EventSummary, Outcome, StartEventRequest};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("failed to enroll vendor {username}: {source}")]
    Enroll {
        username: String,
        #[source]
        source: TicketingError,
    },

    #[error("event {event} references unknown vendor {username}")]
    UnknownVendor { event: String, username: String },

    #[error("{operation} was rejected: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },
}

/// Everything that happened, one entry per configured event.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub events: Vec<EventReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub event_name: String,
    pub location: String,
    #[serde(flatten)]
    pub summary: EventSummary,
}

pub struct Simulation {
    service: Arc<TicketingService>,
}

impl Simulation {
    pub fn new(service: Arc<TicketingService>) -> Self {
        Self { service }
    }

    #[tracing::instrument(skip_all, err, name = "simulation")]
    pub async fn run(&self, plan: &LoadedConfig) -> Result<SimulationReport, SimulationError> {
        let vendor_ids = self.enroll_vendors(&plan.vendors).await?;

        let mut started = Vec::with_capacity(plan.events.len());
        for event in &plan.events {
            let config_id = self.start_event(event, &vendor_ids).await?;
            started.push((event, config_id));
        }

        let mut events = Vec::with_capacity(started.len());
        for (event, config_id) in started {
            let outcome = self
                .service
                .process(AwaitEventRequest { config_id })
                .await
                .unwrap_or_else(|never| match never {});
            let summary = accepted("await_event", outcome)?;

            tracing::info!(
                event = %event.event_name,
                released = summary.tickets_released,
                retrieved = summary.tickets_retrieved,
                final_count = summary.final_count,
                "Event finished"
            );
            events.push(EventReport {
                event_name: event.event_name.clone(),
                location: event.location.clone(),
                summary,
            });
        }

        Ok(SimulationReport { events })
    }

    async fn enroll_vendors(
        &self,
        vendors: &[VendorConfig],
    ) -> Result<HashMap<String, Uuid>, SimulationError> {
        let mut vendor_ids = HashMap::with_capacity(vendors.len());
        for vendor in vendors {
            let vendor_id = self
                .service
                .vendors()
                .enroll(
                    &vendor.name,
                    &vendor.email,
                    &vendor.username,
                    vendor.password.clone(),
                )
                .await
                .map_err(|source| SimulationError::Enroll {
                    username: vendor.username.clone(),
                    source,
                })?;
            vendor_ids.insert(vendor.username.clone(), Uuid::from(vendor_id));
        }
        Ok(vendor_ids)
    }

    async fn start_event(
        &self,
        event: &EventConfig,
        vendor_ids: &HashMap<String, Uuid>,
    ) -> Result<Uuid, SimulationError> {
        let outcome = self
            .service
            .process(event.to_request())
            .await
            .unwrap_or_else(|never| match never {});
        let config_id = accepted("create_configuration", outcome)?.config_id;

        let vendor_ids = event
            .vendors
            .iter()
            .map(|username| {
                vendor_ids
                    .get(username)
                    .copied()
                    .ok_or_else(|| SimulationError::UnknownVendor {
                        event: event.event_name.clone(),
                        username: username.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outcome = self
            .service
            .process(StartEventRequest {
                config_id,
                vendor_ids,
                customers: event.customers,
            })
            .await
            .unwrap_or_else(|never| match never {});
        accepted("start_event", outcome)?;

        tracing::info!(event = %event.event_name, %config_id, "Event started");
        Ok(config_id)
    }
}

fn accepted<T>(operation: &'static str, outcome: Outcome<T>) -> Result<T, SimulationError> {
    match outcome {
        Outcome {
            status: true,
            data: Some(data),
            ..
        } => Ok(data),
        Outcome { message, .. } => Err(SimulationError::Rejected { operation, message }),
    }
}
