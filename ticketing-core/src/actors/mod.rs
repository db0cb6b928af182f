//! Rate-paced actors that drive an event's pool.
//!
//! - `VendorActor`: adds `release_rate` tickets per cycle until the event's
//!   allotment is fully released
//! - `CustomerActor`: withdraws `retrieval_rate` tickets per cycle until no
//!   more tickets can ever arrive
//! - `EventSession`: spawns both kinds against one pool and owns their
//!   shared cancellation signal
//!
//! Actors never talk to each other. The pool is the only thing they share.

pub mod customer;
pub mod pacing;
pub mod session;
pub mod vendor;

pub use customer::{CustomerActor, CustomerState};
pub use pacing::{ActorPacing, Pacing};
pub use session::{EventSession, SessionCanceller, SessionPlan, SessionReport};
pub use vendor::{VendorActor, VendorState};

use crate::entities::VendorId;
use ticketing_sdk::objects::{ActorKind, ActorSummary, Termination};

/// What an actor did over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorReport {
    pub label: String,
    pub kind: ActorKind,
    pub vendor_id: Option<VendorId>,
    pub attempts: u64,
    pub rejections: u64,
    pub tickets: u64,
    pub termination: Termination,
}

impl ActorReport {
    pub(crate) fn new(label: String, kind: ActorKind, vendor_id: Option<VendorId>) -> Self {
        Self {
            label,
            kind,
            vendor_id,
            attempts: 0,
            rejections: 0,
            tickets: 0,
            termination: Termination::Cancelled,
        }
    }
}

impl From<&ActorReport> for ActorSummary {
    fn from(report: &ActorReport) -> Self {
        ActorSummary {
            label: report.label.clone(),
            kind: report.kind,
            vendor_id: report.vendor_id.map(Into::into),
            attempts: report.attempts,
            rejections: report.rejections,
            tickets: report.tickets,
            termination: report.termination,
        }
    }
}

/// Sleep for `delay` unless the shutdown signal fires first.
///
/// Returns `true` when the actor should stop. A dropped sender counts as a
/// stop: nobody is left to supervise the actor.
pub(crate) async fn pause(
    shutdown_rx: &mut tokio::sync::watch::Receiver<bool>,
    delay: std::time::Duration,
) -> bool {
    if *shutdown_rx.borrow() {
        return true;
    }

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return true;
                }
            }

            _ = &mut sleep => return false,
        }
    }
}
