pub mod configuration;
pub mod event;
pub mod tickets;
pub mod vendor;

pub use configuration::{
    ConfigurationView, CreateConfigurationRequest, GetConfigurationRequest,
    RemoveConfigurationRequest,
};
pub use event::{
    ActorKind, ActorSummary, AwaitEventRequest, EventSummary, StartEventRequest,
    StopEventRequest, Termination,
};
pub use tickets::{AddTicketsRequest, PoolStatus, PoolStatusRequest, RetrieveTicketsRequest};
pub use vendor::{
    VendorDeleteRequest, VendorLoggedIn, VendorLoginRequest, VendorRegisterRequest,
    VendorRegistered,
};

use serde::{Deserialize, Serialize};

/// The result envelope every exposed operation answers with.
///
/// `status` is `true` only when the operation took effect. `message` is
/// always populated so callers never have to guess why something failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome<T = ()> {
    pub status: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    /// A successful outcome carrying a payload.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A failed outcome. Failures never carry a payload.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_without_data() {
        let outcome: Outcome<u32> = Outcome::failure("nope");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "status": false, "message": "nope" }));
    }

    #[test]
    fn success_carries_payload() {
        let outcome = Outcome::success("ok", 7u32);
        assert!(outcome.status);
        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: Outcome<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.data, Some(7));
    }
}
