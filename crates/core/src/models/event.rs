use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Id of the synthetic event used when the remote service is unreachable.
pub const OFFLINE_EVENT_ID: &str = "offline";

/// A loppis event as published by the remote event service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoppisEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
}

impl LoppisEvent {
    /// Local stand-in shown when no remote events can be listed.
    pub fn offline() -> Self {
        Self {
            id: OFFLINE_EVENT_ID.to_string(),
            name: "Lokal loppis (offline)".to_string(),
            description: Some("Sales are only kept on this computer".to_string()),
            city: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.id == OFFLINE_EVENT_ID
    }
}

/// Search criteria for event discovery. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDateTime>,
}

/// Review state of a vendor's application to sell at an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// A vendor registered for an event, as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorApplication {
    pub seller_number: u32,
    pub status: ApplicationStatus,
}
