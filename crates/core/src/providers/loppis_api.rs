use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::event::{ApplicationStatus, EventFilter, LoppisEvent, VendorApplication};
use crate::models::sold_item::SoldItem;
use super::traits::LoppisApi;

pub const DEFAULT_BASE_URL: &str = "https://api.loppiskassan.se/v1";

const PROVIDER: &str = "Loppis API";

/// Header carrying the cashier's API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// JSON-over-HTTP client for the loppis event service.
///
/// - **Events**: `POST /events/filter`
/// - **Cashier key**: `POST /events/{id}/api-keys`
/// - **Vendors**: `GET /events/{id}/vendor-applications`
/// - **Sync**: `POST /events/{id}/sold-items`
///
/// Request bodies are sent as `application/json`.
pub struct HttpLoppisApi {
    client: Client,
    base_url: String,
}

impl HttpLoppisApi {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path such as `/events/filter`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CoreError> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("HTTP {status}: {}", body.trim()),
        })
    }
}

impl Default for HttpLoppisApi {
    fn default() -> Self {
        Self::new()
    }
}

// ── Loppis API request/response types ───────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyRequest<'a> {
    cashier_code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyResponse {
    api_key: String,
}

#[async_trait]
impl LoppisApi for HttpLoppisApi {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn filter_events(&self, filter: &EventFilter) -> Result<Vec<LoppisEvent>, CoreError> {
        let url = self.endpoint("/events/filter");
        let resp = self.send(self.client.post(&url).json(filter)).await?;
        let events: Vec<LoppisEvent> = resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse event list: {e}"),
        })?;
        debug!(count = events.len(), "Fetched events");
        Ok(events)
    }

    async fn fetch_api_key(
        &self,
        event_id: &str,
        cashier_code: &str,
    ) -> Result<String, CoreError> {
        let url = self.endpoint(&format!("/events/{event_id}/api-keys"));
        let body = ApiKeyRequest { cashier_code };
        let resp = self.send(self.client.post(&url).json(&body)).await?;
        let key: ApiKeyResponse = resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse API key for event {event_id}: {e}"),
        })?;
        Ok(key.api_key)
    }

    async fn list_approved_sellers(
        &self,
        event_id: &str,
        api_key: &str,
    ) -> Result<Vec<u32>, CoreError> {
        let url = self.endpoint(&format!("/events/{event_id}/vendor-applications"));
        let resp = self
            .send(self.client.get(&url).header(API_KEY_HEADER, api_key))
            .await?;
        let vendors: Vec<VendorApplication> = resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse vendors for event {event_id}: {e}"),
        })?;
        Ok(approved_seller_numbers(&vendors))
    }

    async fn upload_sold_items(
        &self,
        event_id: &str,
        api_key: &str,
        items: &[SoldItem],
    ) -> Result<(), CoreError> {
        let url = self.endpoint(&format!("/events/{event_id}/sold-items"));
        self.send(
            self.client
                .post(&url)
                .header(API_KEY_HEADER, api_key)
                .json(items),
        )
        .await?;
        Ok(())
    }
}

/// Sorted, de-duplicated seller numbers of approved applications.
pub fn approved_seller_numbers(vendors: &[VendorApplication]) -> Vec<u32> {
    let mut sellers: Vec<u32> = vendors
        .iter()
        .filter(|v| v.status == ApplicationStatus::Approved)
        .map(|v| v.seller_number)
        .collect();
    sellers.sort_unstable();
    sellers.dedup();
    sellers
}
